pub mod claims;
pub mod error;
pub mod id_token;
pub mod signed;
pub mod signer;
