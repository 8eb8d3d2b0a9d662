use super::{claims::Claims, error::JwtEncoderError, signed::SignedJwt};

pub mod rsa;

/// Signs the client assertions used to authenticate the application instead of a client secret.
#[cfg_attr(test, mockall::automock)]
pub trait ClientAssertionSigner: Send + Sync {
    fn sign(&self, claims: Claims) -> Result<SignedJwt, JwtEncoderError>;
}
