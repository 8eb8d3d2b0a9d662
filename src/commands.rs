pub mod get_user;
pub mod retrieve_token;
