use thiserror::Error;

#[derive(Error, Debug)]
pub enum JwtEncoderError {
    #[error("unable to encode token: `{0}`")]
    TokenEncoding(String),
    #[error("invalid claims: `{0}`")]
    InvalidClaims(String),
}
