use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::http_client::HttpClientError;
use crate::jwt::error::JwtEncoderError;
use crate::jwt::id_token::IdTokenError;

pub mod api;
mod password_strength;
pub mod rate_limit;

pub use api::ApiError;
pub use rate_limit::RateLimitError;

/// Error returned by every operation of the crate.
#[derive(Error, Debug)]
pub enum Auth0Error {
    /// Invalid input detected before any request was sent.
    #[error("invalid configuration: `{0}`")]
    Configuration(String),
    /// No response was received.
    #[error("http transport error: `{0}`")]
    Transport(String),
    #[error("unsupported operation: `{0}`")]
    UnsupportedOperation(String),
    #[error("building request body: `{0}`")]
    RequestBody(String),
    /// A successful response whose body does not have the expected shape.
    #[error("Failed to parse the response body. Status code: `{status}`: `{message}`")]
    ResponseParse { status: u16, message: String },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error("signing client assertion: `{0}`")]
    ClientAssertion(#[from] JwtEncoderError),
    #[error("verifying ID token: `{0}`")]
    IdToken(#[from] IdTokenError),
}

impl Auth0Error {
    /// Status code of the response that caused the error, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ResponseParse { status, .. } => Some(*status),
            Self::Api(err) => Some(err.status_code()),
            Self::RateLimit(err) => Some(err.api().status_code()),
            _ => None,
        }
    }

    /// The structured body of the failure response, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::RateLimit(err) => Some(err.api()),
            _ => None,
        }
    }
}

impl From<HttpClientError> for Auth0Error {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Unsupported(msg) => Auth0Error::UnsupportedOperation(msg),
            err => Auth0Error::Transport(err.to_string()),
        }
    }
}

/// Maps a failure response to its error. Total over every status, body and header combination.
pub fn from_response(status: StatusCode, body: &[u8], headers: &HeaderMap) -> Auth0Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Auth0Error::RateLimit(RateLimitError::from_response(body, headers));
    }
    Auth0Error::Api(ApiError::from_body(status.as_u16(), body))
}
