use serde_json::{Map, Value};
use std::fmt;

use super::password_strength;

const UNKNOWN_DESCRIPTION: &str = "Unknown exception";

/// Failure response returned by an Auth0 API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status_code: u16,
    error: Option<String>,
    description: String,
    values: Map<String, Value>,
}

impl std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request failed with status code {}: {}",
            self.status_code, self.description
        )
    }
}

/// Shapes of the error bodies returned by the different Auth0 endpoints, most specific first.
#[derive(Debug, PartialEq)]
enum ErrorBody<'a> {
    /// `{"error": "...", "error_description": "..."}` returned by the OAuth endpoints.
    OAuth { description: &'a str },
    /// `{"error": "...", "description": ...}` or `{"description": ...}`, where the description
    /// can be a password policy.
    Described(Description<'a>),
    /// `{"message": "...", "errorCode": "..."}` returned by the Management API.
    Management { message: &'a str },
    /// Only an `error` code was returned.
    ErrorOnly { error: &'a str },
    /// A JSON object with none of the known fields.
    Unstructured,
}

#[derive(Debug, PartialEq)]
enum Description<'a> {
    Text(&'a str),
    PasswordPolicy(&'a Map<String, Value>),
}

impl<'a> ErrorBody<'a> {
    fn classify(values: &'a Map<String, Value>) -> Self {
        let text = |key: &str| values.get(key).and_then(Value::as_str);

        if let Some(description) = text("error_description") {
            return Self::OAuth { description };
        }
        match values.get("description") {
            Some(Value::String(description)) => {
                return Self::Described(Description::Text(description));
            }
            Some(Value::Object(policy)) => {
                return Self::Described(Description::PasswordPolicy(policy));
            }
            _ => {}
        }
        if let Some(message) = text("message") {
            return Self::Management { message };
        }
        if let Some(error) = text("error") {
            return Self::ErrorOnly { error };
        }
        Self::Unstructured
    }

    fn description(&self) -> String {
        match self {
            Self::OAuth { description } => description.to_string(),
            Self::Described(Description::Text(description)) => description.to_string(),
            Self::Described(Description::PasswordPolicy(policy)) => {
                password_strength::flatten(policy)
            }
            Self::Management { message } => message.to_string(),
            Self::ErrorOnly { error } => error.to_string(),
            Self::Unstructured => UNKNOWN_DESCRIPTION.to_string(),
        }
    }
}

impl ApiError {
    /// Builds the error from a failure response body. Never fails: bodies that are not a JSON
    /// object are used verbatim as the description.
    pub fn from_body(status_code: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(values)) => Self::from_values(status_code, values),
            _ => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                Self {
                    status_code,
                    error: None,
                    description: if text.is_empty() {
                        UNKNOWN_DESCRIPTION.to_string()
                    } else {
                        text
                    },
                    values: Map::new(),
                }
            }
        }
    }

    /// Builds the error from the fields of a JSON error body.
    pub fn from_values(status_code: u16, values: Map<String, Value>) -> Self {
        let description = ErrorBody::classify(&values).description();
        let error = ["errorCode", "error", "code"]
            .iter()
            .find_map(|key| values.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        Self {
            status_code,
            error,
            description,
            values,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Error code returned by the server, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Any top-level field of the JSON error body.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The user must complete a multi-factor challenge to log in.
    pub fn is_multifactor_required(&self) -> bool {
        self.has_error("mfa_required")
    }

    /// The user must enroll a multi-factor authenticator before logging in.
    pub fn is_multifactor_enroll_required(&self) -> bool {
        self.has_error("unsupported_challenge_type")
    }

    /// The multi-factor token sent with the request was invalid or expired.
    pub fn is_multifactor_token_invalid(&self) -> bool {
        self.has_error("expired_token") && self.description == "mfa_token is expired"
            || self.has_error("invalid_grant") && self.description == "Malformed mfa_token"
    }

    pub fn is_invalid_credentials(&self) -> bool {
        self.has_error("invalid_user_password")
            || self.has_error("invalid_grant") && self.description == "Wrong email or password."
    }

    /// The login requires the user to verify their identity first.
    pub fn is_verification_required(&self) -> bool {
        self.has_error("requires_verification")
    }

    pub fn is_access_denied(&self) -> bool {
        self.has_error("access_denied")
    }

    fn has_error(&self, code: &str) -> bool {
        self.error.as_deref() == Some(code)
    }
}
