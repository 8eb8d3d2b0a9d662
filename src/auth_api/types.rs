use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims returned by `/userinfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl UserInfo {
    pub fn sub(&self) -> Option<&str> {
        self.values.get("sub").and_then(Value::as_str)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// User created through the database sign up endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedUser {
    #[serde(rename = "_id", alias = "user_id", alias = "id")]
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Response of a pushed authorization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushedAuthorizationResponse {
    pub request_uri: String,
    /// Seconds the `request_uri` can be used for.
    pub expires_in: u64,
}
