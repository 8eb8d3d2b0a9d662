use base64::{Engine, engine::general_purpose::URL_SAFE};
use serde::Serialize;
use std::collections::BTreeMap;

/// `Auth0-Client`, lowercase so it can be used as a static header name.
pub const TELEMETRY_HEADER: &str = "auth0-client";

/// Identifies the library in every request sent to the tenant.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Telemetry {
    name: String,
    version: String,
    env: BTreeMap<String, String>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).with_env(
            "rust",
            option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown"),
        )
    }
}

impl Telemetry {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Url-safe base64 encoding of the JSON representation.
    pub fn header_value(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE.encode(json))
    }
}
