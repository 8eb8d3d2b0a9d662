use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::JwtEncoderError;

/// A client assertion only needs to live long enough for the token request to be served.
pub const CLIENT_ASSERTION_LIFETIME: TimeDelta = TimeDelta::seconds(180);

/// Claims of the client assertion sent instead of a client secret.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issuer. Client ID will be used here.
    pub(crate) iss: String,
    /// Subject (whom token refers to). Client ID will be used here.
    pub(crate) sub: String,
    /// Audience. Base URL of the tenant.
    pub(crate) aud: String,
    /// Issued at (as UTC timestamp).
    pub(crate) iat: u64,
    /// Expiration time (as UTC timestamp).
    pub(crate) exp: u64,
    /// JWT ID. Must not be reused.
    pub(crate) jti: Uuid,
}

impl Claims {
    /// Claims issued at `issued_at` and valid for [`CLIENT_ASSERTION_LIFETIME`].
    pub fn new(
        client_id: &str,
        aud: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, JwtEncoderError> {
        let expires_at = issued_at + CLIENT_ASSERTION_LIFETIME;
        Ok(Self {
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            aud: aud.to_string(),
            iat: timestamp(issued_at)?,
            exp: timestamp(expires_at)?,
            jti: Uuid::now_v7(), // Non-reusable JWT ID
        })
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn audience(&self) -> &str {
        &self.aud
    }
}

fn timestamp(instant: DateTime<Utc>) -> Result<u64, JwtEncoderError> {
    instant
        .timestamp()
        .try_into()
        .map_err(|_| {
            JwtEncoderError::InvalidClaims(format!("timestamp before epoch: {instant}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn assertion_expires_after_its_lifetime() {
        let now = Utc::now();
        let claims = Claims::new("client", "https://tenant.auth0.com/", now).unwrap();

        assert_eq!(claims.iss, "client");
        assert_eq!(claims.sub, "client");
        assert_eq!(claims.aud, "https://tenant.auth0.com/");
        assert_eq!(claims.exp - claims.iat, 180);
    }

    #[test]
    fn every_assertion_has_its_own_id() {
        let now = Utc::now();
        let first = Claims::new("client", "aud", now).unwrap();
        let second = Claims::new("client", "aud", now).unwrap();

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn timestamps_before_the_epoch_are_rejected() {
        let before_epoch = DateTime::from_timestamp(-1, 0).unwrap();

        assert_matches!(
            Claims::new("client", "aud", before_epoch),
            Err(JwtEncoderError::InvalidClaims(msg)) if msg.starts_with("timestamp before epoch")
        );
    }
}
