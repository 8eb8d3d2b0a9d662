use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub type AccessToken = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum TokenType {
    Bearer,
}

impl TryFrom<&str> for TokenType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Bearer" | "bearer" => Ok(TokenType::Bearer),
            _ => Err(format!("Invalid token type: {value}")),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Bearer => write!(f, "Bearer"),
        }
    }
}

/// Access token together with the instant it stops being valid.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Token {
    expires_at: DateTime<Utc>,
    access_token: AccessToken,
    token_type: TokenType,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl Token {
    pub fn new(
        access_token: AccessToken,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Token {
            access_token,
            token_type,
            expires_at,
        }
    }

    /// A token is expired once `now + leeway` reaches its expiration.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: TimeDelta) -> bool {
        now + leeway >= self.expires_at
    }

    pub fn is_expired(&self, leeway: TimeDelta) -> bool {
        self.is_expired_at(Utc::now(), leeway)
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Response of the `/oauth/token` endpoint.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenHolder {
    pub access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// The lifetime in seconds of the access token.
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl fmt::Debug for TokenHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenHolder")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl TokenHolder {
    /// Token that expires `expires_in` seconds after `issued_at`.
    pub fn into_token(self, issued_at: DateTime<Utc>) -> Result<Token, String> {
        let token_type = TokenType::try_from(self.token_type.as_str())?;

        let time_delta = TimeDelta::from_std(Duration::from_secs(self.expires_in))
            .map_err(|e| e.to_string())?;

        let expires_at = issued_at
            .checked_add_signed(time_delta)
            .ok_or_else(|| "Failed to calculate expiration time".to_string())?;

        Ok(Token::new(self.access_token, token_type, expires_at))
    }
}

impl TryFrom<TokenHolder> for Token {
    type Error = String;

    fn try_from(holder: TokenHolder) -> Result<Self, Self::Error> {
        holder.into_token(Utc::now())
    }
}
