//! Verification of ID tokens returned by the Authentication API.
//!
//! The signature is checked first, then the OIDC claims one at a time so every failed check is
//! reported with its own [`IdTokenError`] variant.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Clock skew tolerated on `exp` and `auth_time`.
pub const DEFAULT_ID_TOKEN_LEEWAY: TimeDelta = TimeDelta::seconds(60);

pub type IdTokenClaims = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdTokenError {
    #[error("ID token is required but missing")]
    MissingToken,
    #[error("ID token could not be decoded: `{0}`")]
    Decode(String),
    #[error("signature algorithm of `{found:?}` is not supported, expected `{expected:?}`")]
    AlgorithmMismatch {
        found: Algorithm,
        expected: Algorithm,
    },
    #[error("invalid ID token signature")]
    InvalidSignature,
    #[error("invalid verification key: `{0}`")]
    InvalidKey(String),
    #[error("issuer (iss) claim must be a string present in the ID token")]
    MissingIssuer,
    #[error("issuer (iss) claim mismatch, expected `{expected}`, found `{found}`")]
    IssuerMismatch { expected: String, found: String },
    #[error("subject (sub) claim must be a string present in the ID token")]
    MissingSubject,
    #[error("audience (aud) claim must be a string or array of strings present in the ID token")]
    MissingAudience,
    #[error("audience (aud) claim mismatch, expected `{expected}`, found `{found:?}`")]
    AudienceMismatch { expected: String, found: Vec<String> },
    #[error("expiration time (exp) claim must be a number present in the ID token")]
    MissingExpiration,
    #[error("expiration time (exp) claim error, current time `{now}` is after `{expiration}`")]
    Expired { now: i64, expiration: i64 },
    #[error("issued at (iat) claim must be a number present in the ID token")]
    MissingIssuedAt,
    #[error("nonce (nonce) claim must be a string present in the ID token")]
    MissingNonce,
    #[error("nonce (nonce) claim mismatch, expected `{expected}`, found `{found}`")]
    NonceMismatch { expected: String, found: String },
    #[error(
        "authorized party (azp) claim must be a string present in the ID token when audience \
         (aud) claim has multiple values"
    )]
    MissingAuthorizedParty,
    #[error("authorized party (azp) claim mismatch, expected `{expected}`, found `{found}`")]
    AuthorizedPartyMismatch { expected: String, found: String },
    #[error("authentication time (auth_time) claim must be a number present in the ID token")]
    MissingAuthTime,
    #[error(
        "too much time has elapsed since the last end-user authentication, current time `{now}` \
         is after `{last_valid}`"
    )]
    AuthenticationTooOld { now: i64, last_valid: i64 },
}

/// Key and algorithm the ID token signature is checked with.
///
/// Auth0 signs ID tokens with HS256 using the client secret, or with RS256 using the tenant key
/// published in its JWKS.
#[derive(Clone)]
pub struct SignatureVerifier {
    algorithm: Algorithm,
    key: DecodingKey,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            key: DecodingKey::from_secret(secret),
        }
    }

    /// RS256 public key in PEM format.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, IdTokenError> {
        let key =
            DecodingKey::from_rsa_pem(pem).map_err(|e| IdTokenError::InvalidKey(e.to_string()))?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            key,
        })
    }

    /// RS256 public key from the base64url encoded modulus and exponent of a JWK.
    pub fn rs256_components(modulus: &str, exponent: &str) -> Result<Self, IdTokenError> {
        let key = DecodingKey::from_rsa_components(modulus, exponent)
            .map_err(|e| IdTokenError::InvalidKey(e.to_string()))?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            key,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Checks the signature and returns the decoded claims. Time based claims are not validated.
    fn verify(&self, token: &str) -> Result<IdTokenClaims, IdTokenError> {
        let header = decode_header(token).map_err(|e| IdTokenError::Decode(e.to_string()))?;
        if header.alg != self.algorithm {
            return Err(IdTokenError::AlgorithmMismatch {
                found: header.alg,
                expected: self.algorithm,
            });
        }

        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        decode::<IdTokenClaims>(token, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => IdTokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => IdTokenError::AlgorithmMismatch {
                    found: header.alg,
                    expected: self.algorithm,
                },
                ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) => {
                    IdTokenError::InvalidKey(e.to_string())
                }
                _ => IdTokenError::Decode(e.to_string()),
            })
    }
}

/// Verifies ID tokens issued to a single client.
///
/// `issuer` is the tenant URL with a trailing slash, as sent in the `iss` claim, and `audience`
/// is the client id.
#[derive(Debug, Clone)]
pub struct IdTokenVerifier {
    issuer: String,
    audience: String,
    leeway: TimeDelta,
    signature: SignatureVerifier,
}

impl IdTokenVerifier {
    pub fn new(issuer: &str, audience: &str, signature: SignatureVerifier) -> Self {
        Self {
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            leeway: DEFAULT_ID_TOKEN_LEEWAY,
            signature,
        }
    }

    pub fn with_leeway(self, leeway: TimeDelta) -> Self {
        Self { leeway, ..self }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verifies `token`, returning its claims.
    ///
    /// `nonce` is checked when given, as is the time elapsed since the last authentication when
    /// `max_age` is given.
    pub fn verify(
        &self,
        token: &str,
        nonce: Option<&str>,
        max_age: Option<TimeDelta>,
    ) -> Result<IdTokenClaims, IdTokenError> {
        self.verify_at(token, nonce, max_age, Utc::now())
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        nonce: Option<&str>,
        max_age: Option<TimeDelta>,
        now: DateTime<Utc>,
    ) -> Result<IdTokenClaims, IdTokenError> {
        if token.trim().is_empty() {
            return Err(IdTokenError::MissingToken);
        }
        let claims = self.signature.verify(token).inspect_err(|e| {
            debug!("ID token signature rejected: {e}");
        })?;
        self.verify_claims(&claims, nonce, max_age, now)?;
        Ok(claims)
    }

    fn verify_claims(
        &self,
        claims: &IdTokenClaims,
        nonce: Option<&str>,
        max_age: Option<TimeDelta>,
        now: DateTime<Utc>,
    ) -> Result<(), IdTokenError> {
        let now = now.timestamp();
        let leeway = self.leeway.num_seconds();

        let issuer = string_claim(claims, "iss").ok_or(IdTokenError::MissingIssuer)?;
        if issuer != self.issuer {
            return Err(IdTokenError::IssuerMismatch {
                expected: self.issuer.clone(),
                found: issuer.to_string(),
            });
        }

        string_claim(claims, "sub").ok_or(IdTokenError::MissingSubject)?;

        let audience = audience_claim(claims).ok_or(IdTokenError::MissingAudience)?;
        if !audience.contains(&self.audience) {
            return Err(IdTokenError::AudienceMismatch {
                expected: self.audience.clone(),
                found: audience,
            });
        }

        let expiration = numeric_claim(claims, "exp").ok_or(IdTokenError::MissingExpiration)?;
        let expiration = expiration.saturating_add(leeway);
        if now > expiration {
            return Err(IdTokenError::Expired { now, expiration });
        }

        numeric_claim(claims, "iat").ok_or(IdTokenError::MissingIssuedAt)?;

        if let Some(expected) = nonce {
            let found = string_claim(claims, "nonce").ok_or(IdTokenError::MissingNonce)?;
            if found != expected {
                return Err(IdTokenError::NonceMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        if audience.len() > 1 {
            let found = string_claim(claims, "azp").ok_or(IdTokenError::MissingAuthorizedParty)?;
            if found != self.audience {
                return Err(IdTokenError::AuthorizedPartyMismatch {
                    expected: self.audience.clone(),
                    found: found.to_string(),
                });
            }
        }

        if let Some(max_age) = max_age {
            let auth_time =
                numeric_claim(claims, "auth_time").ok_or(IdTokenError::MissingAuthTime)?;
            let last_valid = auth_time
                .saturating_add(max_age.num_seconds())
                .saturating_add(leeway);
            if now > last_valid {
                return Err(IdTokenError::AuthenticationTooOld { now, last_valid });
            }
        }

        Ok(())
    }
}

fn string_claim<'a>(claims: &'a IdTokenClaims, name: &str) -> Option<&'a str> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn numeric_claim(claims: &IdTokenClaims, name: &str) -> Option<i64> {
    let value = claims.get(name)?;
    value.as_i64().or_else(|| value.as_f64().map(|v| v as i64))
}

fn audience_claim(claims: &IdTokenClaims) -> Option<Vec<String>> {
    match claims.get("aud")? {
        Value::String(aud) if !aud.is_empty() => Some(vec![aud.clone()]),
        Value::Array(values) if !values.is_empty() => values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}
