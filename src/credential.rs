use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::error::Auth0Error;
use crate::jwt::claims::Claims;
use crate::jwt::signer::ClientAssertionSigner;

pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

#[derive(Clone, PartialEq)]
pub struct ClientSecret(String);

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(<redacted>)")
    }
}

impl From<String> for ClientSecret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ClientSecret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How the application authenticates itself against the token endpoints.
#[derive(Clone)]
pub enum ClientCredential {
    Secret(ClientSecret),
    /// A JWT signed by the application for each request.
    Assertion(Arc<dyn ClientAssertionSigner>),
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(secret) => f.debug_tuple("Secret").field(secret).finish(),
            Self::Assertion(_) => f.write_str("Assertion"),
        }
    }
}

impl ClientCredential {
    /// Body parameters authenticating `client_id`. Assertions are issued for `audience`, the base
    /// URL of the tenant.
    pub(crate) fn parameters(
        &self,
        client_id: &str,
        audience: &str,
    ) -> Result<Vec<(&'static str, String)>, Auth0Error> {
        match self {
            Self::Secret(ClientSecret(secret)) => Ok(vec![("client_secret", secret.clone())]),
            Self::Assertion(signer) => {
                let claims = Claims::new(client_id, audience, Utc::now())?;
                let signed_jwt = signer.sign(claims)?;
                Ok(vec![
                    ("client_assertion", signed_jwt.value().to_string()),
                    ("client_assertion_type", CLIENT_ASSERTION_TYPE.to_string()),
                ])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::error::JwtEncoderError;
    use crate::jwt::signed::SignedJwt;
    use crate::jwt::signer::MockClientAssertionSigner;
    use assert_matches::assert_matches;

    #[test]
    fn secret_is_sent_as_is_and_never_printed() {
        let credential = ClientCredential::Secret("s3cr3t".into());

        assert_eq!(
            credential.parameters("client", "https://tenant.auth0.com/").unwrap(),
            vec![("client_secret", "s3cr3t".to_string())]
        );
        assert!(!format!("{credential:?}").contains("s3cr3t"));
    }

    #[test]
    fn assertion_is_signed_for_the_client() {
        let mut signer = MockClientAssertionSigner::new();
        signer
            .expect_sign()
            .withf(|claims| {
                claims.issuer() == "client" && claims.audience() == "https://tenant.auth0.com/"
            })
            .times(1)
            .returning(|_| {
                Ok(SignedJwt {
                    value: "signed.jwt.value".into(),
                })
            });
        let credential = ClientCredential::Assertion(Arc::new(signer));

        assert_eq!(
            credential.parameters("client", "https://tenant.auth0.com/").unwrap(),
            vec![
                ("client_assertion", "signed.jwt.value".to_string()),
                ("client_assertion_type", CLIENT_ASSERTION_TYPE.to_string()),
            ]
        );
    }

    #[test]
    fn signing_failures_are_propagated() {
        let mut signer = MockClientAssertionSigner::new();
        signer
            .expect_sign()
            .returning(|_| Err(JwtEncoderError::TokenEncoding("no key".into())));
        let credential = ClientCredential::Assertion(Arc::new(signer));

        assert_matches!(
            credential.parameters("client", "aud"),
            Err(Auth0Error::ClientAssertion(_))
        );
    }
}
