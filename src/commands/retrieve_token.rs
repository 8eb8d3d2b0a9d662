use crate::authenticator::Authenticator;
use crate::error::Auth0Error;
use crate::token::Token;

/// Retrieves a single token for `audience`.
pub struct RetrieveTokenCommand<A>
where
    A: Authenticator,
{
    authenticator: A,
}

impl<A> RetrieveTokenCommand<A>
where
    A: Authenticator,
{
    pub fn new(authenticator: A) -> Self {
        Self { authenticator }
    }

    pub fn retrieve_token(self, audience: &str) -> Result<Token, Auth0Error> {
        self.authenticator.authenticate(audience)
    }
}

#[cfg(test)]
mod tests {
    use crate::auth_api::AuthApi;
    use crate::commands::retrieve_token::RetrieveTokenCommand;
    use crate::credential::ClientCredential;
    use crate::error::Auth0Error;
    use crate::http_client::tests::{MockHttpClient, response};
    use crate::jwt::signer::rsa::test::RS256_PRIVATE_KEY;
    use crate::jwt::signer::rsa::{RsaClientAssertionSigner, SigningAlgorithm};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn auth_api(client: MockHttpClient, credential: ClientCredential) -> AuthApi {
        AuthApi::builder("tenant.auth0.com", "test_client_id")
            .with_credential(credential)
            .with_http_client(Arc::new(client))
            .build()
            .unwrap()
    }

    #[test]
    fn test_retrieve_token_with_client_secret_success() {
        let mut mock_http_client = MockHttpClient::default();
        mock_http_client.expect_send().times(1).returning(|_| {
            Ok(response(
                200,
                r#"{"access_token":"retrieved_secret_token","token_type":"Bearer","expires_in":86400}"#,
            ))
        });
        let command = RetrieveTokenCommand::new(auth_api(
            mock_http_client,
            ClientCredential::Secret("test_secret_value".into()),
        ));

        let token = command
            .retrieve_token("https://tenant.auth0.com/api/v2/")
            .unwrap();

        assert_eq!(token.access_token(), "retrieved_secret_token");
    }

    #[test]
    fn test_retrieve_token_with_private_key_success() {
        let mut mock_http_client = MockHttpClient::new();
        mock_http_client.expect_send().times(1).returning(|_| {
            Ok(response(
                200,
                r#"{"access_token":"retrieved_jwt_token","token_type":"Bearer","expires_in":86400}"#,
            ))
        });
        let signer =
            RsaClientAssertionSigner::from_pem(RS256_PRIVATE_KEY.as_bytes(), SigningAlgorithm::RS256)
                .unwrap();
        let command = RetrieveTokenCommand::new(auth_api(
            mock_http_client,
            ClientCredential::Assertion(Arc::new(signer)),
        ));

        let token = command.retrieve_token("https://api.example.com/").unwrap();

        assert_eq!(token.access_token(), "retrieved_jwt_token");
    }

    #[test]
    fn test_retrieve_token_fails_on_rate_limit() {
        let mut mock_http_client = MockHttpClient::new();
        mock_http_client.expect_send().times(1).returning(|_| {
            Ok(response(
                429,
                r#"{"error":"too_many_requests","error_description":"Global limit has been reached"}"#,
            ))
        });
        let command = RetrieveTokenCommand::new(auth_api(
            mock_http_client,
            ClientCredential::Secret("test_secret_value".into()),
        ));

        let result = command.retrieve_token("https://api.example.com/");

        assert_matches!(result, Err(Auth0Error::RateLimit(err)) => {
            assert_eq!(err.retry_after(), -1);
        });
    }
}
