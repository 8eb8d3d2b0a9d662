use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::Method;
use std::sync::Arc;
use url::Url;

use crate::authenticator::Authenticator;
use crate::credential::{ClientCredential, ClientSecret};
use crate::domain::Domain;
use crate::error::Auth0Error;
use crate::http::client::DefaultHttpClient;
use crate::http::config::HttpConfig;
use crate::http::rate_limit::RateLimitRetry;
use crate::http_client::HttpClient;
use crate::jwt::id_token::{IdTokenVerifier, SignatureVerifier};
use crate::jwt::signer::ClientAssertionSigner;
use crate::request::{Request, Response, endpoint};
use crate::token::{Token, TokenHolder};

mod types;

pub use types::{CreatedUser, PushedAuthorizationResponse, UserInfo};

const PASSWORD_REALM_GRANT: &str = "http://auth0.com/oauth/grant-type/password-realm";

/// Client of the Authentication API of a tenant.
///
/// Every operation returns a [`Request`] to be executed by the caller.
#[derive(Clone)]
pub struct AuthApi {
    domain: Domain,
    client_id: String,
    credential: Option<ClientCredential>,
    client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for AuthApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApi")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

pub struct AuthApiBuilder {
    domain: String,
    client_id: String,
    credential: Option<ClientCredential>,
    http_config: HttpConfig,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl AuthApiBuilder {
    pub fn with_credential(self, credential: ClientCredential) -> Self {
        Self {
            credential: Some(credential),
            ..self
        }
    }

    pub fn with_client_secret(self, secret: impl Into<ClientSecret>) -> Self {
        self.with_credential(ClientCredential::Secret(secret.into()))
    }

    pub fn with_client_assertion_signer(self, signer: Arc<dyn ClientAssertionSigner>) -> Self {
        self.with_credential(ClientCredential::Assertion(signer))
    }

    pub fn with_http_config(self, http_config: HttpConfig) -> Self {
        Self {
            http_config,
            ..self
        }
    }

    /// Sends the requests through `client` as it is. The HTTP configuration is not applied to it.
    pub fn with_http_client(self, client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client: Some(client),
            ..self
        }
    }

    pub fn build(self) -> Result<AuthApi, Auth0Error> {
        let domain = Domain::try_from(self.domain.as_str())?;
        let client = match self.http_client {
            Some(client) => client,
            None => default_client(self.http_config)?,
        };
        Ok(AuthApi {
            domain,
            client_id: self.client_id,
            credential: self.credential,
            client,
        })
    }
}

/// Builds the `reqwest` client retrying rate limited requests.
pub(crate) fn default_client(config: HttpConfig) -> Result<Arc<dyn HttpClient>, Auth0Error> {
    let max_retries = config.max_retries();
    let client = DefaultHttpClient::new(config)
        .map_err(|err| Auth0Error::Configuration(err.to_string()))?;
    Ok(Arc::new(RateLimitRetry::new(client, max_retries)))
}

impl AuthApi {
    pub fn builder(domain: &str, client_id: &str) -> AuthApiBuilder {
        AuthApiBuilder {
            domain: domain.to_string(),
            client_id: client_id.to_string(),
            credential: None,
            http_config: HttpConfig::default(),
            http_client: None,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Verifier for the ID tokens this tenant issues to the client.
    pub fn id_token_verifier(&self, signature: SignatureVerifier) -> IdTokenVerifier {
        IdTokenVerifier::new(self.domain.base_url().as_str(), &self.client_id, signature)
    }

    pub(crate) fn http_client(&self) -> Arc<dyn HttpClient> {
        self.client.clone()
    }

    /// Requests an access token for `audience` with the client credentials grant.
    pub fn request_token(&self, audience: &str) -> Result<Request<TokenHolder>, Auth0Error> {
        if self.credential.is_none() {
            return Err(Auth0Error::Configuration(
                "a client secret or a client assertion signer is required to request tokens"
                    .into(),
            ));
        }
        self.token_request("client_credentials")
            .map(|request| request.with_parameter("audience", audience))
    }

    /// Logs in with the resource owner password grant. Audience and scope can be added as
    /// parameters.
    pub fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Request<TokenHolder>, Auth0Error> {
        self.token_request("password").map(|request| {
            request
                .with_parameter("username", username)
                .with_parameter("password", password)
        })
    }

    /// Logs in against a specific connection (`realm`).
    pub fn login_with_password_realm(
        &self,
        username: &str,
        password: &str,
        realm: &str,
    ) -> Result<Request<TokenHolder>, Auth0Error> {
        self.token_request(PASSWORD_REALM_GRANT).map(|request| {
            request
                .with_parameter("username", username)
                .with_parameter("password", password)
                .with_parameter("realm", realm)
        })
    }

    /// Exchanges an authorization code for tokens.
    pub fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Request<TokenHolder>, Auth0Error> {
        self.token_request("authorization_code").map(|request| {
            request
                .with_parameter("code", code)
                .with_parameter("redirect_uri", redirect_uri)
        })
    }

    /// Obtains a new access token with a refresh token.
    pub fn renew_auth(&self, refresh_token: &str) -> Result<Request<TokenHolder>, Auth0Error> {
        self.token_request("refresh_token")
            .map(|request| request.with_parameter("refresh_token", refresh_token))
    }

    pub fn revoke_token(&self, refresh_token: &str) -> Result<Request<()>, Auth0Error> {
        let request = Request::<()>::new(
            self.client.clone(),
            Method::POST,
            self.url(&["oauth", "revoke"])?,
        );
        Ok(self
            .authenticated(request)?
            .with_parameter("token", refresh_token)
            .into_void())
    }

    pub fn user_info(&self, access_token: &str) -> Result<Request<UserInfo>, Auth0Error> {
        Ok(
            Request::new(self.client.clone(), Method::GET, self.url(&["userinfo"])?)
                .with_header("Authorization", &format!("Bearer {access_token}")),
        )
    }

    /// Sends the change password email of a database connection. The response body is ignored.
    pub fn reset_password(&self, email: &str, connection: &str) -> Result<Request<()>, Auth0Error> {
        let url = self.url(&["dbconnections", "change_password"])?;
        Ok(Request::<()>::new(self.client.clone(), Method::POST, url)
            .with_parameter("client_id", self.client_id.as_str())
            .with_parameter("email", email)
            .with_parameter("connection", connection)
            .into_void())
    }

    /// Creates a user in a database connection.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        connection: &str,
    ) -> Result<Request<CreatedUser>, Auth0Error> {
        let url = self.url(&["dbconnections", "signup"])?;
        Ok(Request::new(self.client.clone(), Method::POST, url)
            .with_parameter("client_id", self.client_id.as_str())
            .with_parameter("email", email)
            .with_parameter("password", password)
            .with_parameter("connection", connection))
    }

    /// Pushes the parameters of an authorization request, sent form-encoded.
    pub fn pushed_authorization_request(
        &self,
        redirect_uri: &str,
        response_type: &str,
    ) -> Result<Request<PushedAuthorizationResponse>, Auth0Error> {
        let request = Request::form(
            self.client.clone(),
            Method::POST,
            self.url(&["oauth", "par"])?,
        )?;
        Ok(self
            .authenticated(request)?
            .with_parameter("redirect_uri", redirect_uri)
            .with_parameter("response_type", response_type))
    }

    fn token_request(&self, grant_type: &str) -> Result<Request<TokenHolder>, Auth0Error> {
        let request = Request::new(
            self.client.clone(),
            Method::POST,
            self.url(&["oauth", "token"])?,
        )
        .with_parameter("grant_type", grant_type);
        self.authenticated(request)
    }

    /// Adds the client id and, when configured, the client credential.
    fn authenticated<T>(&self, request: Request<T>) -> Result<Request<T>, Auth0Error> {
        let request = request.with_parameter("client_id", self.client_id.as_str());
        let Some(credential) = &self.credential else {
            return Ok(request);
        };
        let parameters = credential.parameters(&self.client_id, self.domain.base_url().as_str())?;
        Ok(parameters
            .into_iter()
            .fold(request, |request, (name, value)| {
                request.with_parameter(name, value)
            }))
    }

    fn url(&self, segments: &[&str]) -> Result<Url, Auth0Error> {
        endpoint(self.domain.base_url(), segments)
    }
}

fn into_token(
    response: Response<TokenHolder>,
    issued_at: DateTime<Utc>,
) -> Result<Token, Auth0Error> {
    let status = response.status().as_u16();
    response
        .into_body()
        .into_token(issued_at)
        .map_err(|message| Auth0Error::ResponseParse { status, message })
}

#[async_trait]
impl Authenticator for AuthApi {
    fn authenticate(&self, audience: &str) -> Result<Token, Auth0Error> {
        let issued_at = Utc::now();
        let response = self.request_token(audience)?.execute()?;
        into_token(response, issued_at)
    }

    async fn authenticate_async(&self, audience: &str) -> Result<Token, Auth0Error> {
        let issued_at = Utc::now();
        let response = self.request_token(audience)?.execute_async().await?;
        into_token(response, issued_at)
    }
}
