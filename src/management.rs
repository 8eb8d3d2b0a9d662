use http::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::auth_api::{AuthApi, default_client};
use crate::credential::ClientCredential;
use crate::domain::Domain;
use crate::error::Auth0Error;
use crate::http::config::HttpConfig;
use crate::http_client::HttpClient;
use crate::request::{Request, endpoint};
use crate::token_provider::{ManagedTokenProvider, StaticTokenProvider, TokenProvider};

pub mod connections;
pub mod filter;
pub mod jobs;
pub mod logs;
pub mod roles;
pub mod tickets;
pub mod users;

pub use filter::Filter;

/// Client of the Management API (`/api/v2/`) of a tenant.
///
/// Requests are authenticated with the token of the configured [`TokenProvider`], obtained when
/// each request is executed.
#[derive(Clone)]
pub struct ManagementApi {
    base_url: Url,
    client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn TokenProvider>,
}

impl fmt::Debug for ManagementApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

enum ManagementAuth {
    Token(String),
    ClientCredentials {
        client_id: String,
        credential: ClientCredential,
    },
    Provider(Arc<dyn TokenProvider>),
}

pub struct ManagementApiBuilder {
    domain: String,
    auth: Option<ManagementAuth>,
    http_config: HttpConfig,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl ManagementApiBuilder {
    /// Authenticates every request with the same API token.
    pub fn with_token(self, token: &str) -> Self {
        Self {
            auth: Some(ManagementAuth::Token(token.to_string())),
            ..self
        }
    }

    /// Obtains and renews tokens with the client credentials grant, through the same HTTP client
    /// used for the Management API.
    pub fn with_client_credentials(self, client_id: &str, credential: ClientCredential) -> Self {
        Self {
            auth: Some(ManagementAuth::ClientCredentials {
                client_id: client_id.to_string(),
                credential,
            }),
            ..self
        }
    }

    pub fn with_token_provider(self, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth: Some(ManagementAuth::Provider(provider)),
            ..self
        }
    }

    pub fn with_http_config(self, http_config: HttpConfig) -> Self {
        Self {
            http_config,
            ..self
        }
    }

    pub fn with_http_client(self, client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client: Some(client),
            ..self
        }
    }

    pub fn build(self) -> Result<ManagementApi, Auth0Error> {
        let domain = Domain::try_from(self.domain.as_str())?;
        let auth = self.auth.ok_or_else(|| {
            Auth0Error::Configuration(
                "an API token or client credentials are required by the Management API".into(),
            )
        })?;
        let client = match self.http_client {
            Some(client) => client,
            None => default_client(self.http_config)?,
        };
        let token_provider: Arc<dyn TokenProvider> = match auth {
            ManagementAuth::Token(token) => Arc::new(StaticTokenProvider::new(token)),
            ManagementAuth::ClientCredentials {
                client_id,
                credential,
            } => {
                let auth_api = AuthApi::builder(&self.domain, &client_id)
                    .with_credential(credential)
                    .with_http_client(client.clone())
                    .build()?;
                Arc::new(ManagedTokenProvider::new(
                    auth_api,
                    domain.management_audience(),
                ))
            }
            ManagementAuth::Provider(provider) => provider,
        };
        Ok(ManagementApi {
            base_url: domain.management_url()?,
            client,
            token_provider,
        })
    }
}

impl ManagementApi {
    pub fn builder(domain: &str) -> ManagementApiBuilder {
        ManagementApiBuilder {
            domain: domain.to_string(),
            auth: None,
            http_config: HttpConfig::default(),
            http_client: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn users(&self) -> users::UsersEntity<'_> {
        users::UsersEntity::new(self)
    }

    pub fn roles(&self) -> roles::RolesEntity<'_> {
        roles::RolesEntity::new(self)
    }

    pub fn connections(&self) -> connections::ConnectionsEntity<'_> {
        connections::ConnectionsEntity::new(self)
    }

    pub fn tickets(&self) -> tickets::TicketsEntity<'_> {
        tickets::TicketsEntity::new(self)
    }

    pub fn logs(&self) -> logs::LogsEntity<'_> {
        logs::LogsEntity::new(self)
    }

    pub fn jobs(&self) -> jobs::JobsEntity<'_> {
        jobs::JobsEntity::new(self)
    }

    /// Authenticated JSON request to the resource at `segments`.
    pub(crate) fn request<T>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<Request<T>, Auth0Error>
    where
        T: DeserializeOwned,
    {
        Ok(
            Request::new(self.client.clone(), method, self.url(segments)?)
                .with_token_provider(self.token_provider.clone()),
        )
    }

    pub(crate) fn multipart<T>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<Request<T>, Auth0Error>
    where
        T: DeserializeOwned,
    {
        Ok(
            Request::multipart(self.client.clone(), method, self.url(segments)?)?
                .with_token_provider(self.token_provider.clone()),
        )
    }

    fn url(&self, segments: &[&str]) -> Result<Url, Auth0Error> {
        endpoint(&self.base_url, segments)
    }
}
