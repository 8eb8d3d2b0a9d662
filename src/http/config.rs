use clap::{ValueEnum, error::Error as ClapError, error::ErrorKind};
use http::Uri;
use std::env;
use std::env::VarError;
use std::fmt::{self, Display};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Times a request answered with 429 is sent again before the response is returned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// The management API does not accept more than ten retries on rate limited requests.
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Idle connections kept open per host between requests.
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 5;

/// Transport tuning shared by every request issued through a [`DefaultHttpClient`](super::client::DefaultHttpClient).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) proxy: ProxyConfig,
    pub(crate) max_retries: u32,
    pub(crate) telemetry: bool,
    pub(crate) logging: LoggingOptions,
    pub(crate) max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            proxy: ProxyConfig::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            telemetry: true,
            logging: LoggingOptions::default(),
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
        }
    }
}

impl HttpConfig {
    pub fn new(timeout: Duration, connect_timeout: Duration, proxy: ProxyConfig) -> Self {
        Self {
            timeout,
            connect_timeout,
            proxy,
            ..Default::default()
        }
    }

    /// Sets how many times a rate limited request is retried. Values above
    /// [`MAX_RETRIES_LIMIT`] are capped.
    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRIES_LIMIT),
            ..self
        }
    }

    /// Enables or disables the `Auth0-Client` telemetry header.
    pub fn with_telemetry(self, telemetry: bool) -> Self {
        Self { telemetry, ..self }
    }

    pub fn with_logging(self, logging: LoggingOptions) -> Self {
        Self { logging, ..self }
    }

    /// Caps the idle connections the pool keeps open per host. It does not limit concurrent
    /// requests: when every pooled connection is busy a new one is opened.
    pub fn with_max_idle_per_host(self, max_idle_per_host: usize) -> Self {
        Self {
            max_idle_per_host,
            ..self
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn telemetry(&self) -> bool {
        self.telemetry
    }
}

/// How much of every request and response is written to the `debug` log.
#[derive(ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing is logged.
    #[default]
    None,
    /// Request and response lines.
    Basic,
    /// Request and response lines and their headers.
    Headers,
    /// Request and response lines, headers and bodies.
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingOptions {
    pub(crate) level: LogLevel,
    pub(crate) redacted_headers: Vec<String>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::None,
            redacted_headers: vec![http::header::AUTHORIZATION.to_string()],
        }
    }
}

impl LoggingOptions {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Hides the value of the given header in the logs. Names are case-insensitive.
    pub fn with_redacted_header(mut self, name: &str) -> Self {
        self.redacted_headers.push(name.to_ascii_lowercase());
        self
    }

    pub(crate) fn is_redacted(&self, name: &str) -> bool {
        self.redacted_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

const HTTP_PROXY_ENV_NAME: &str = "HTTP_PROXY";
const HTTPS_PROXY_ENV_NAME: &str = "HTTPS_PROXY";

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("invalid proxy url `{0}`: `{1}`")]
    InvalidUrl(String, String),
}

/// Type to represent a Url which can be used in proxy implementations.
/// It allows representing empty urls and perform basic uri validations.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ProxyUrl(Option<Uri>);

impl TryFrom<&str> for ProxyUrl {
    type Error = ProxyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Ok(Self(None));
        }
        let uri = s
            .parse::<Uri>()
            .map_err(|err| ProxyError::InvalidUrl(s.to_string(), err.to_string()))?;
        if uri.host().is_none() {
            return Err(ProxyError::InvalidUrl(s.to_string(), "missing host".into()));
        }
        Ok(Self(Some(uri)))
    }
}

impl Display for ProxyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(url) => write!(f, "{url}"),
            None => write!(f, ""),
        }
    }
}

impl ProxyUrl {
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Username and password sent to the proxy with basic authentication.
#[derive(Clone, PartialEq)]
pub struct ProxyCredentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Proxy used by the HTTP clients.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ProxyConfig {
    /// Proxy URL proxy:
    /// <protocol>://<host>:<port>
    url: ProxyUrl,
    credentials: Option<ProxyCredentials>,
}

impl ProxyConfig {
    pub fn new(proxy_url: &str) -> Result<Self, ProxyError> {
        let url = ProxyUrl::try_from(proxy_url)?;
        Ok(Self {
            url,
            credentials: None,
        })
    }

    /// Authenticates against the proxy with basic authentication.
    pub fn with_basic_auth(self, username: String, password: String) -> Self {
        Self {
            credentials: Some(ProxyCredentials { username, password }),
            ..self
        }
    }

    pub fn url(&self) -> &ProxyUrl {
        &self.url
    }

    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    /// Returns a string representation of the proxy url.
    pub fn url_as_string(&self) -> String {
        self.url.to_string()
    }

    /// Returns a new instance whose url is taken from the standard environment variables if needed.
    pub fn try_with_url_from_env(self) -> Result<Self, ProxyError> {
        self.with_env_aware_url(env::var)
    }

    /// Returns a new instance setting up the using the provided `env_var` function to get it from the
    /// environment if required. It fails if the url from the environment is not valid.
    fn with_env_aware_url<F>(self, env_var: F) -> Result<Self, ProxyError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        if !self.url.is_empty() {
            return Ok(self);
        }
        let url = env_var(HTTPS_PROXY_ENV_NAME)
            .or_else(|_| env_var(HTTP_PROXY_ENV_NAME))
            .unwrap_or_default()
            .as_str()
            .try_into()?;
        Ok(ProxyConfig { url, ..self })
    }
}

impl From<ProxyError> for ClapError {
    fn from(err: ProxyError) -> ClapError {
        ClapError::raw(ErrorKind::InvalidValue, err.to_string())
    }
}
