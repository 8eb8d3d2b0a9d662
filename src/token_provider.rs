use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::fmt;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::debug;

use crate::authenticator::Authenticator;
use crate::error::Auth0Error;
use crate::token::Token;

/// Tokens are renewed this long before they expire.
pub const DEFAULT_LEEWAY: TimeDelta = TimeDelta::seconds(10);

/// Supplies the bearer token sent to the Management API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Blocks until a token is available.
    fn get_token(&self) -> Result<String, Auth0Error>;

    async fn get_token_async(&self) -> Result<String, Auth0Error>;
}

/// Always returns the same token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn get_token(&self) -> Result<String, Auth0Error> {
        Ok(self.token.clone())
    }

    async fn get_token_async(&self) -> Result<String, Auth0Error> {
        Ok(self.token.clone())
    }
}

/// Requests tokens with the client credentials grant, caching them until they are about to
/// expire.
///
/// No token is requested until the first call. The lock guarding the cached token is held while
/// a new one is requested, so a single request is in flight at any time and concurrent callers
/// wait for its result. Failed requests leave the cached token untouched.
///
/// The same lock serves both paths. Inside a multi-threaded runtime [`TokenProvider::get_token`]
/// moves the blocking section off the worker with `block_in_place`; inside a current-thread
/// runtime it fails with [`Auth0Error::UnsupportedOperation`] and callers must use
/// [`TokenProvider::get_token_async`].
pub struct ManagedTokenProvider<A> {
    authenticator: A,
    audience: String,
    leeway: TimeDelta,
    token: Mutex<Option<Token>>,
}

impl<A> fmt::Debug for ManagedTokenProvider<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedTokenProvider")
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl<A> ManagedTokenProvider<A>
where
    A: Authenticator,
{
    pub fn new(authenticator: A, audience: String) -> Self {
        Self {
            authenticator,
            audience,
            leeway: DEFAULT_LEEWAY,
            token: Mutex::new(None),
        }
    }

    pub fn with_leeway(self, leeway: TimeDelta) -> Result<Self, Auth0Error> {
        if leeway < TimeDelta::zero() {
            return Err(Auth0Error::Configuration(
                "leeway must be a positive number of seconds".into(),
            ));
        }
        Ok(Self { leeway, ..self })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    fn cached(&self, token: &Option<Token>) -> Option<String> {
        token
            .as_ref()
            .filter(|token| !token.is_expired_at(Utc::now(), self.leeway))
            .map(|token| token.access_token().clone())
    }

    fn refresh_blocking(&self) -> Result<String, Auth0Error> {
        let mut cached = self.token.blocking_lock();
        if let Some(token) = self.cached(&cached) {
            return Ok(token);
        }

        debug!(audience = %self.audience, "requesting access token");
        let token = self.authenticator.authenticate(&self.audience).inspect_err(|e| {
            debug!("error refreshing token: {e}");
        })?;
        Ok(self.store(&mut cached, token))
    }

    fn store(&self, cached: &mut Option<Token>, token: Token) -> String {
        debug!(audience = %self.audience, expires_at = %token.expires_at(), "access token refreshed");
        let access_token = token.access_token().clone();
        *cached = Some(token);
        access_token
    }
}

#[async_trait]
impl<A> TokenProvider for ManagedTokenProvider<A>
where
    A: Authenticator,
{
    fn get_token(&self) -> Result<String, Auth0Error> {
        match Handle::try_current() {
            Err(_) => self.refresh_blocking(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.refresh_blocking())
            }
            Ok(_) => Err(Auth0Error::UnsupportedOperation(
                "blocking token requests are not supported on a current-thread runtime, \
                 use get_token_async"
                    .into(),
            )),
        }
    }

    async fn get_token_async(&self) -> Result<String, Auth0Error> {
        let mut cached = self.token.lock().await;
        if let Some(token) = self.cached(&cached) {
            return Ok(token);
        }

        debug!(audience = %self.audience, "requesting access token");
        let token = self
            .authenticator
            .authenticate_async(&self.audience)
            .await
            .inspect_err(|e| {
                debug!("error refreshing token: {e}");
            })?;
        Ok(self.store(&mut cached, token))
    }
}
