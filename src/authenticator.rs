use async_trait::async_trait;

use crate::error::Auth0Error;
use crate::token::Token;

/// Obtains access tokens for an API through the client credentials grant.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, audience: &str) -> Result<Token, Auth0Error>;

    async fn authenticate_async(&self, audience: &str) -> Result<Token, Auth0Error>;
}
