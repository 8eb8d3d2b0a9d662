use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Filter, ManagementApi};
use crate::error::Auth0Error;
use crate::page::{Page, PageItem};
use crate::request::Request;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_clients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageItem for Connection {
    const ITEMS_KEY: &'static str = "connections";
}

/// `/api/v2/connections`
pub struct ConnectionsEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> ConnectionsEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    /// Connections can be narrowed to a `strategy`, such as `auth0`.
    pub fn list(
        &self,
        filter: &Filter,
        strategy: Option<&str>,
    ) -> Result<Request<Page<Connection>>, Auth0Error> {
        let mut request = filter.apply(self.api.request(Method::GET, &["connections"])?);
        if let Some(strategy) = strategy {
            request = request.with_query("strategy", strategy);
        }
        Ok(request)
    }

    pub fn get(
        &self,
        connection_id: &str,
        filter: &Filter,
    ) -> Result<Request<Connection>, Auth0Error> {
        let request = self
            .api
            .request(Method::GET, &["connections", connection_id])?;
        Ok(filter.apply(request))
    }

    pub fn delete(&self, connection_id: &str) -> Result<Request<()>, Auth0Error> {
        Ok(self
            .api
            .request::<()>(Method::DELETE, &["connections", connection_id])?
            .into_void())
    }
}
