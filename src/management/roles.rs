use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::users::User;
use super::{Filter, ManagementApi};
use crate::error::Auth0Error;
use crate::page::{Page, PageItem};
use crate::request::Request;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageItem for Role {
    const ITEMS_KEY: &'static str = "roles";
}

/// `/api/v2/roles`
pub struct RolesEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> RolesEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    /// Roles can be filtered by name with `name_filter`.
    pub fn list(
        &self,
        filter: &Filter,
        name_filter: Option<&str>,
    ) -> Result<Request<Page<Role>>, Auth0Error> {
        let mut request = filter.apply(self.api.request(Method::GET, &["roles"])?);
        if let Some(name) = name_filter {
            request = request.with_query("name_filter", name);
        }
        Ok(request)
    }

    pub fn get(&self, role_id: &str) -> Result<Request<Role>, Auth0Error> {
        self.api.request(Method::GET, &["roles", role_id])
    }

    pub fn create(&self, role: &Role) -> Result<Request<Role>, Auth0Error> {
        self.api.request(Method::POST, &["roles"])?.with_body(role)
    }

    pub fn update(&self, role_id: &str, role: &Role) -> Result<Request<Role>, Auth0Error> {
        self.api
            .request(Method::PATCH, &["roles", role_id])?
            .with_body(role)
    }

    pub fn delete(&self, role_id: &str) -> Result<Request<()>, Auth0Error> {
        Ok(self
            .api
            .request::<()>(Method::DELETE, &["roles", role_id])?
            .into_void())
    }

    pub fn list_users(
        &self,
        role_id: &str,
        filter: &Filter,
    ) -> Result<Request<Page<User>>, Auth0Error> {
        let request = self.api.request(Method::GET, &["roles", role_id, "users"])?;
        Ok(filter.apply(request))
    }

    pub fn assign_users(
        &self,
        role_id: &str,
        user_ids: &[String],
    ) -> Result<Request<()>, Auth0Error> {
        Ok(self
            .api
            .request::<()>(Method::POST, &["roles", role_id, "users"])?
            .with_parameter("users", user_ids.to_vec())
            .into_void())
    }
}
