use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::logs::LogEvent;
use super::roles::Role;
use super::{Filter, ManagementApi};
use crate::error::Auth0Error;
use crate::page::{Page, PageItem};
use crate::request::Request;

/// A user of the tenant. Only the fields that are set are sent on creation and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    /// Only sent, the API never returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    /// Only sent, the API never returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    /// Properties without a dedicated field, such as `identities`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageItem for User {
    const ITEMS_KEY: &'static str = "users";
}

/// `/api/v2/users`
pub struct UsersEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> UsersEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    pub fn list(&self, filter: &Filter) -> Result<Request<Page<User>>, Auth0Error> {
        let request = self.api.request(Method::GET, &["users"])?;
        Ok(filter.apply(request))
    }

    /// Only the fields options of `filter` apply.
    pub fn get(&self, user_id: &str, filter: &Filter) -> Result<Request<User>, Auth0Error> {
        let request = self.api.request(Method::GET, &["users", user_id])?;
        Ok(filter.apply(request))
    }

    pub fn create(&self, user: &User) -> Result<Request<User>, Auth0Error> {
        self.api.request(Method::POST, &["users"])?.with_body(user)
    }

    pub fn update(&self, user_id: &str, user: &User) -> Result<Request<User>, Auth0Error> {
        self.api
            .request(Method::PATCH, &["users", user_id])?
            .with_body(user)
    }

    pub fn delete(&self, user_id: &str) -> Result<Request<()>, Auth0Error> {
        Ok(self
            .api
            .request::<()>(Method::DELETE, &["users", user_id])?
            .into_void())
    }

    pub fn list_roles(
        &self,
        user_id: &str,
        filter: &Filter,
    ) -> Result<Request<Page<Role>>, Auth0Error> {
        let request = self.api.request(Method::GET, &["users", user_id, "roles"])?;
        Ok(filter.apply(request))
    }

    pub fn add_roles(&self, user_id: &str, role_ids: &[String]) -> Result<Request<()>, Auth0Error> {
        Ok(self
            .api
            .request::<()>(Method::POST, &["users", user_id, "roles"])?
            .with_parameter("roles", role_ids.to_vec())
            .into_void())
    }

    pub fn log_events(
        &self,
        user_id: &str,
        filter: &Filter,
    ) -> Result<Request<Page<LogEvent>>, Auth0Error> {
        let request = self.api.request(Method::GET, &["users", user_id, "logs"])?;
        Ok(filter.apply(request))
    }
}
