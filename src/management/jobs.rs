use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ManagementApi;
use crate::error::Auth0Error;
use crate::request::{Part, Request};

const USERS_FILE_NAME: &str = "users.json";
const USERS_CONTENT_TYPE: &str = "text/json";

/// Background job of the tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// `pending`, `processing`, `completed` or `failed`.
    pub status: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options of a users import. Unset options use the server defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersImportOptions {
    pub upsert: Option<bool>,
    pub external_id: Option<String>,
    pub send_completion_email: Option<bool>,
}

/// `/api/v2/jobs`
pub struct JobsEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> JobsEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    pub fn get(&self, job_id: &str) -> Result<Request<Job>, Auth0Error> {
        self.api.request(Method::GET, &["jobs", job_id])
    }

    /// Imports the users of `users`, a JSON array file, into a database connection.
    pub fn import_users(
        &self,
        connection_id: &str,
        users: Vec<u8>,
        options: &UsersImportOptions,
    ) -> Result<Request<Job>, Auth0Error> {
        Ok(self
            .api
            .multipart(Method::POST, &["jobs", "users-imports"])?
            .with_part(Part::file(
                "users",
                USERS_FILE_NAME,
                USERS_CONTENT_TYPE,
                users,
            ))
            .with_parameter("connection_id", connection_id)
            .with_optional_parameter("upsert", options.upsert)
            .with_optional_parameter("external_id", options.external_id.clone())
            .with_optional_parameter("send_completion_email", options.send_completion_email))
    }

    /// Sends the verification email to `user_id`, through the application `client_id` when set.
    pub fn send_verification_email(
        &self,
        user_id: &str,
        client_id: Option<&str>,
    ) -> Result<Request<Job>, Auth0Error> {
        Ok(self
            .api
            .request(Method::POST, &["jobs", "verification-email"])?
            .with_parameter("user_id", user_id)
            .with_optional_parameter("client_id", client_id))
    }
}
