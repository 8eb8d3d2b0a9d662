use http::Method;
use serde::{Deserialize, Serialize};

use super::ManagementApi;
use crate::error::Auth0Error;
use crate::request::Request;

/// Ticket to verify the email of `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailVerificationTicket {
    pub user_id: String,
    /// Where the user lands once the email is verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Lifetime in seconds of the ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_email_in_redirect: Option<bool>,
}

/// Ticket to change the password of a user, identified either by `user_id` or by `email`
/// together with `connection_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PasswordChangeTicket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_email_as_verified: Option<bool>,
}

/// URL of a created ticket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ticket {
    pub ticket: String,
}

/// `/api/v2/tickets`
pub struct TicketsEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> TicketsEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    pub fn request_email_verification(
        &self,
        ticket: &EmailVerificationTicket,
    ) -> Result<Request<Ticket>, Auth0Error> {
        self.api
            .request(Method::POST, &["tickets", "email-verification"])?
            .with_body(ticket)
    }

    pub fn request_password_change(
        &self,
        ticket: &PasswordChangeTicket,
    ) -> Result<Request<Ticket>, Auth0Error> {
        self.api
            .request(Method::POST, &["tickets", "password-change"])?
            .with_body(ticket)
    }
}
