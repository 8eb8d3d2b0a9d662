//! Client of the Auth0 Authentication and Management APIs.
//!
//! Operations of [`AuthApi`] and [`ManagementApi`] return a [`Request`] that is executed either
//! blocking the current thread or asynchronously.

pub mod auth_api;
pub mod authenticator;
pub mod commands;
pub mod credential;
pub mod domain;
pub mod error;
pub mod http;
pub mod http_client;
pub mod jwt;
pub mod management;
pub mod page;
pub mod parameters;
pub mod request;
pub mod token;
pub mod token_provider;

pub use auth_api::AuthApi;
pub use error::Auth0Error;
pub use management::ManagementApi;
pub use page::Page;
pub use request::{Request, Response};
