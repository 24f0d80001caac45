//! Client for the Layer Platform REST API.
//!
//! Requests go through a per-client [`Connection`] whose middleware chain
//! maps every non-2xx response to a typed [`ApiError`].

mod client;
mod config;
mod connection;
mod errors;
pub mod middleware;
pub use self::client::{Client, ACCEPT_HEADER, PATCH_CONTENT_TYPE};
pub use self::config::{
    ClientConfig, API_TOKEN_VAR, APP_ID_VAR, DEFAULT_HOST, HOST_VAR, TIMEOUT_VAR,
};
pub use self::connection::{Connection, Env, RawResponse};
pub use self::errors::{ApiError, Error, ErrorResponse};
pub use reqwest::header;
pub use reqwest::{Method, StatusCode};
