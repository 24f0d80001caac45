//! A configured transport: base URL, default headers and the middleware chain.

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::{Error, ErrorResponse};
use crate::middleware::{truncate_body, Middleware};

/// State of a single exchange as it moves through the middleware chain.
///
/// Request fields are filled in before `on_request` hooks run; response
/// fields are `None`/empty until the transport has answered.
#[derive(Debug, Clone)]
pub struct Env {
    pub method: Method,
    pub url: Url,
    pub request_headers: HeaderMap,
    pub request_body: Option<String>,
    pub status: Option<StatusCode>,
    pub response_headers: HeaderMap,
    pub body: Option<String>,
}

impl Env {
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| s.is_success())
    }

    /// Snapshot of the exchange for building an [`ApiError`](crate::ApiError).
    pub fn error_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status.map(|s| s.as_u16()),
            body: self.body.clone(),
            method: None,
            url: None,
        }
        .with_request(&self.method, &self.url)
    }
}

/// A completed exchange, returned by `run_request` for inspection.
#[derive(Debug, Clone)]
pub struct RawResponse {
    env: Env,
}

impl RawResponse {
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn method(&self) -> &Method {
        &self.env.method
    }

    pub fn url(&self) -> &Url {
        &self.env.url
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.env.request_headers
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.env.status
    }

    /// Response body, empty when the server sent none.
    pub fn body(&self) -> &str {
        self.env.body.as_deref().unwrap_or_default()
    }

    /// Parses the body as JSON. An empty or whitespace-only body yields
    /// `Ok(None)` rather than an error or an empty value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        let body = self.body();
        if body.trim().is_empty() {
            return Ok(None);
        }
        let parsed = serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!(
                "Failed to parse response from {}: {} | body: {}",
                self.env.url,
                e,
                truncate_body(body)
            );
            Error::Parse(e)
        })?;
        Ok(Some(parsed))
    }
}

/// Reusable transport bound to one application's base URL.
///
/// Built once per [`Client`](crate::Client) and shared by every request the
/// client makes.
pub struct Connection {
    url_prefix: Url,
    headers: HeaderMap,
    handlers: Vec<Box<dyn Middleware>>,
    http: reqwest::Client,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url_prefix", &self.url_prefix.as_str())
            .field("handlers", &self.handlers())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(
        url_prefix: Url,
        headers: HeaderMap,
        handlers: Vec<Box<dyn Middleware>>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e)
            })?;
        Ok(Self {
            url_prefix,
            headers,
            handlers,
            http,
        })
    }

    /// Base URL every relative path is resolved against.
    pub fn url_prefix(&self) -> &Url {
        &self.url_prefix
    }

    /// Headers captured when the connection was built.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Names of the middleware in chain order.
    pub fn handlers(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.iter().any(|h| h.name() == name)
    }

    /// Resolves `path` to `<url_prefix>/<path>`. Absolute URLs are used as is.
    pub fn build_url(&self, path: &str) -> Result<Url, Error> {
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let joined = format!(
                    "{}/{}",
                    self.url_prefix.as_str().trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                Url::parse(&joined).map_err(|e| {
                    tracing::error!("Invalid URL constructed: {}", e);
                    Error::InvalidUrl(e)
                })
            }
            Err(e) => Err(Error::InvalidUrl(e)),
        }
    }

    /// Sends one request through the middleware chain.
    ///
    /// `headers` are merged over the connection's own headers. A failing
    /// `on_complete` hook (e.g. [`ApiErrors`](crate::middleware::ApiErrors)
    /// on a non-2xx status) turns the exchange into an `Err`.
    pub async fn run_request(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
        headers: HeaderMap,
    ) -> Result<RawResponse, Error> {
        let mut request_headers = self.headers.clone();
        request_headers.extend(headers);

        let mut env = Env {
            method,
            url,
            request_headers,
            request_body: body,
            status: None,
            response_headers: HeaderMap::new(),
            body: None,
        };
        for handler in &self.handlers {
            handler.on_request(&mut env)?;
        }

        let mut request = self
            .http
            .request(env.method.clone(), env.url.clone())
            .headers(env.request_headers.clone());
        if let Some(body) = &env.request_body {
            request = request.body(body.clone());
        }

        let resp = request.send().await.map_err(|e| {
            tracing::error!("Failed to send {} {}: {}", env.method, env.url, e);
            Error::RequestFailed(e)
        })?;
        env.status = Some(resp.status());
        env.response_headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e)
        })?;
        env.body = Some(body);

        for handler in &self.handlers {
            handler.on_complete(&env)?;
        }
        Ok(RawResponse { env })
    }
}
