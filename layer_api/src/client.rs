//! HTTP client for the Layer Platform API.

use std::sync::{Mutex, OnceLock};

use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    config::ClientConfig,
    connection::{Connection, RawResponse},
    middleware::default_handlers,
    Error,
};

/// Versioned media type the platform expects in `Accept`.
pub const ACCEPT_HEADER: &str = "application/vnd.layer+json; version=1.0";

/// Content type for JSON-patch style edits.
pub const PATCH_CONTENT_TYPE: &str = "application/vnd.layer-patch+json";

/// HTTP client for one Layer application.
///
/// Every request carries the bearer token, the versioned `Accept` header and
/// a random `If-None-Match` value that changes per request. The underlying
/// [`Connection`] is built on first use and reused for the lifetime of the
/// client.
pub struct Client {
    config: ClientConfig,
    connection: OnceLock<Connection>,
    /// Held while the connection is first built so it is built only once.
    build_lock: Mutex<()>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connection: OnceLock::new(),
            build_lock: Mutex::new(()),
        }
    }

    /// Creates a client from `LAYER_API_TOKEN` / `LAYER_APP_ID`.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn api_token(&self) -> &str {
        &self.config.api_token
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    /// Headers attached to every request. `If-None-Match` differs on each call.
    pub fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth = header_value(&AUTHORIZATION, &format!("Bearer {}", self.config.api_token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        headers.insert(IF_NONE_MATCH, header_value(&IF_NONE_MATCH, &freshness_token())?);
        Ok(headers)
    }

    /// Returns the client's connection, building it on first access.
    pub fn connection(&self) -> Result<&Connection, Error> {
        if let Some(conn) = self.connection.get() {
            return Ok(conn);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = self.connection.get() {
            return Ok(conn);
        }
        let url_prefix = Url::parse(&self.base_url()).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", self.base_url(), e);
            Error::InvalidUrl(e)
        })?;
        let conn = Connection::new(
            url_prefix,
            self.default_headers()?,
            default_handlers(),
            self.config.timeout,
        )?;
        Ok(self.connection.get_or_init(|| conn))
    }

    /// Sends a request and returns the completed exchange.
    ///
    /// For `GET` and `HEAD`, object params become query pairs; otherwise they
    /// are sent as a JSON body. `None` sends neither. Non-2xx responses come
    /// back as [`Error::Api`].
    pub async fn run_request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        self.run_request_with_headers(method, path, params, HeaderMap::new())
            .await
    }

    /// Like [`run_request`](Self::run_request), with `headers` overriding the defaults.
    pub async fn run_request_with_headers(
        &self,
        method: Method,
        path: &str,
        params: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<RawResponse, Error> {
        let conn = self.connection()?;
        let mut url = conn.build_url(path)?;
        let body = encode_params(&method, &mut url, params)?;

        let mut request_headers = self.default_headers()?;
        request_headers.extend(headers);

        conn.run_request(method, url, body, request_headers).await
    }

    /// Runs a request and returns the parsed JSON body, or `None` when the
    /// response has no body.
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        params: Option<&Value>,
    ) -> Result<Option<Value>, Error> {
        self.call_as(method, url, params).await
    }

    /// Typed variant of [`call`](Self::call).
    pub async fn call_as<T>(
        &self,
        method: Method,
        url: &str,
        params: Option<&Value>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.run_request(method, url, params).await?.json()
    }

    pub async fn call_with_headers(
        &self,
        method: Method,
        url: &str,
        params: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<Option<Value>, Error> {
        self.run_request_with_headers(method, url, params, headers)
            .await?
            .json()
    }
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))
}

fn freshness_token() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

fn encode_params(
    method: &Method,
    url: &mut Url,
    params: Option<&Value>,
) -> Result<Option<String>, Error> {
    match params {
        None => Ok(None),
        Some(Value::Object(map)) if *method == Method::GET || *method == Method::HEAD => {
            if map.values().any(|v| !v.is_null()) {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(s) => {
                            pairs.append_pair(key, s);
                        }
                        other => {
                            pairs.append_pair(key, &other.to_string());
                        }
                    }
                }
            }
            Ok(None)
        }
        Some(params) => Ok(Some(serde_json::to_string(params)?)),
    }
}
