//! Error types for the API client.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// The parts of a failed exchange that errors are built from.
///
/// Every field is optional so an error can be constructed from a partial
/// response, or from nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code, if one was received.
    pub status: Option<u16>,
    /// Raw response body.
    pub body: Option<String>,
    /// Request method, upper-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Fully resolved request URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            method: None,
            url: None,
        }
    }

    /// Records which request produced this response.
    pub fn with_request(mut self, method: &Method, url: &Url) -> Self {
        self.method = Some(method.as_str().to_uppercase());
        self.url = Some(url.to_string());
        self
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(method) = &self.method {
            write!(f, "{} ", method)?;
        }
        if let Some(url) = &self.url {
            write!(f, "{}: ", url)?;
        }
        match self.status {
            Some(status) => write!(f, "{}", status)?,
            None => write!(f, "no status")?,
        }
        if let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) {
            write!(f, " - {}", body)?;
        }
        Ok(())
    }
}

/// Typed errors for non-success responses from the platform.
///
/// The set of variants is closed: any status without a dedicated variant
/// maps to [`ApiError::Generic`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("API error: {0}")]
    Generic(ErrorResponse),
    #[error("Bad request: {0}")]
    BadRequest(ErrorResponse),
    #[error("Not found: {0}")]
    NotFound(ErrorResponse),
    #[error("Conflict: {0}")]
    Conflict(ErrorResponse),
    #[error("Resource deleted: {0}")]
    ResourceDeleted(ErrorResponse),
    #[error("Server error: {0}")]
    ServerError(ErrorResponse),
}

impl ApiError {
    /// Classifies a response by status code. Never fails; unknown or
    /// missing statuses produce [`ApiError::Generic`].
    pub fn from_response(response: ErrorResponse) -> Self {
        match response.status {
            Some(400) => Self::BadRequest(response),
            Some(404) => Self::NotFound(response),
            Some(409) => Self::Conflict(response),
            Some(410) => Self::ResourceDeleted(response),
            Some(500..=599) => Self::ServerError(response),
            _ => Self::Generic(response),
        }
    }

    /// The response this error was built from, unchanged.
    pub fn response(&self) -> &ErrorResponse {
        match self {
            Self::Generic(r)
            | Self::BadRequest(r)
            | Self::NotFound(r)
            | Self::Conflict(r)
            | Self::ResourceDeleted(r)
            | Self::ServerError(r) => r,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().status
    }

    /// Short stable name of the variant, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generic(_) => "error",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::ResourceDeleted(_) => "resource_deleted",
            Self::ServerError(_) => "server_error",
        }
    }
}

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The platform answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The transport failed (connection, timeout, body read).
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid value for header {0}")]
    InvalidHeader(String),
    /// A success response carried a body that isn't the expected JSON.
    #[error("Failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing configuration: {0} is not set")]
    MissingConfig(&'static str),
}

impl Error {
    /// Returns the typed API error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ErrorResponse {
        ErrorResponse {
            status: Some(code),
            ..Default::default()
        }
    }

    #[test]
    fn maps_404_to_not_found() {
        assert!(matches!(
            ApiError::from_response(status(404)),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn maps_400_to_bad_request() {
        assert!(matches!(
            ApiError::from_response(status(400)),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn maps_409_to_conflict() {
        assert!(matches!(
            ApiError::from_response(status(409)),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn maps_410_to_resource_deleted() {
        assert!(matches!(
            ApiError::from_response(status(410)),
            ApiError::ResourceDeleted(_)
        ));
    }

    #[test]
    fn maps_every_5xx_to_server_error() {
        for code in 500..=599 {
            let err = ApiError::from_response(status(code));
            assert!(
                matches!(err, ApiError::ServerError(_)),
                "status {} mapped to {}",
                code,
                err.kind()
            );
        }
    }

    #[test]
    fn unhandled_status_is_generic() {
        assert!(matches!(
            ApiError::from_response(ErrorResponse::default()),
            ApiError::Generic(_)
        ));
        for code in [200, 401, 403, 422, 429, 499, 600] {
            assert!(matches!(
                ApiError::from_response(status(code)),
                ApiError::Generic(_)
            ));
        }
    }

    #[test]
    fn keeps_the_response() {
        let err = ApiError::from_response(ErrorResponse::default());
        assert_eq!(err.response(), &ErrorResponse::default());

        let response = ErrorResponse::new(409, r#"{"id":"conflict"}"#);
        let err = ApiError::from_response(response.clone());
        assert_eq!(err.response(), &response);
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn message_contains_status_and_body() {
        let err = ApiError::from_response(ErrorResponse::new(200, "random_test_body"));
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("random_test_body"));
    }

    #[test]
    fn message_includes_request() {
        let url = Url::parse("https://api.layer.com/apps/1234/conversations/abc").unwrap();
        let response = ErrorResponse::new(404, r#"{"message":"missing"}"#)
            .with_request(&Method::GET, &url);
        insta::assert_snapshot!(
            "message_with_request",
            ApiError::from_response(response).to_string()
        );
    }

    #[test]
    fn crate_error_exposes_api_error() {
        let err: Error = ApiError::from_response(status(503)).into();
        assert_eq!(err.api().map(ApiError::kind), Some("server_error"));

        let err = Error::MissingConfig("LAYER_APP_ID");
        assert!(err.api().is_none());
    }
}
