//! Request/response hooks composed into a [`Connection`](crate::Connection).

use crate::connection::Env;
use crate::errors::{ApiError, Error};

/// A stage in the connection's processing chain.
///
/// `on_request` hooks run in registration order before the request is sent
/// and may rewrite it. `on_complete` hooks run in registration order once the
/// response body has been read; returning `Err` fails the request.
pub trait Middleware: Send + Sync {
    /// Name reported by [`Connection::handlers`](crate::Connection::handlers).
    fn name(&self) -> &'static str;

    fn on_request(&self, _env: &mut Env) -> Result<(), Error> {
        Ok(())
    }

    fn on_complete(&self, _env: &Env) -> Result<(), Error> {
        Ok(())
    }
}

/// Turns every non-2xx response into a typed [`ApiError`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiErrors;

impl ApiErrors {
    pub const NAME: &'static str = "api_errors";
}

impl Middleware for ApiErrors {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_complete(&self, env: &Env) -> Result<(), Error> {
        if env.is_success() {
            return Ok(());
        }
        Err(ApiError::from_response(env.error_response()).into())
    }
}

/// Emits a `tracing` event for each request and its outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct Instrumentation;

impl Instrumentation {
    pub const NAME: &'static str = "instrumentation";
}

impl Middleware for Instrumentation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_request(&self, env: &mut Env) -> Result<(), Error> {
        tracing::debug!("{} {}", env.method, env.url);
        Ok(())
    }

    fn on_complete(&self, env: &Env) -> Result<(), Error> {
        let status = env.status.map(|s| s.as_u16()).unwrap_or_default();
        if env.is_success() {
            tracing::debug!("{} {} -> {}", env.method, env.url, status);
        } else {
            let body = env.body.as_deref().unwrap_or_default();
            tracing::error!(
                "{} {} failed with status {}: {}",
                env.method,
                env.url,
                status,
                truncate_body(body)
            );
        }
        Ok(())
    }
}

/// The chain every client connection is built with.
pub(crate) fn default_handlers() -> Vec<Box<dyn Middleware>> {
    vec![Box::new(Instrumentation), Box::new(ApiErrors)]
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
