mod output;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use layer_api::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use layer_api::{
    Client, ClientConfig, Method, API_TOKEN_VAR, APP_ID_VAR, DEFAULT_HOST, HOST_VAR, TIMEOUT_VAR,
};
use serde_json::Value;

use crate::output::{render, OutputFormat};

/// Default filter; covers `layer_api` and `layer_cli` targets by prefix.
const LOG_DIRECTIVE: &str = "layer=info";

#[derive(Parser, Debug)]
#[command(name = "layer")]
#[command(about = "Send a single request to the Layer Platform API")]
struct Cli {
    /// Bearer token for the Authorization header
    #[arg(long, env = API_TOKEN_VAR, hide_env_values = true)]
    api_token: String,

    /// Application ID, embedded in the base URL
    #[arg(long, env = APP_ID_VAR)]
    app_id: String,

    /// API host
    #[arg(long, env = HOST_VAR, default_value = DEFAULT_HOST)]
    host: String,

    /// Request timeout in seconds
    #[arg(long, env = TIMEOUT_VAR, default_value = "30")]
    timeout: u64,

    /// Output format: pretty or compact
    #[arg(long, default_value = "pretty")]
    output: String,

    /// Content-Type override (e.g. application/vnd.layer-patch+json)
    #[arg(long)]
    content_type: Option<String>,

    /// JSON params: query pairs for GET, request body otherwise
    #[arg(long)]
    data: Option<String>,

    /// HTTP method (GET, POST, PATCH, DELETE, ...)
    method: String,

    /// Path relative to the app's base URL, or an absolute URL
    path: String,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_token, &self.app_id)
            .with_host(&self.host)
            .with_timeout(Duration::from_secs(self.timeout))
    }

    fn method(&self) -> Result<Method> {
        Method::from_bytes(self.method.to_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method: {}", self.method))
    }

    fn params(&self) -> Result<Option<Value>> {
        self.data
            .as_deref()
            .map(|data| serde_json::from_str(data).context("--data is not valid JSON"))
            .transpose()
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = &self.content_type {
            let value = HeaderValue::from_str(content_type)
                .with_context(|| format!("invalid content type: {}", content_type))?;
            headers.insert(CONTENT_TYPE, value);
        }
        Ok(headers)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse()?),
        )
        .with_target(false)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);
    let method = cli.method()?;
    let params = cli.params()?;
    let headers = cli.headers()?;

    let client = Client::new(cli.config());
    let body = client
        .call_with_headers(method, &cli.path, params.as_ref(), headers)
        .await?;

    println!("{}", render(body.as_ref(), &format)?);
    Ok(())
}
