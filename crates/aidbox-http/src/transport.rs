use aidbox_core::{Error, Method, Request, Result, Transport};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::{AuthConfig, ConnectionConfig};
use crate::error::ConfigError;

const OPERATION_OUTCOME: &str = "OperationOutcome";

/// [`Transport`] over HTTP.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    auth: Option<AuthConfig>,
    accept: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(config: ConnectionConfig) -> std::result::Result<Self, ConfigError> {
        let url = Url::parse(&config.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidScheme(url.scheme().to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: config.auth,
            accept: config.accept,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        match &self.auth {
            Some(AuthConfig::Basic { username, password }) => {
                req = req.basic_auth(username, Some(password));
            }
            Some(AuthConfig::Bearer { token }) => {
                req = req.bearer_auth(token);
            }
            Some(AuthConfig::Header { value }) => {
                req = req.header(AUTHORIZATION, value);
            }
            None => {}
        }
        req.header(ACCEPT, &self.accept)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Value> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, params = request.query.len(), "sending request");

        let mut req = self.request(method, &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport(None, format!("Failed to connect to server: {e}")))?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: Response) -> Result<Value> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::transport(Some(status.as_u16()), format!("Failed to read response: {e}")))?;

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&body)?);
    }

    debug!(status = status.as_u16(), "request failed");
    let outcome = serde_json::from_str::<Value>(&body)
        .ok()
        .filter(|json| json.get("resourceType").and_then(Value::as_str) == Some(OPERATION_OUTCOME));
    let message = outcome
        .as_ref()
        .and_then(diagnostics)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.clone()
            }
        });

    Err(match (status, outcome) {
        (StatusCode::NOT_FOUND | StatusCode::GONE, _) => Error::not_found(message),
        (
            StatusCode::BAD_REQUEST
            | StatusCode::CONFLICT
            | StatusCode::PRECONDITION_FAILED
            | StatusCode::UNPROCESSABLE_ENTITY,
            Some(outcome),
        ) => Error::validation(message, outcome),
        _ => Error::transport(Some(status.as_u16()), message),
    })
}

/// Joins the `diagnostics` of every OperationOutcome issue.
fn diagnostics(outcome: &Value) -> Option<String> {
    let messages: Vec<&str> = outcome
        .get("issue")?
        .as_array()?
        .iter()
        .filter_map(|issue| issue.get("diagnostics").and_then(Value::as_str))
        .collect();
    (!messages.is_empty()).then(|| messages.join("; "))
}
