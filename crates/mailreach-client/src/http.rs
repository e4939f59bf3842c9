//! Authenticated REST client
//!
//! Every call is a single attempt. Non-2xx answers are turned into
//! [`Error::Api`] (or [`Error::Unauthorized`] for 401) with a message pulled
//! from the response body.

use crate::session::Session;
use mailreach_common::config::ApiConfig;
use mailreach_common::{Error, Result};
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying a per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// REST client shared by all domain services
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: Session,
}

impl ApiClient {
    /// Create a new client
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the bearer token and request id attached
    fn build_request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request_id = Uuid::new_v4().to_string();
        let mut request = self
            .client
            .request(method, &url)
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }

        (request, request_id)
    }

    /// Issue a request and return the parsed JSON body
    pub async fn request<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Value>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let (mut request, request_id) = self.build_request(method.clone(), path);

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, &method, path, &request_id).await
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request::<(), ()>(Method::GET, path, None, None).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value> {
        self.request::<Q, ()>(Method::GET, path, Some(query), None)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request::<(), B>(Method::POST, path, None, Some(body))
            .await
    }

    /// POST without a body, for action endpoints
    pub async fn post_empty(&self, path: &str) -> Result<Value> {
        self.request::<(), ()>(Method::POST, path, None, None).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request::<(), B>(Method::PUT, path, None, Some(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request::<(), ()>(Method::DELETE, path, None, None).await
    }

    /// Upload a file as the multipart field `file`
    pub async fn upload(
        &self,
        path: &str,
        file_name: &str,
        content: Vec<u8>,
        mime: &str,
    ) -> Result<Value> {
        let part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| Error::Validation(format!("Invalid content type '{}': {}", mime, e)))?;
        let form = multipart::Form::new().part("file", part);

        let (request, request_id) = self.build_request(Method::POST, path);
        self.execute(request.multipart(form), &Method::POST, path, &request_id)
            .await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: &Method,
        path: &str,
        request_id: &str,
    ) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            warn!("{} {} [{}] failed: {}", method, path, request_id, e);
            Error::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!("{} {} [{}] -> {}", method, path, request_id, status);

        let body = read_body(response).await?;

        if status.is_success() {
            return Ok(body);
        }

        let body = (!body.is_null()).then_some(body);
        let message = body
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        if status.as_u16() == 401 {
            Err(Error::Unauthorized { message, body })
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message,
                body,
            })
        }
    }
}

/// Parse a response body as JSON. Empty bodies become `Null` and non-JSON
/// bodies are kept as a string.
async fn read_body(response: Response) -> Result<Value> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Extract a human-readable message from an error body
pub fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => return Some(s.clone()),
        Value::Object(_) => {}
        _ => return None,
    }

    match body.get("detail") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
}
