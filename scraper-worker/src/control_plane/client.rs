//! Authenticated HTTP transport for the control-plane.

use std::fmt;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::Endpoint;
use crate::error::{Error, Result};

/// Bearer credential for the control-plane. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// A request to a control-plane endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: Option<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    error_message: String,
}

impl ApiRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path: None,
            query: Vec::new(),
            body: None,
            error_message: String::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Append a trailing path segment after the endpoint path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Append a query parameter. Parameters keep their insertion order.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Message logged when the control-plane answers with a non-success status.
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

/// A fully read control-plane response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Control-plane HTTP client.
///
/// Non-success responses are logged and returned as-is; callers inspect the
/// status themselves. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http_client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl ControlPlaneClient {
    pub fn new(base_url: &str, api_key: ApiKey) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(http_client: Client, base_url: &str, api_key: ApiKey) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the target URL for an endpoint, optional path suffix and query.
    pub fn url(&self, endpoint: Endpoint, path: Option<&str>, query: &[(String, String)]) -> Result<Url> {
        let mut raw = format!("{}/{}", self.base_url, endpoint.path());
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            raw.push('/');
            raw.push_str(path);
        }

        let mut url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid control-plane URL '{}': {}", raw, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a JSON request to an endpoint.
    pub async fn request(&self, endpoint: Endpoint, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url(endpoint, request.path.as_deref(), &request.query)?;
        tracing::debug!(endpoint = endpoint.path(), method = %request.method, "Control-plane request");

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(self.api_key.expose());
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = self.read(builder).await?;
        if !response.is_success() {
            tracing::warn!(
                endpoint = endpoint.path(),
                status = response.status.as_u16(),
                response = %response.text(),
                body = ?request.body,
                "{}",
                request.error_message
            );
        }
        Ok(response)
    }

    /// Upload a multipart form. Only the bearer header is attached.
    pub async fn upload(
        &self,
        endpoint: Endpoint,
        query: &[(String, String)],
        form: Form,
        error_message: &str,
    ) -> Result<ApiResponse> {
        let url = self.url(endpoint, None, query)?;
        tracing::debug!(endpoint = endpoint.path(), "Control-plane upload");

        let builder = self
            .http_client
            .post(url)
            .bearer_auth(self.api_key.expose())
            .multipart(form);

        let response = self.read(builder).await?;
        if !response.is_success() {
            tracing::warn!(
                endpoint = endpoint.path(),
                status = response.status.as_u16(),
                response = %response.text(),
                "{}",
                error_message
            );
        }
        Ok(response)
    }

    async fn read(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }
}
