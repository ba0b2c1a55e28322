//! HTTP client for the hosted record service.
//!
//! Collections live under `/rest/v1/{collection}` and accept filter query
//! parameters (`field=eq.value`, `field=in.(a,b)`, `order=field.asc`,
//! `limit=n`). Functions live under `/functions/v1/{name}`. Every request
//! carries the public `apikey` header and a bearer token: the signed-in
//! user's access token when there is one, the public key otherwise.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{BackendError, Collection, Filter, FunctionResponse, Query, RecordStore};
use crate::config::BuilderConfig;
use crate::session::SessionHandle;

pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    fallback_token: Option<String>,
    session: SessionHandle,
}

impl RestBackend {
    /// Build a client for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: &BuilderConfig, session: SessionHandle) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.service_key.clone(),
            fallback_token: config.access_token.clone(),
            session,
        })
    }

    fn bearer(&self) -> String {
        self.session
            .current()
            .map(|s| s.access_token)
            .or_else(|| self.fallback_token.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    fn table(&self, method: Method, collection: Collection) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{collection}"))
    }
}

async fn send(request: RequestBuilder) -> Result<(u16, String), BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))?;
    Ok((status, text))
}

async fn send_rows(request: RequestBuilder) -> Result<Vec<Value>, BackendError> {
    let (status, text) = send(request).await?;
    if !(200..300).contains(&status) {
        return Err(BackendError::Status { status, body: text });
    }
    parse_rows(&text)
}

pub(crate) fn parse_rows(text: &str) -> Result<Vec<Value>, BackendError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Function bodies are JSON when they parse, raw text otherwise.
pub(crate) fn parse_function_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Encode a query as URL parameters.
#[must_use]
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.filters.len() + 2);
    for filter in &query.filters {
        match filter {
            Filter::Eq(field, Value::Null) => pairs.push((field.clone(), "is.null".to_string())),
            Filter::Eq(field, value) => pairs.push((field.clone(), format!("eq.{}", scalar(value)))),
            Filter::In(field, values) => pairs.push((field.clone(), format!("in.({})", list(values)))),
            Filter::NotIn(field, values) => pairs.push((field.clone(), format!("not.in.({})", list(values)))),
        }
    }
    if let Some((field, order)) = &query.order {
        pairs.push(("order".to_string(), format!("{field}.{}", order.as_str())));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list(values: &[Value]) -> String {
    values.iter().map(quoted).collect::<Vec<_>>().join(",")
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl RecordStore for RestBackend {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, BackendError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query_pairs(query));
        debug!(%collection, params = pairs.len(), "select");
        send_rows(self.table(Method::GET, collection).query(&pairs)).await
    }

    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        debug!(%collection, count = rows.len(), "insert");
        let request = self
            .table(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&rows);
        send_rows(request).await
    }

    async fn upsert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        debug!(%collection, count = rows.len(), "upsert");
        let request = self
            .table(Method::POST, collection)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        send_rows(request).await
    }

    async fn update(&self, collection: Collection, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        debug!(%collection, "update");
        let request = self
            .table(Method::PATCH, collection)
            .query(&query_pairs(query))
            .header("Prefer", "return=representation")
            .json(&patch);
        send_rows(request).await
    }

    async fn delete(&self, collection: Collection, query: &Query) -> Result<usize, BackendError> {
        debug!(%collection, "delete");
        let request = self
            .table(Method::DELETE, collection)
            .query(&query_pairs(query))
            .header("Prefer", "return=representation");
        Ok(send_rows(request).await?.len())
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<FunctionResponse, BackendError> {
        debug!(function, "invoke");
        let request = self
            .request(Method::POST, &format!("/functions/v1/{function}"))
            .json(&body);
        let (status, text) = send(request).await?;
        Ok(FunctionResponse { status, body: parse_function_body(&text) })
    }
}
