//! Remote record store: the persistence/auth service behind the builder.
//!
//! DESIGN
//! ======
//! The service is an opaque collaborator exposing record CRUD over a few
//! named collections plus server-side function invocation. [`RecordStore`]
//! is the seam: [`rest::RestBackend`] speaks the HTTP dialect of the hosted
//! service, [`memory::MemoryBackend`] keeps rows in process for tests and
//! offline use. Rows travel as `serde_json::Value` objects; services own the
//! typed row structs and convert at the edge.

pub mod memory;
pub mod rest;

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::notice::ErrorCode;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

// =============================================================================
// COLLECTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Elements,
    History,
    Sections,
    DesignSettings,
    Projects,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elements => "elements",
            Self::History => "history",
            Self::Sections => "sections",
            Self::DesignSettings => "design_settings",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// QUERY
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field == value`
    Eq(String, Value),
    /// `field` is one of `values`
    In(String, Vec<Value>),
    /// `field` is none of `values`
    NotIn(String, Vec<Value>),
}

impl Filter {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq(field, value) => row.get(field) == Some(value),
            Self::In(field, values) => row.get(field).is_some_and(|v| values.contains(v)),
            Self::NotIn(field, values) => row.get(field).is_none_or(|v| !values.contains(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Row selector: equality filters, optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn is_in<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.filters
            .push(Filter::In(field.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn not_in<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.filters
            .push(Filter::NotIn(field.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order = Some((field.into(), order));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when `row` passes every filter.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Apply ordering and limit to rows that already passed the filters.
    #[must_use]
    pub fn arrange(&self, mut rows: Vec<Value>) -> Vec<Value> {
        if let Some((field, order)) = &self.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// Total order over JSON scalars: missing < null < numbers < strings < other.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// =============================================================================
// FUNCTIONS
// =============================================================================

/// Result of a server-side function call. Non-2xx statuses are data, not
/// transport errors; callers decide what a failure status means.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    pub status: u16,
    pub body: Value,
}

impl FunctionResponse {
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service responded with status {status}")]
    Status { status: u16, body: String },

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_BACKEND_REQUEST",
            Self::Status { .. } => "E_BACKEND_STATUS",
            Self::Decode(_) => "E_BACKEND_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Unavailable(_) => "E_BACKEND_UNAVAILABLE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Unavailable(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Record CRUD plus function invocation. Enables swapping the hosted
/// service for an in-process store in tests.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `collection` matching `query`, ordered and limited.
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, BackendError>;

    /// Insert rows and return them as stored.
    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError>;

    /// Insert rows, replacing any stored row with the same `id`.
    async fn upsert(&self, collection: Collection, rows: Vec<Value>) -> Result<Vec<Value>, BackendError>;

    /// Merge `patch` into every matching row and return the updated rows.
    async fn update(&self, collection: Collection, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError>;

    /// Delete matching rows and return how many were removed.
    async fn delete(&self, collection: Collection, query: &Query) -> Result<usize, BackendError>;

    /// Invoke a server-side function with a JSON body.
    async fn invoke(&self, function: &str, body: Value) -> Result<FunctionResponse, BackendError>;
}
