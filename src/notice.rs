//! User-facing notices.
//!
//! DESIGN
//! ======
//! Expected failures (nothing selected, clipboard empty, a remote write that
//! did not land) are returned as typed errors rather than panics. Every
//! service error implements [`ErrorCode`] so the host can turn it into a
//! transient [`Notice`] without matching on each enum.

use serde::Serialize;

/// Grepable error code plus presentation hints for a service error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }

    fn level(&self) -> NoticeLevel {
        NoticeLevel::Error
    }
}

/// Severity of a notice as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user, usually rendered as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    pub retryable: bool,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, code: None, message: message.into(), retryable: false }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, code: None, message: message.into(), retryable: false }
    }

    /// Build a notice from any service error.
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self {
            level: err.level(),
            code: Some(err.error_code().to_string()),
            message: err.to_string(),
            retryable: err.retryable(),
        }
    }
}
