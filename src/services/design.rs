//! Design settings: per-project tokens (colors, fonts, radius) that pages
//! render with. Stored one row per project in `design_settings`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::{BackendError, Collection, Query};
use crate::notice::{ErrorCode, NoticeLevel};
use crate::state::BuilderState;

#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    #[error("sign in to save design settings")]
    NoSession,
    #[error("design settings could not be encoded: {0}")]
    Encode(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ErrorCode for DesignError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSession => "E_NO_SESSION",
            Self::Encode(_) => "E_DESIGN_ENCODE",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.retryable())
    }

    fn level(&self) -> NoticeLevel {
        match self {
            Self::NoSession => NoticeLevel::Warning,
            Self::Encode(_) | Self::Backend(_) => NoticeLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub heading_font: String,
    /// Pixels.
    pub border_radius: f64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".into(),
            secondary_color: "#8b5cf6".into(),
            background_color: "#ffffff".into(),
            text_color: "#111827".into(),
            font_family: "Inter, sans-serif".into(),
            heading_font: "Inter, sans-serif".into(),
            border_radius: 8.0,
        }
    }
}

impl DesignSettings {
    /// CSS custom properties for a page root.
    #[must_use]
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--primary-color", self.primary_color.clone()),
            ("--secondary-color", self.secondary_color.clone()),
            ("--background-color", self.background_color.clone()),
            ("--text-color", self.text_color.clone()),
            ("--font-family", self.font_family.clone()),
            ("--heading-font", self.heading_font.clone()),
            ("--border-radius", format!("{}px", self.border_radius)),
        ]
    }
}

fn project_query(state: &BuilderState) -> Query {
    Query::new().eq("project_id", state.project_id.to_string())
}

/// The project's design settings; defaults when none are stored or the
/// stored row is unreadable.
///
/// # Errors
///
/// Returns `Backend` when the read fails.
pub async fn load_design_settings(state: &BuilderState) -> Result<DesignSettings, DesignError> {
    let rows = state
        .backend
        .select(Collection::DesignSettings, &project_query(state).limit(1))
        .await
        .inspect_err(|e| warn!(project_id = %state.project_id, error = %e, "design settings load failed"))?;
    let settings = rows
        .into_iter()
        .next()
        .and_then(|row| serde_json::from_value(row).ok())
        .unwrap_or_default();
    Ok(settings)
}

/// Store the project's design settings, updating the row when it exists.
///
/// # Errors
///
/// Returns `NoSession` when signed out and `Backend` when the write fails.
pub async fn save_design_settings(state: &BuilderState, settings: &DesignSettings) -> Result<(), DesignError> {
    if !state.session.is_signed_in() {
        return Err(DesignError::NoSession);
    }
    let patch = serde_json::to_value(settings).map_err(|e| DesignError::Encode(e.to_string()))?;
    let updated = state
        .backend
        .update(Collection::DesignSettings, &project_query(state), patch.clone())
        .await?;
    if updated.is_empty() {
        let mut row = patch;
        if let Some(map) = row.as_object_mut() {
            map.insert("project_id".into(), Value::String(state.project_id.to_string()));
        }
        state.backend.insert(Collection::DesignSettings, vec![row]).await?;
    }
    info!(project_id = %state.project_id, "design settings saved");
    Ok(())
}
