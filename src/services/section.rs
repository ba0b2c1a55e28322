//! Section templates: reusable groups of elements stored in `sections`.
//!
//! A template's element positions are relative to the section's top edge.
//! Inserting a template stacks it below the lowest existing element.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{BackendError, Collection, Order, Query};
use crate::doc::{Element, ElementDraft};
use crate::notice::{ErrorCode, NoticeLevel};
use crate::state::BuilderState;

#[derive(Debug, thiserror::Error)]
pub enum SectionError {
    #[error("section template {0} has malformed elements")]
    InvalidTemplate(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ErrorCode for SectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTemplate(_) => "E_INVALID_TEMPLATE",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(e) if e.retryable())
    }

    fn level(&self) -> NoticeLevel {
        match self {
            Self::InvalidTemplate(_) => NoticeLevel::Warning,
            Self::Backend(_) => NoticeLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementDraft>,
}

/// Available templates, by name, optionally limited to one category.
///
/// # Errors
///
/// Returns `Backend` when the read fails.
pub async fn load_sections(state: &BuilderState, category: Option<&str>) -> Result<Vec<SectionTemplate>, SectionError> {
    let mut query = Query::new().order_by("name", Order::Asc);
    if let Some(category) = category {
        query = query.eq("category", category);
    }
    let rows = state
        .backend
        .select(Collection::Sections, &query)
        .await
        .inspect_err(|e| warn!(error = %e, "section load failed"))?;
    let total = rows.len();
    let templates: Vec<SectionTemplate> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if templates.len() < total {
        warn!(skipped = total - templates.len(), "skipped undecodable section rows");
    }
    Ok(templates)
}

/// Add every element of `template` below the page's current content.
///
/// # Errors
///
/// Returns `InvalidTemplate` when any element's properties are not an
/// object; nothing is added in that case.
pub async fn insert_section(state: &BuilderState, template: &SectionTemplate) -> Result<Vec<Element>, SectionError> {
    if template.elements.iter().any(|d| !d.properties.is_object()) {
        return Err(SectionError::InvalidTemplate(template.id.clone()));
    }
    let added = state
        .mutate_store(|store| {
            let top = store.content_bottom();
            template
                .elements
                .iter()
                .map(|draft| store.add(draft.clone().offset(0.0, top)))
                .collect::<Vec<_>>()
        })
        .await;
    info!(page_id = %state.page_id, section = %template.name, count = added.len(), "section inserted");
    Ok(added)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use serde_json::json;

    use super::*;
    use crate::doc::Position;
    use crate::services::element::{add_element, elements};
    use crate::state::test_helpers::test_builder_state;

    fn hero() -> SectionTemplate {
        SectionTemplate {
            id: "hero".into(),
            name: "Hero".into(),
            category: Some("header".into()),
            thumbnail: None,
            elements: vec![
                ElementDraft::new("heading", json!({"content": "Welcome"}), Position::new(40.0, 0.0, 400.0, 60.0)),
                ElementDraft::new("button", json!({"content": "Start"}), Position::new(40.0, 80.0, 120.0, 40.0)),
            ],
        }
    }

    #[tokio::test]
    async fn load_filters_by_category_and_sorts() {
        let (state, backend) = test_builder_state();
        backend.seed(
            Collection::Sections,
            [
                json!({"id": "2", "name": "Pricing", "category": "content", "elements": []}),
                json!({"id": "1", "name": "Hero", "category": "header", "elements": []}),
                json!({"id": "3", "name": "About", "category": "content", "elements": []}),
                json!({"name": "Broken"}),
            ],
        );
        let names: Vec<String> = load_sections(&state, Some("content"))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["About".to_string(), "Pricing".to_string()]);
        assert_eq!(load_sections(&state, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn load_failure_is_reported() {
        let (state, backend) = test_builder_state();
        backend.fail_reads(true);
        assert!(matches!(load_sections(&state, None).await, Err(SectionError::Backend(_))));
    }

    #[tokio::test]
    async fn insert_into_empty_page_keeps_template_positions() {
        let (state, _backend) = test_builder_state();
        let added = insert_section(&state, &hero()).await.unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[1].position.y, 80.0);
    }

    #[tokio::test]
    async fn insert_stacks_below_existing_content() {
        let (state, _backend) = test_builder_state();
        add_element(&state, ElementDraft::new("image", json!({}), Position::new(0.0, 100.0, 300.0, 200.0)))
            .await
            .unwrap();
        let added = insert_section(&state, &hero()).await.unwrap();
        assert_eq!(added[0].position.y, 300.0);
        assert_eq!(added[1].position.y, 380.0);
        assert_eq!(elements(&state).await.len(), 3);
    }

    #[tokio::test]
    async fn malformed_template_adds_nothing() {
        let (state, _backend) = test_builder_state();
        let mut template = hero();
        template.elements[1].properties = json!("bad");
        assert!(matches!(insert_section(&state, &template).await, Err(SectionError::InvalidTemplate(_))));
        assert!(elements(&state).await.is_empty());
    }
}
