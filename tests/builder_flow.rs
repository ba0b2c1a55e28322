//! End-to-end builder scenarios over the in-memory backend.

#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use sitebuilder::backend::{Collection, MemoryBackend};
use sitebuilder::config::BuilderConfig;
use sitebuilder::doc::{Element, ElementDraft, PartialElement, Position};
use sitebuilder::interaction::ActionKind;
use sitebuilder::responsive::{Viewport, effective_style, is_visible};
use sitebuilder::services::action::{ActionExecutor, ActionOutcome, HeadlessNavigator};
use sitebuilder::services::{clipboard, element, history};
use sitebuilder::session::{Session, SessionHandle};
use sitebuilder::state::BuilderState;
use uuid::Uuid;

fn signed_in_state() -> (BuilderState, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let session = SessionHandle::signed_in(Session { user_id: Uuid::new_v4(), access_token: "token".into() });
    let state = BuilderState::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Arc::clone(&backend) as _,
        session,
        BuilderConfig::new("http://localhost:54321", "key"),
    );
    (state, backend)
}

fn button(x: f64) -> ElementDraft {
    ElementDraft::new("button", json!({"content": "Click"}), Position::new(x, 0.0, 100.0, 40.0))
}

fn with_click(kind: &str, on_click: Value) -> ElementDraft {
    ElementDraft::new(kind, json!({"interactions": {"onClick": on_click}}), Position::new(0.0, 0.0, 100.0, 40.0))
}

async fn visible_at(state: &BuilderState, id: &str, viewport: Viewport) -> bool {
    let el = element::find_element(state, id).await.unwrap();
    is_visible(&el.properties, viewport)
}

fn ids(elements: &[Element]) -> Vec<String> {
    elements.iter().map(|e| e.id.clone()).collect()
}

#[tokio::test]
async fn undo_walks_back_to_the_loaded_page() {
    let (state, backend) = signed_in_state();
    assert_eq!(history::load_history(&state).await.unwrap(), 1);

    for i in 0..3 {
        element::add_element(&state, button(f64::from(i) * 120.0)).await.unwrap();
        assert!(history::commit_snapshot(&state).await.unwrap());
    }
    assert_eq!(backend.rows(Collection::History).len(), 4);

    for _ in 0..3 {
        assert!(history::undo(&state).await);
    }
    assert!(element::elements(&state).await.is_empty());
    assert!(!history::undo(&state).await);
}

#[tokio::test]
async fn redo_restores_the_exact_list() {
    let (state, _backend) = signed_in_state();
    history::load_history(&state).await.unwrap();
    element::add_element(&state, button(0.0)).await.unwrap();
    history::commit_snapshot(&state).await.unwrap();
    element::add_element(&state, button(120.0)).await.unwrap();
    history::commit_snapshot(&state).await.unwrap();
    let before = element::elements(&state).await;

    assert!(history::undo(&state).await);
    assert_eq!(element::elements(&state).await.len(), 1);
    assert!(history::redo(&state).await);
    assert_eq!(element::elements(&state).await, before);
    assert!(!history::can_redo(&state).await);
}

#[tokio::test]
async fn edit_after_undo_drops_the_redo_branch() {
    let (state, backend) = signed_in_state();
    history::load_history(&state).await.unwrap();
    let first = element::add_element(&state, button(0.0)).await.unwrap();
    history::commit_snapshot(&state).await.unwrap();
    element::add_element(&state, button(120.0)).await.unwrap();
    history::commit_snapshot(&state).await.unwrap();

    history::undo(&state).await;
    assert!(history::can_redo(&state).await);
    element::update_element(&state, &first.id, &PartialElement::moved_to(50.0, 50.0))
        .await
        .unwrap();
    history::commit_snapshot(&state).await.unwrap();

    assert!(!history::can_redo(&state).await);
    // baseline, first add, move; the truncated snapshot is gone remotely too
    assert_eq!(backend.rows(Collection::History).len(), 3);
}

#[tokio::test]
async fn responsive_overrides_cascade_to_narrower_viewports() {
    let (state, _backend) = signed_in_state();
    let heading = element::add_element(
        &state,
        ElementDraft::new(
            "heading",
            json!({"style": {"fontSize": "32px"}, "responsive": {"desktop": {"fontSize": "24px"}}}),
            Position::new(0.0, 0.0, 400.0, 60.0),
        ),
    )
    .await
    .unwrap();

    let style_at = |el: &Element, vp| effective_style(&el.properties, vp).get("fontSize").cloned();
    assert_eq!(style_at(&heading, Viewport::Mobile), Some(json!("24px")));

    state
        .mutate_store(|store| store.set_responsive_override(&heading.id, Viewport::Tablet, "fontSize", json!("18px")))
        .await;
    let heading = element::find_element(&state, &heading.id).await.unwrap();
    assert_eq!(style_at(&heading, Viewport::Mobile), Some(json!("18px")));
    assert_eq!(style_at(&heading, Viewport::Tablet), Some(json!("18px")));
    assert_eq!(style_at(&heading, Viewport::Desktop), Some(json!("24px")));
}

#[tokio::test]
async fn copy_then_paste_offsets_the_clone() {
    let (state, _backend) = signed_in_state();
    let original = element::add_element(&state, button(0.0)).await.unwrap();
    element::select_element(&state, &original.id).await;

    clipboard::copy_selected(&state).await.unwrap();
    let pasted = clipboard::paste(&state).await.unwrap();

    assert_ne!(pasted.id, original.id);
    assert_eq!(pasted.position, Position::new(20.0, 20.0, 100.0, 40.0));
    assert_eq!(pasted.props().content(), "Click");
    assert_eq!(ids(&element::elements(&state).await), vec![original.id, pasted.id]);
}

#[tokio::test]
async fn toggle_flips_only_the_target_viewport() {
    let (state, _backend) = signed_in_state();
    let panel = element::add_element(&state, button(0.0)).await.unwrap();
    let trigger = element::add_element(
        &state,
        with_click("button", json!({"action": "toggle", "targetElementId": panel.id, "targetViewport": "mobile"})),
    )
    .await
    .unwrap();
    let executor = ActionExecutor::new(state.clone(), Arc::new(HeadlessNavigator));

    let mut seen = Vec::new();
    for _ in 0..2 {
        executor.execute(&trigger.id, ActionKind::Toggle).await;
        seen.push(visible_at(&state, &panel.id, Viewport::Mobile).await);
    }
    assert_eq!(seen, vec![false, true]);
    assert!(visible_at(&state, &panel.id, Viewport::Desktop).await);
    assert!(visible_at(&state, &panel.id, Viewport::Tablet).await);
}

#[tokio::test(start_paused = true)]
async fn chain_steps_run_on_their_own_delays() {
    let (state, _backend) = signed_in_state();
    let first_panel = element::add_element(&state, button(0.0)).await.unwrap();
    let second_panel = element::add_element(&state, button(120.0)).await.unwrap();
    let first = element::add_element(
        &state,
        with_click("button", json!({"action": "toggle", "targetElementId": first_panel.id})),
    )
    .await
    .unwrap();
    let second = element::add_element(
        &state,
        with_click("button", json!({"action": "toggle", "targetElementId": second_panel.id})),
    )
    .await
    .unwrap();
    let trigger = element::add_element(
        &state,
        with_click(
            "button",
            json!({"action": "chain", "chainedActions": [
                {"action": "toggle", "targetElementId": first.id, "delay": 0},
                {"action": "toggle", "targetElementId": second.id, "delay": 500}
            ]}),
        ),
    )
    .await
    .unwrap();

    let executor = ActionExecutor::new(state.clone(), Arc::new(HeadlessNavigator));
    assert_eq!(executor.execute(&trigger.id, ActionKind::Chain).await, ActionOutcome::Chained { scheduled: 2 });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!visible_at(&state, &first_panel.id, Viewport::Desktop).await);
    assert!(visible_at(&state, &second_panel.id, Viewport::Desktop).await);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!visible_at(&state, &second_panel.id, Viewport::Desktop).await);
}
