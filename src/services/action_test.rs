use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::doc::{Element, Position};
use crate::history::HistoryStatus;
use crate::responsive::is_visible;
use crate::state::test_helpers::test_builder_state;

// =========================================================================
// RecordingNavigator
// =========================================================================

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<(String, LinkTarget)>>,
    known_ids: Vec<&'static str>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str, target: LinkTarget) {
        self.visits.lock().unwrap().push((url.to_string(), target));
    }

    fn scroll_into_view(&self, dom_id: &str) -> bool {
        self.known_ids.iter().any(|id| *id == dom_id)
    }
}

impl RecordingNavigator {
    fn urls(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

fn element(id: &str, properties: serde_json::Value) -> Element {
    Element { id: id.into(), kind: "button".into(), properties, position: Position::default() }
}

async fn executor_with(elements: Vec<Element>) -> (ActionExecutor, Arc<RecordingNavigator>) {
    let (state, _backend) = test_builder_state();
    state.page.write().await.store.replace_all(elements);
    let navigator = Arc::new(RecordingNavigator { known_ids: vec!["pricing"], ..RecordingNavigator::default() });
    let executor = ActionExecutor::new(state, Arc::clone(&navigator) as Arc<dyn Navigator>);
    (executor, navigator)
}

async fn visible(executor: &ActionExecutor, id: &str, viewport: Viewport) -> bool {
    let page = executor.state.page.read().await;
    is_visible(&page.store.find(id).unwrap().properties, viewport)
}

// =========================================================================
// guards
// =========================================================================

#[tokio::test]
async fn missing_element_is_skipped() {
    let (executor, _nav) = executor_with(vec![]).await;
    assert_eq!(
        executor.execute("ghost", ActionKind::Link).await,
        ActionOutcome::Skipped { reason: SkipReason::ElementMissing }
    );
}

#[tokio::test]
async fn mismatched_action_is_skipped() {
    let (executor, nav) = executor_with(vec![element(
        "A",
        json!({"interactions": {"onClick": {"action": "link", "url": "https://example.com"}}}),
    )])
    .await;
    assert_eq!(
        executor.execute("A", ActionKind::Scroll).await,
        ActionOutcome::Skipped { reason: SkipReason::ActionMismatch }
    );
    assert!(nav.urls().is_empty());
}

#[tokio::test]
async fn element_without_on_click_is_skipped() {
    let (executor, _nav) = executor_with(vec![element("A", json!({}))]).await;
    assert_eq!(executor.execute("A", ActionKind::None).await, ActionOutcome::Skipped { reason: SkipReason::NoAction });
}

#[tokio::test]
async fn unknown_action_tag_behaves_as_none() {
    let (executor, nav) =
        executor_with(vec![element("A", json!({"interactions": {"onClick": {"action": "teleport"}}}))]).await;
    assert_eq!(executor.execute("A", ActionKind::None).await, ActionOutcome::Skipped { reason: SkipReason::NoAction });
    assert!(nav.urls().is_empty());
}

// =========================================================================
// link / scroll
// =========================================================================

#[tokio::test]
async fn link_opens_new_context_when_asked() {
    let (executor, nav) = executor_with(vec![element(
        "A",
        json!({"interactions": {"onClick": {"action": "link", "url": "https://example.com", "newTab": true}}}),
    )])
    .await;
    let outcome = executor.execute("A", ActionKind::Link).await;
    assert_eq!(outcome, ActionOutcome::Navigated { url: "https://example.com".into(), target: LinkTarget::NewContext });
    assert_eq!(nav.visits.lock().unwrap()[0].1, LinkTarget::NewContext);
}

#[tokio::test]
async fn link_without_url_is_skipped() {
    let (executor, nav) =
        executor_with(vec![element("A", json!({"interactions": {"onClick": {"action": "link"}}}))]).await;
    assert_eq!(
        executor.execute("A", ActionKind::Link).await,
        ActionOutcome::Skipped { reason: SkipReason::MissingParameter("url") }
    );
    assert!(nav.urls().is_empty());
}

#[tokio::test]
async fn scroll_to_known_and_unknown_targets() {
    let (executor, _nav) = executor_with(vec![
        element("A", json!({"interactions": {"onClick": {"action": "scroll", "targetId": "pricing"}}})),
        element("B", json!({"interactions": {"onClick": {"action": "scroll", "targetId": "nowhere"}}})),
    ])
    .await;
    assert_eq!(executor.execute("A", ActionKind::Scroll).await, ActionOutcome::Scrolled { target_id: "pricing".into() });
    assert_eq!(
        executor.execute("B", ActionKind::Scroll).await,
        ActionOutcome::Skipped { reason: SkipReason::TargetMissing }
    );
}

// =========================================================================
// toggle
// =========================================================================

#[tokio::test]
async fn toggle_twice_at_mobile_round_trips() {
    let (executor, _nav) = executor_with(vec![
        element(
            "B",
            json!({"interactions": {"onClick": {"action": "toggle", "targetElementId": "X", "targetViewport": "mobile"}}}),
        ),
        element("X", json!({"content": "menu"})),
    ])
    .await;

    let first = executor.execute("B", ActionKind::Toggle).await;
    assert_eq!(first, ActionOutcome::Toggled { element_id: "X".into(), viewport: Viewport::Mobile, visible: false });
    assert!(!visible(&executor, "X", Viewport::Mobile).await);
    assert!(visible(&executor, "X", Viewport::Desktop).await);
    assert!(visible(&executor, "X", Viewport::Tablet).await);

    executor.execute("B", ActionKind::Toggle).await;
    assert!(visible(&executor, "X", Viewport::Mobile).await);
    assert!(visible(&executor, "X", Viewport::Desktop).await);
    assert!(visible(&executor, "X", Viewport::Tablet).await);
    assert_eq!(executor.state.status().await, HistoryStatus::Dirty);
}

#[tokio::test]
async fn toggle_defaults_to_desktop_and_reads_inherited_value() {
    let (executor, _nav) = executor_with(vec![
        element("B", json!({"interactions": {"onClick": {"action": "toggle", "targetElementId": "X"}}})),
        element("X", json!({})),
    ])
    .await;
    executor.execute("B", ActionKind::Toggle).await;
    assert!(!visible(&executor, "X", Viewport::Desktop).await);
    // Mobile inherits the desktop override.
    assert!(!visible(&executor, "X", Viewport::Mobile).await);
}

#[tokio::test]
async fn toggle_missing_target_is_skipped() {
    let (executor, _nav) = executor_with(vec![element(
        "B",
        json!({"interactions": {"onClick": {"action": "toggle", "targetElementId": "ghost"}}}),
    )])
    .await;
    assert_eq!(
        executor.execute("B", ActionKind::Toggle).await,
        ActionOutcome::Skipped { reason: SkipReason::TargetMissing }
    );
    assert_eq!(executor.state.status().await, HistoryStatus::Idle);
}

// =========================================================================
// chain
// =========================================================================

#[tokio::test(start_paused = true)]
async fn chain_runs_each_step_after_its_own_delay() {
    let (executor, nav) = executor_with(vec![
        element(
            "C",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "toggle", "targetElementId": "A", "delay": 0},
                {"action": "link", "targetElementId": "B", "delay": 500}
            ]}}}),
        ),
        element("A", json!({"interactions": {"onClick": {"action": "toggle", "targetElementId": "X"}}})),
        element("B", json!({"interactions": {"onClick": {"action": "link", "url": "https://b.test"}}})),
        element("X", json!({})),
    ])
    .await;

    assert_eq!(executor.execute("C", ActionKind::Chain).await, ActionOutcome::Chained { scheduled: 2 });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!visible(&executor, "X", Viewport::Desktop).await);
    assert!(nav.urls().is_empty());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(nav.urls(), vec!["https://b.test".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn chain_delays_are_measured_from_the_trigger() {
    let (executor, nav) = executor_with(vec![
        element(
            "C",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "link", "targetElementId": "A", "delay": 500},
                {"action": "link", "targetElementId": "B", "delay": 500}
            ]}}}),
        ),
        element("A", json!({"interactions": {"onClick": {"action": "link", "url": "https://a.test"}}})),
        element("B", json!({"interactions": {"onClick": {"action": "link", "url": "https://b.test"}}})),
    ])
    .await;

    executor.execute("C", ActionKind::Chain).await;
    tokio::time::sleep(Duration::from_millis(510)).await;
    let mut urls = nav.urls();
    urls.sort();
    assert_eq!(urls, vec!["https://a.test".to_string(), "https://b.test".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn chain_steps_with_mismatched_actions_do_nothing() {
    let (executor, nav) = executor_with(vec![
        element(
            "C",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "scroll", "targetElementId": "A"}
            ]}}}),
        ),
        element("A", json!({"interactions": {"onClick": {"action": "link", "url": "https://a.test"}}})),
    ])
    .await;
    executor.execute("C", ActionKind::Chain).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(nav.urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn chain_step_targeting_its_own_chain_is_dropped() {
    let (executor, nav) = executor_with(vec![
        element(
            "C",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "chain", "targetElementId": "C", "delay": 100},
                {"action": "link", "targetElementId": "B", "delay": 0}
            ]}}}),
        ),
        element("B", json!({"interactions": {"onClick": {"action": "link", "url": "https://b.test"}}})),
    ])
    .await;

    assert_eq!(executor.execute("C", ActionKind::Chain).await, ActionOutcome::Chained { scheduled: 1 });
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(nav.urls(), vec!["https://b.test".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn mutually_referencing_chains_fire_once_each() {
    let (executor, nav) = executor_with(vec![
        element(
            "C1",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "chain", "targetElementId": "C2", "delay": 100}
            ]}}}),
        ),
        element(
            "C2",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "chain", "targetElementId": "C1", "delay": 100},
                {"action": "link", "targetElementId": "B", "delay": 100}
            ]}}}),
        ),
        element("B", json!({"interactions": {"onClick": {"action": "link", "url": "https://b.test"}}})),
    ])
    .await;

    executor.execute("C1", ActionKind::Chain).await;
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(nav.urls(), vec!["https://b.test".to_string()]);
}

#[tokio::test]
async fn chain_span_includes_nested_chains() {
    let (executor, _nav) = executor_with(vec![
        element(
            "C1",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "chain", "targetElementId": "C2", "delay": 200},
                {"action": "link", "targetElementId": "B", "delay": 300}
            ]}}}),
        ),
        element(
            "C2",
            json!({"interactions": {"onClick": {"action": "chain", "chainedActions": [
                {"action": "link", "targetElementId": "B", "delay": 400},
                {"action": "chain", "targetElementId": "C1", "delay": 5_000}
            ]}}}),
        ),
        element("B", json!({"interactions": {"onClick": {"action": "link", "url": "https://b.test"}}})),
    ])
    .await;

    assert_eq!(executor.chain_span("C1").await, Duration::from_millis(600));
    assert_eq!(executor.chain_span("B").await, Duration::ZERO);
    assert_eq!(executor.chain_span("missing").await, Duration::ZERO);
}
