//! Action executor: click-triggered element behavior.
//!
//! DESIGN
//! ======
//! The executor reads the clicked element's `onClick` descriptor and runs it
//! only when its action matches the requested one. Host effects (navigation,
//! scrolling) go through a [`Navigator`] so the engine stays headless. The
//! toggle action is the only one that writes, and it writes through the
//! store contract so the edit lands in history like any other.
//!
//! Chain steps are spawned independently, each delayed from the trigger
//! instant rather than from the previous step. Each step carries the trail
//! of chain elements that led to it; a chain step pointing back into its own
//! trail is dropped, so cyclic chains terminate. Every miss (unknown
//! element, mismatched action, missing parameter) is a silent
//! [`ActionOutcome::Skipped`].

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::doc::{ElementId, ElementStore};
use crate::interaction::{ActionKind, ChainedAction, Interactions, OnClick};
use crate::responsive::{VISIBLE_KEY, Viewport};
use crate::state::BuilderState;

/// Where a link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    SameContext,
    NewContext,
}

/// Host-side effects of actions.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str, target: LinkTarget);

    /// Smoothly scroll the DOM node with `dom_id` into view. Returns false
    /// when no such node exists.
    fn scroll_into_view(&self, dom_id: &str) -> bool;
}

/// Navigator for hosts without a document: effects are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessNavigator;

impl Navigator for HeadlessNavigator {
    fn navigate(&self, url: &str, target: LinkTarget) {
        info!(url, ?target, "navigate");
    }

    fn scroll_into_view(&self, dom_id: &str) -> bool {
        info!(dom_id, "scroll into view");
        true
    }
}

/// Why an action did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ElementMissing,
    ActionMismatch,
    NoAction,
    MissingParameter(&'static str),
    TargetMissing,
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Navigated { url: String, target: LinkTarget },
    Scrolled { target_id: String },
    Toggled { element_id: ElementId, viewport: Viewport, visible: bool },
    Chained { scheduled: usize },
    Skipped { reason: SkipReason },
}

impl ActionOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

#[derive(Clone)]
pub struct ActionExecutor {
    state: BuilderState,
    navigator: Arc<dyn Navigator>,
}

impl ActionExecutor {
    #[must_use]
    pub fn new(state: BuilderState, navigator: Arc<dyn Navigator>) -> Self {
        Self { state, navigator }
    }

    /// Run `action` for `element_id` if its `onClick` descriptor asks for it.
    pub async fn execute(&self, element_id: &str, action: ActionKind) -> ActionOutcome {
        self.execute_within(element_id, action, Vec::new()).await
    }

    /// How long after triggering `element_id` its chain (nested chains
    /// included) keeps firing steps. Zero for anything but a chain.
    pub async fn chain_span(&self, element_id: &str) -> Duration {
        let page = self.state.page.read().await;
        Duration::from_millis(chain_span_ms(&page.store, element_id, &mut Vec::new()))
    }

    async fn execute_within(&self, element_id: &str, action: ActionKind, trail: Vec<ElementId>) -> ActionOutcome {
        let on_click = {
            let page = self.state.page.read().await;
            let Some(element) = page.store.find(element_id) else {
                return ActionOutcome::skipped(SkipReason::ElementMissing);
            };
            Interactions::from_properties(&element.properties).on_click
        };
        let Some(on_click) = on_click else {
            return ActionOutcome::skipped(SkipReason::NoAction);
        };
        if on_click.action != action {
            return ActionOutcome::skipped(SkipReason::ActionMismatch);
        }
        debug!(element_id, action = action.as_str(), "execute action");

        match action {
            ActionKind::Link => self.link(&on_click),
            ActionKind::Scroll => self.scroll(&on_click),
            ActionKind::Toggle => self.toggle(&on_click).await,
            ActionKind::Chain => self.chain(element_id, &on_click, trail),
            ActionKind::None => ActionOutcome::skipped(SkipReason::NoAction),
        }
    }

    fn link(&self, on_click: &OnClick) -> ActionOutcome {
        let Some(url) = on_click.url.as_deref().filter(|u| !u.is_empty()) else {
            return ActionOutcome::skipped(SkipReason::MissingParameter("url"));
        };
        let target = if on_click.new_tab { LinkTarget::NewContext } else { LinkTarget::SameContext };
        self.navigator.navigate(url, target);
        ActionOutcome::Navigated { url: url.to_string(), target }
    }

    fn scroll(&self, on_click: &OnClick) -> ActionOutcome {
        let Some(target_id) = on_click.target_id.as_deref() else {
            return ActionOutcome::skipped(SkipReason::MissingParameter("targetId"));
        };
        if self.navigator.scroll_into_view(target_id) {
            ActionOutcome::Scrolled { target_id: target_id.to_string() }
        } else {
            ActionOutcome::skipped(SkipReason::TargetMissing)
        }
    }

    /// Flip the target's visibility at one viewport. The current value is
    /// read through the fallback chain; only that viewport's override is
    /// written.
    async fn toggle(&self, on_click: &OnClick) -> ActionOutcome {
        let Some(target) = on_click.target_element_id.as_deref() else {
            return ActionOutcome::skipped(SkipReason::MissingParameter("targetElementId"));
        };
        let viewport = on_click.target_viewport.unwrap_or_default();
        let flipped = self
            .state
            .mutate_store(|store| {
                let visible = !store.find(target)?.props().visible_at(viewport);
                store.set_responsive_override(target, viewport, VISIBLE_KEY, Value::Bool(visible));
                Some(visible)
            })
            .await;
        match flipped {
            Some(visible) => ActionOutcome::Toggled { element_id: target.to_string(), viewport, visible },
            None => ActionOutcome::skipped(SkipReason::TargetMissing),
        }
    }

    fn chain(&self, element_id: &str, on_click: &OnClick, mut trail: Vec<ElementId>) -> ActionOutcome {
        trail.push(element_id.to_string());
        let mut scheduled = 0;
        for step in &on_click.chained_actions {
            if re_enters(step, &trail) {
                warn!(element_id, target = %step.target_element_id, "chain step re-enters its own chain; dropped");
                continue;
            }
            let delay = Duration::from_millis(step.delay_ms());
            tokio::spawn(
                self.clone()
                    .run_later(delay, step.target_element_id.clone(), step.action, trail.clone()),
            );
            scheduled += 1;
        }
        ActionOutcome::Chained { scheduled }
    }

    fn run_later(
        self,
        delay: Duration,
        element_id: ElementId,
        action: ActionKind,
        trail: Vec<ElementId>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            let outcome = self.execute_within(&element_id, action, trail).await;
            debug!(%element_id, ?outcome, "chained step finished");
        })
    }
}

fn re_enters(step: &ChainedAction, trail: &[ElementId]) -> bool {
    step.action == ActionKind::Chain && trail.contains(&step.target_element_id)
}

fn chain_span_ms(store: &ElementStore, element_id: &str, trail: &mut Vec<ElementId>) -> u64 {
    let Some(on_click) = store
        .find(element_id)
        .and_then(|el| Interactions::from_properties(&el.properties).on_click)
    else {
        return 0;
    };
    if on_click.action != ActionKind::Chain {
        return 0;
    }
    trail.push(element_id.to_string());
    let mut longest = 0;
    for step in &on_click.chained_actions {
        if re_enters(step, trail) {
            continue;
        }
        let nested = if step.action == ActionKind::Chain {
            chain_span_ms(store, &step.target_element_id, trail)
        } else {
            0
        };
        longest = longest.max(step.delay_ms() + nested);
    }
    trail.pop();
    longest
}
