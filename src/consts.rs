//! Shared constants for the builder engine.

// ── Placement ───────────────────────────────────────────────────

/// Offset applied to duplicated and pasted elements, in canvas pixels.
/// Applied to both axes so the copy never sits exactly on its source.
pub const DUPLICATE_OFFSET: f64 = 20.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum undo depth per page. The log keeps one snapshot more than this
/// (the state the oldest step returns to), locally and remotely.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Quiet interval after the last mutation before a snapshot is written.
pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 2000;

// ── Interactions ────────────────────────────────────────────────

/// Hover transition used when `transitionDuration` is absent.
pub const DEFAULT_HOVER_TRANSITION_MS: f64 = 200.0;

/// Animation duration used when `duration` is absent.
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 500.0;

// ── Remote service ──────────────────────────────────────────────

/// Name of the server-side function that fronts the deployment platform.
pub const DEFAULT_DEPLOY_FUNCTION: &str = "vercel";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
