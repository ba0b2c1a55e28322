//! State engine for a visual website builder.
//!
//! The engine owns everything between the editor UI and the remote
//! persistence service: the element model of a page, debounced undo/redo
//! history mirrored to a remote log, a process-wide clipboard, responsive
//! and interactive style resolution, and click-triggered element actions.
//! Hosts drive it through the async services and render from the resolved
//! descriptors; every expected failure comes back as a [`notice::Notice`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`doc`] | Element types and the in-memory element store |
//! | [`responsive`] | Viewport fallback chain and per-viewport style cascade |
//! | [`interaction`] | Parsed hover, animation and click descriptors |
//! | [`style`] | Pure hover/animation style resolution |
//! | [`clipboard`] | Single-slot element clipboard |
//! | [`history`] | Linear snapshot log with an undo/redo cursor |
//! | [`shortcuts`] | Key combo to builder command mapping |
//! | [`backend`] | Remote record store trait, HTTP and in-memory implementations |
//! | [`session`] | Signed-in session tracking |
//! | [`state`] | Injected per-page context shared by all services |
//! | [`services`] | Element, clipboard, history, action, section, design and deploy services |
//! | [`config`] | Environment-driven configuration |
//! | [`notice`] | Error codes and user-facing notices |
//! | [`consts`] | Shared constants (offsets, caps, default durations) |

pub mod backend;
pub mod clipboard;
pub mod config;
pub mod consts;
pub mod doc;
pub mod history;
pub mod interaction;
pub mod notice;
pub mod responsive;
pub mod services;
pub mod session;
pub mod shortcuts;
pub mod state;
pub mod style;
