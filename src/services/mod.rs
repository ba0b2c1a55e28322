//! Builder services over the shared page state.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and remote persistence so hosts (the
//! CLI, an embedding UI) only translate input events into service calls and
//! errors into notices.

pub mod action;
pub mod clipboard;
pub mod deploy;
pub mod design;
pub mod element;
pub mod history;
pub mod persistence;
pub mod section;
pub mod shortcut;
