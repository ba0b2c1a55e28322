//! Signed-in session tracking.
//!
//! The remote service owns authentication; the engine only needs to know
//! whether someone is signed in, who, and with which access token. Sign-in
//! and sign-out events update a watch channel so long-lived tasks can react.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    /// Bearer token for the remote service.
    pub access_token: String,
}

/// Session events emitted by the remote auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Shared, cloneable view of the current session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl SessionHandle {
    #[must_use]
    pub fn signed_out() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        let (tx, _rx) = watch::channel(Some(session));
        Self { tx: Arc::new(tx) }
    }

    pub fn apply(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                info!(user_id = %session.user_id, "session signed in");
                self.tx.send_replace(Some(session));
            }
            AuthEvent::SignedOut => {
                info!("session signed out");
                self.tx.send_replace(None);
            }
        }
    }

    pub fn sign_in(&self, session: Session) {
        self.apply(AuthEvent::SignedIn(session));
    }

    pub fn sign_out(&self) {
        self.apply(AuthEvent::SignedOut);
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Receiver that wakes on every sign-in and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
