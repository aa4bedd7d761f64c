// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session store: the access/refresh token pair plus user identity.
//!
//! State lives behind a single `RwLock`. Every mutation persists through the
//! configured [`SessionBackend`] while still holding the write lock, so the
//! persisted order always matches the in-memory order. Persistence failures
//! are logged and swallowed; memory is authoritative.

pub mod persist;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};

use crate::model::User;

pub use persist::{MemoryBackend, SealedFileBackend, SessionBackend, SessionKey};

/// Current credentials and identity.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Shared, persisted session state.
pub struct SessionStore {
    state: RwLock<Session>,
    backend: Arc<dyn SessionBackend>,
    authenticated: watch::Sender<bool>,
}

impl SessionStore {
    /// Empty store persisting through `backend`. Call [`restore`](Self::restore)
    /// to load a previously saved session.
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        let (authenticated, _) = watch::channel(false);
        Self { state: RwLock::new(Session::default()), backend, authenticated }
    }

    /// Empty store that never touches disk.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Load the persisted session, replacing in-memory state.
    ///
    /// Returns whether an authenticated session was restored. A missing or
    /// unreadable record leaves the store empty.
    pub async fn restore(&self) -> bool {
        let mut state = self.state.write().await;
        match self.backend.load() {
            Ok(Some(session)) => {
                *state = session;
                tracing::info!(
                    authenticated = state.is_authenticated(),
                    user = state.user.as_ref().map(|u| u.username.as_str()),
                    "session restored"
                );
            }
            Ok(None) => {
                tracing::debug!("no persisted session");
                *state = Session::default();
            }
            Err(e) => {
                tracing::warn!(err = %e, "failed to restore session, starting empty");
                *state = Session::default();
            }
        }
        let authenticated = state.is_authenticated();
        self.publish(authenticated);
        authenticated
    }

    /// Replace both tokens together.
    pub async fn set_tokens(&self, access: String, refresh: String) {
        let mut state = self.state.write().await;
        state.access_token = Some(access);
        state.refresh_token = Some(refresh);
        self.persist(&state);
        self.publish(true);
    }

    pub async fn set_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.user = Some(user);
        self.persist(&state);
    }

    /// Clear tokens and user in one step and delete the persisted record.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        let was_authenticated = state.is_authenticated();
        *state = Session::default();
        self.persist(&state);
        self.publish(false);
        if was_authenticated {
            tracing::info!("session cleared");
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.refresh_token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Watch the authenticated flag. Receivers wake only when it flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    fn persist(&self, session: &Session) {
        let result =
            if session.is_empty() { self.backend.clear() } else { self.backend.save(session) };
        if let Err(e) = result {
            tracing::warn!(err = %e, "failed to persist session");
        }
    }

    fn publish(&self, authenticated: bool) {
        self.authenticated.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &*self.authenticated.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
