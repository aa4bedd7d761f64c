// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod library;
pub mod model;
pub mod monitor;
pub mod refresh;
pub mod session;
pub mod shelf;
pub mod test_support;
pub mod token;

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::session::{SealedFileBackend, SessionBackend, SessionStore};

/// Build the session stack from `config` and restore any persisted session.
pub async fn connect(config: &ClientConfig) -> anyhow::Result<ApiClient> {
    config.validate()?;

    let backend: Arc<dyn SessionBackend> = if config.ephemeral {
        Arc::new(session::MemoryBackend::default())
    } else {
        let dir = config.state_dir();
        Arc::new(SealedFileBackend::open(&dir, config.session_key.as_deref())?)
    };
    let store = Arc::new(SessionStore::new(backend));
    store.restore().await;

    let manager = Arc::new(SessionManager::from_config(config, store));
    Ok(ApiClient::from_config(config, manager))
}
