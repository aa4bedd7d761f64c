// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `watch`: run the background refresh loop until Ctrl-C.

use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::monitor;

pub async fn run(api: &ApiClient, period: Duration) -> anyhow::Result<Value> {
    if !api.session().is_authenticated().await {
        anyhow::bail!("not signed in; run `versory login` first");
    }

    let shutdown = CancellationToken::new();
    let refresh_loop =
        monitor::spawn_refresh_loop(api.session().clone(), period, shutdown.clone());
    tracing::info!(period_ms = period.as_millis() as u64, "watching session");

    tokio::signal::ctrl_c().await?;
    shutdown.cancel();
    refresh_loop.join().await;

    Ok(json!({ "authenticated": api.session().is_authenticated().await }))
}
