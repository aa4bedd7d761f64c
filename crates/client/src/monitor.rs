// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background refresh loop: proactive refresh while a session is active.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{RefreshOutcome, SessionManager};

/// Handle to a running refresh loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct RefreshLoop {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the loop and wait for the task to exit.
    pub async fn join(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(err = %e, "refresh loop task failed");
            }
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the loop. It idles until the session is authenticated, then checks
/// expiry every `period` (first check one period in) until logout, when it
/// goes back to idling. Exits when `shutdown` is cancelled.
pub fn spawn_refresh_loop(
    manager: Arc<SessionManager>,
    period: Duration,
    shutdown: CancellationToken,
) -> RefreshLoop {
    let cancel = shutdown.child_token();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        let mut authenticated = manager.store().subscribe();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                ok = wait_until(&mut authenticated, true) => if !ok { break },
            }
            tracing::debug!(
                period_ms = period.as_millis() as u64,
                "session active, polling expiry"
            );

            let start = tokio::time::Instant::now() + period;
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    ok = wait_until(&mut authenticated, false) => {
                        if !ok {
                            return;
                        }
                        tracing::debug!("session ended, refresh loop idle");
                        break;
                    }
                    _ = timer.tick() => {}
                }

                match manager.refresh_if_needed().await {
                    RefreshOutcome::Fresh | RefreshOutcome::NotAuthenticated => {}
                    RefreshOutcome::Refreshed => tracing::debug!("proactive refresh succeeded"),
                    RefreshOutcome::Failed => {
                        tracing::warn!("proactive refresh failed, session cleared")
                    }
                }
            }
        }
        tracing::debug!("refresh loop stopped");
    });

    RefreshLoop { cancel, handle: Some(handle) }
}

/// Wait for the authenticated flag to equal `want`. False if the store is gone.
async fn wait_until(rx: &mut watch::Receiver<bool>, want: bool) -> bool {
    rx.wait_for(|authenticated| *authenticated == want).await.is_ok()
}
