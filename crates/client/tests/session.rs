// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login, registration, persistence across restarts and the refresh loop.

mod support;

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use versory::config::{ClientConfig, RefreshPolicy};
use versory::error::{ApiError, ErrorCode};
use versory::monitor::spawn_refresh_loop;

use support::{harness, spawn_mock_api, EMAIL, PASSWORD};

#[tokio::test]
async fn login_authenticates_and_stores_user() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let user = h.manager().login(&h.api, EMAIL, PASSWORD).await?;

    assert_eq!(user.map(|u| u.username), Some("ana".to_owned()));
    assert!(h.manager().is_authenticated().await);
    assert_eq!(h.manager().user().await.map(|u| u.username), Some("ana".to_owned()));
    let sent = serde_json::json!({ "email": EMAIL, "password": PASSWORD });
    assert_eq!(h.state().last_body(), Some(sent));

    let stored = h.backend.stored().ok_or_else(|| anyhow::anyhow!("nothing persisted"))?;
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    Ok(())
}

#[tokio::test]
async fn login_accepts_spread_user_fields() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    h.state().spread_login.store(true, Ordering::SeqCst);

    let user = h.manager().login(&h.api, EMAIL, PASSWORD).await?;
    assert_eq!(user.map(|u| (u.id, u.username)), Some((1, "ana".to_owned())));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let err = h
        .manager()
        .login(&h.api, EMAIL, "nope")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

    assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    assert_eq!(err.user_message(), "No active account found with the given credentials");
    assert!(!h.manager().is_authenticated().await);
    assert_eq!(h.state().refresh_count(), 0);
    Ok(())
}

#[tokio::test]
async fn wrong_password_keeps_existing_session() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let access = h.sign_in_with_expiry(3600).await;
    // A refresh would fail and clear the session if one were attempted.
    h.state().refresh_fails.store(true, Ordering::SeqCst);

    let err = h
        .manager()
        .login(&h.api, EMAIL, "nope")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

    assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    assert_eq!(h.state().refresh_count(), 0);
    assert!(h.manager().is_authenticated().await);
    assert_eq!(h.manager().access_token().await, Some(access));
    let sent = h.state().credential_auth.lock().expect("auth lock").clone();
    assert_eq!(sent, vec![None]);
    Ok(())
}

#[tokio::test]
async fn register_sends_no_bearer() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    h.sign_in_with_expiry(3600).await;
    h.manager().register(&h.api, "beto", "beto@example.com", "pw").await?;

    let sent = h.state().credential_auth.lock().expect("auth lock").clone();
    assert_eq!(sent, vec![None]);
    assert_eq!(h.state().refresh_count(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_credentials_never_reach_the_server() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let result = h.manager().login(&h.api, "  ", PASSWORD).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(h.state().last_body().is_none());
    Ok(())
}

#[tokio::test]
async fn register_signs_in_new_user() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let user = h.manager().register(&h.api, "beto", "beto@example.com", "pw").await?;

    let user = user.ok_or_else(|| anyhow::anyhow!("missing user"))?;
    assert_eq!((user.id, user.username.as_str()), (2, "beto"));
    assert!(h.manager().is_authenticated().await);
    Ok(())
}

#[tokio::test]
async fn register_surfaces_field_errors() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let err = h
        .manager()
        .register(&h.api, "ana", EMAIL, "pw")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(err.user_message(), "Este email ya está registrado.");
    Ok(())
}

#[tokio::test]
async fn sealed_session_survives_restart() -> anyhow::Result<()> {
    let mock = spawn_mock_api().await;
    let dir = tempfile::tempdir()?;
    let mut config = ClientConfig::new(mock.base_url());
    config.state_dir = Some(dir.path().to_path_buf());

    let api = versory::connect(&config).await?;
    assert!(!api.session().is_authenticated().await);
    api.session().login(&api, EMAIL, PASSWORD).await?;
    drop(api);

    let api = versory::connect(&config).await?;
    assert!(api.session().is_authenticated().await);
    assert_eq!(api.session().user().await.map(|u| u.username), Some("ana".to_owned()));
    assert_eq!(api.library().await?.len(), 2);
    assert_eq!(mock.state.refresh_count(), 0);

    api.session().logout().await;
    assert!(!dir.path().join("session.bin").exists());
    let api = versory::connect(&config).await?;
    assert!(!api.session().is_authenticated().await);
    Ok(())
}

#[tokio::test]
async fn ephemeral_sessions_are_not_written() -> anyhow::Result<()> {
    let mock = spawn_mock_api().await;
    let dir = tempfile::tempdir()?;
    let mut config = ClientConfig::new(mock.base_url());
    config.state_dir = Some(dir.path().to_path_buf());
    config.ephemeral = true;

    let api = versory::connect(&config).await?;
    api.session().login(&api, EMAIL, PASSWORD).await?;
    assert!(std::fs::read_dir(dir.path())?.next().is_none());
    Ok(())
}

#[tokio::test]
async fn loop_tick_refreshes_token_expiring_within_threshold() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let before = h.sign_in_with_expiry(30).await;

    let shutdown = CancellationToken::new();
    let refresh_loop =
        spawn_refresh_loop(h.manager().clone(), Duration::from_millis(100), shutdown.clone());
    tokio::time::sleep(Duration::from_millis(450)).await;

    // First tick refreshes; later ticks see a fresh token.
    assert_eq!(h.state().refresh_count(), 1);
    assert_ne!(h.manager().access_token().await, Some(before));

    shutdown.cancel();
    refresh_loop.join().await;
    Ok(())
}

#[tokio::test]
async fn loop_leaves_fresh_tokens_alone() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    h.sign_in_with_expiry(3600).await;

    let period = Duration::from_millis(50);
    let refresh_loop = spawn_refresh_loop(h.manager().clone(), period, CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(h.state().refresh_count(), 0);
    refresh_loop.join().await;
    Ok(())
}

#[tokio::test]
async fn loop_idles_until_login_and_after_logout() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    let shutdown = CancellationToken::new();
    let refresh_loop =
        spawn_refresh_loop(h.manager().clone(), Duration::from_millis(50), shutdown.clone());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.state().refresh_count(), 0);

    // Expiring token: the loop wakes up and refreshes it.
    h.sign_in_with_expiry(10).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(h.state().refresh_count(), 1);

    // After logout nothing is refreshed, even with the server failing.
    h.manager().logout().await;
    h.state().refresh_fails.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.state().refresh_count(), 1);
    assert!(!refresh_loop.is_finished());

    shutdown.cancel();
    refresh_loop.join().await;
    Ok(())
}

#[tokio::test]
async fn failed_proactive_refresh_clears_session() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    h.sign_in_with_expiry(10).await;
    h.state().refresh_fails.store(true, Ordering::SeqCst);

    let period = Duration::from_millis(50);
    let refresh_loop = spawn_refresh_loop(h.manager().clone(), period, CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(h.state().refresh_count(), 1);
    assert!(!h.manager().is_authenticated().await);
    refresh_loop.join().await;
    Ok(())
}

#[tokio::test]
async fn dropping_the_handle_stops_the_loop() -> anyhow::Result<()> {
    let h = harness(RefreshPolicy::SingleFlight).await;
    h.sign_in_with_expiry(3600).await;

    let period = Duration::from_millis(50);
    let refresh_loop = spawn_refresh_loop(h.manager().clone(), period, CancellationToken::new());
    drop(refresh_loop);

    // Expiring token after the drop: no tick may pick it up.
    h.sign_in_with_expiry(10).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.state().refresh_count(), 0);
    Ok(())
}
