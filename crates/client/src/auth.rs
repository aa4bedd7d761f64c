// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session manager: the single owner of session state transitions.
//!
//! The request pipeline, the background loop and the CLI all reach the
//! session through [`SessionManager`]. Every refresh, whether triggered by a
//! 401 or by the expiry poll, goes through [`SessionManager::refresh_session`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::client::{ApiClient, ApiRequest};
use crate::config::{ClientConfig, RefreshPolicy};
use crate::error::{ApiError, ErrorCode};
use crate::model::User;
use crate::refresh::RefreshClient;
use crate::session::SessionStore;
use crate::token;

/// Default seconds-before-expiry at which a proactive refresh kicks in.
pub const DEFAULT_EXPIRY_THRESHOLD_SECS: i64 = 300;

/// Result of a proactive expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    NotAuthenticated,
    /// Token is valid beyond the threshold; nothing to do.
    Fresh,
    Refreshed,
    /// Refresh was attempted and failed; the session has been cleared.
    Failed,
}

/// Canonical login/register response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: Option<User>,
}

#[derive(Deserialize)]
struct SpreadUser {
    id: Option<u64>,
    username: Option<String>,
    email: Option<String>,
    #[serde(default)]
    date_joined: Option<String>,
}

impl AuthResponse {
    /// Normalize either `{access, refresh, user: {...}}` or
    /// `{access, refresh, id, username, email}`.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let Value::Object(mut fields) = value else {
            return Err(ApiError::Payload("auth response is not an object".to_owned()));
        };

        let access = take_token(&mut fields, "access")?;
        let refresh = take_token(&mut fields, "refresh")?;

        let user = match fields.remove("user") {
            Some(Value::Null) | None => lift_user(fields)?,
            Some(nested) => Some(
                serde_json::from_value(nested)
                    .map_err(|e| ApiError::Payload(format!("invalid user: {e}")))?,
            ),
        };

        Ok(Self { access, refresh, user })
    }
}

fn take_token(
    fields: &mut serde_json::Map<String, Value>,
    name: &str,
) -> Result<String, ApiError> {
    match fields.remove(name) {
        Some(Value::String(token)) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Payload(format!("auth response has no {name} token"))),
    }
}

fn lift_user(fields: serde_json::Map<String, Value>) -> Result<Option<User>, ApiError> {
    let spread: SpreadUser = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::Payload(format!("invalid user fields: {e}")))?;
    match spread {
        SpreadUser { id: None, username: None, email: None, .. } => Ok(None),
        SpreadUser { id: Some(id), username: Some(username), email: Some(email), date_joined } => {
            Ok(Some(User { id, username, email, date_joined }))
        }
        _ => Err(ApiError::Payload("auth response has partial user fields".to_owned())),
    }
}

/// Owns the session store, the refresh client and refresh policy.
#[derive(Debug)]
pub struct SessionManager {
    store: Arc<SessionStore>,
    refresher: RefreshClient,
    policy: RefreshPolicy,
    expiry_threshold_secs: i64,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<SessionStore>, refresher: RefreshClient, policy: RefreshPolicy) -> Self {
        Self {
            store,
            refresher,
            policy,
            expiry_threshold_secs: DEFAULT_EXPIRY_THRESHOLD_SECS,
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig, store: Arc<SessionStore>) -> Self {
        let refresher = RefreshClient::new(&config.base_url(), config.api_timeout());
        Self::new(store, refresher, config.refresh_policy)
            .with_expiry_threshold(config.expiry_threshold_secs)
    }

    pub fn with_expiry_threshold(mut self, secs: i64) -> Self {
        self.expiry_threshold_secs = secs;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn expiry_threshold_secs(&self) -> i64 {
        self.expiry_threshold_secs
    }

    pub async fn access_token(&self) -> Option<String> {
        self.store.access_token().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    pub async fn user(&self) -> Option<User> {
        self.store.user().await
    }

    pub async fn logout(&self) {
        self.store.logout().await;
    }

    /// Refresh the session after `observed_access` was rejected.
    ///
    /// Returns true when a usable access token is now stored. On failure the
    /// session has been cleared.
    pub async fn refresh_session(&self, observed_access: Option<&str>) -> bool {
        match self.policy {
            RefreshPolicy::Independent => self.exchange().await,
            RefreshPolicy::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                match self.store.access_token().await {
                    Some(current) if Some(current.as_str()) != observed_access => {
                        tracing::debug!("access token already rotated, skipping refresh");
                        return true;
                    }
                    None if observed_access.is_some() => {
                        tracing::debug!("session cleared while waiting to refresh");
                        return false;
                    }
                    _ => {}
                }
                self.exchange().await
            }
        }
    }

    /// Refresh proactively if the access token expires within the threshold.
    pub async fn refresh_if_needed(&self) -> RefreshOutcome {
        let Some(access) = self.store.access_token().await else {
            return RefreshOutcome::NotAuthenticated;
        };
        if !token::is_expiring_soon(&access, self.expiry_threshold_secs) {
            return RefreshOutcome::Fresh;
        }
        tracing::debug!(
            expires_in = token::expires_in(&access),
            threshold = self.expiry_threshold_secs,
            "access token expiring soon"
        );
        if self.refresh_session(Some(&access)).await {
            RefreshOutcome::Refreshed
        } else {
            RefreshOutcome::Failed
        }
    }

    async fn exchange(&self) -> bool {
        let Some(refresh_token) = self.store.refresh_token().await else {
            tracing::info!("no refresh token, clearing session");
            self.store.logout().await;
            return false;
        };
        match self.refresher.refresh(&refresh_token).await {
            Some(tokens) => {
                self.store.set_tokens(tokens.access, tokens.refresh).await;
                tracing::info!("session refreshed");
                true
            }
            None => {
                tracing::info!("refresh failed, clearing session");
                self.store.logout().await;
                false
            }
        }
    }

    /// Authenticate with email and password.
    pub async fn login(
        &self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput("email and password are required".to_owned()));
        }
        let body = serde_json::json!({ "email": email, "password": password });
        let result = api.send_value(ApiRequest::post("/token/", body).anonymous()).await;
        let value = result.map_err(|e| match e {
            ApiError::Status { status: 401, message, body, .. } => {
                ApiError::Status { status: 401, code: ErrorCode::InvalidCredentials, message, body }
            }
            other => other,
        })?;
        self.establish(AuthResponse::from_value(value)?).await
    }

    /// Create an account and sign in with it.
    pub async fn register(
        &self,
        api: &ApiClient,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApiError> {
        let (username, email) = (username.trim(), email.trim());
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput(
                "username, email and password are required".to_owned(),
            ));
        }
        let body =
            serde_json::json!({ "username": username, "email": email, "password": password });
        let value = api.send_value(ApiRequest::post("/register/", body).anonymous()).await?;
        self.establish(AuthResponse::from_value(value)?).await
    }

    async fn establish(&self, auth: AuthResponse) -> Result<Option<User>, ApiError> {
        self.store.set_tokens(auth.access, auth.refresh).await;
        if let Some(ref user) = auth.user {
            self.store.set_user(user.clone()).await;
        }
        tracing::info!(user = auth.user.as_ref().map(|u| u.username.as_str()), "signed in");
        Ok(auth.user)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
