// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh-token exchange over a dedicated HTTP client.
//!
//! This client never goes through the authenticated request pipeline, so a
//! 401 from the refresh endpoint cannot recurse into another refresh.

use std::time::Duration;

use serde::Deserialize;

/// A freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Exchanges refresh tokens at `{base}/token/refresh/`.
#[derive(Debug, Clone)]
pub struct RefreshClient {
    http: reqwest::Client,
    url: String,
}

impl RefreshClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        crate::client::ensure_crypto();
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { http, url: format!("{}/token/refresh/", base_url.trim_end_matches('/')) }
    }

    /// Exchange `refresh_token` for a new pair. Any failure yields `None`.
    ///
    /// Does not touch session state and never retries.
    pub async fn refresh(&self, refresh_token: &str) -> Option<RefreshedTokens> {
        if refresh_token.is_empty() {
            tracing::debug!("no refresh token, skipping exchange");
            return None;
        }

        match self.exchange(refresh_token).await {
            Ok(tokens) => {
                tracing::debug!(rotated = tokens.refresh != refresh_token, "token refreshed");
                Some(tokens)
            }
            Err(e) => {
                tracing::warn!(err = %e, "token refresh failed");
                None
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> anyhow::Result<RefreshedTokens> {
        let resp = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("refresh rejected ({status}): {text}");
        }

        let body: RefreshResponse = resp.json().await?;
        if body.access.is_empty() {
            anyhow::bail!("refresh response has no access token");
        }
        let refresh =
            body.refresh.filter(|r| !r.is_empty()).unwrap_or_else(|| refresh_token.to_owned());
        Ok(RefreshedTokens { access: body.access, refresh })
    }
}
