// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// How concurrent refresh attempts for one session are coordinated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RefreshPolicy {
    /// Concurrent callers wait for a single refresh exchange and share its result.
    #[default]
    SingleFlight,
    /// Every caller performs its own refresh exchange.
    Independent,
}

impl std::fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleFlight => f.write_str("single-flight"),
            Self::Independent => f.write_str("independent"),
        }
    }
}

/// Configuration for the reading-tracker API client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the reading-tracker API (e.g. `https://api.example.com/api`).
    #[arg(long, env = "VERSORY_API_URL")]
    pub api_url: String,

    /// Request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "VERSORY_API_TIMEOUT_MS")]
    pub api_timeout_ms: u64,

    /// Background token expiry poll interval in milliseconds.
    #[arg(long, default_value_t = 120_000, env = "VERSORY_TOKEN_REFRESH_INTERVAL_MS")]
    pub refresh_interval_ms: u64,

    /// Refresh the access token when it expires within this many seconds.
    #[arg(long, default_value_t = 300, env = "VERSORY_TOKEN_EXPIRY_THRESHOLD_SECS")]
    pub expiry_threshold_secs: i64,

    /// Refresh coordination for concurrent 401 responses.
    #[arg(
        long,
        value_enum,
        default_value_t = RefreshPolicy::SingleFlight,
        env = "VERSORY_REFRESH_POLICY"
    )]
    pub refresh_policy: RefreshPolicy,

    /// Directory holding the sealed session and its key.
    #[arg(long, env = "VERSORY_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Base64-encoded 32-byte session key. Generated under the state dir if unset.
    #[arg(long, env = "VERSORY_SESSION_KEY", hide_env_values = true)]
    pub session_key: Option<String>,

    /// Keep the session in memory only.
    #[arg(long, env = "VERSORY_EPHEMERAL")]
    pub ephemeral: bool,
}

impl ClientConfig {
    /// Config pointing at `api_url` with every other field at its default.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_timeout_ms: 10_000,
            refresh_interval_ms: 120_000,
            expiry_threshold_secs: 300,
            refresh_policy: RefreshPolicy::SingleFlight,
            state_dir: None,
            session_key: None,
            ephemeral: false,
        }
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            anyhow::bail!("api url is required (--api-url or VERSORY_API_URL)");
        }
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| anyhow::anyhow!("invalid api url {url:?}: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api url must use http or https: {url}");
        }
        if parsed.host_str().is_none() {
            anyhow::bail!("api url has no host: {url}");
        }
        if self.api_timeout_ms == 0 {
            anyhow::bail!("api timeout must be greater than zero");
        }
        if self.refresh_interval_ms == 0 {
            anyhow::bail!("token refresh interval must be greater than zero");
        }
        if self.expiry_threshold_secs < 0 {
            anyhow::bail!("token expiry threshold cannot be negative");
        }
        Ok(())
    }

    /// API base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        self.api_url.trim().trim_end_matches('/').to_owned()
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Resolve the state directory.
    ///
    /// Checks `--state-dir`, then `$XDG_STATE_HOME/versory`,
    /// then `$HOME/.local/state/versory`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("versory");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/versory");
        }
        PathBuf::from(".versory")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
