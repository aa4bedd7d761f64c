// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serial_test::serial;

use super::*;

#[derive(Debug, Parser)]
struct Harness {
    #[command(flatten)]
    config: ClientConfig,
}

#[test]
fn defaults_match_documented_values() -> anyhow::Result<()> {
    let harness = Harness::try_parse_from(["versory", "--api-url", "http://localhost:8000/api"])?;
    let config = harness.config;
    assert_eq!(config.api_timeout(), Duration::from_secs(10));
    assert_eq!(config.refresh_interval(), Duration::from_secs(120));
    assert_eq!(config.expiry_threshold_secs, 300);
    assert_eq!(config.refresh_policy, RefreshPolicy::SingleFlight);
    assert!(!config.ephemeral);
    config.validate()?;
    Ok(())
}

#[test]
fn refresh_policy_parses_from_flag() -> anyhow::Result<()> {
    let harness = Harness::try_parse_from([
        "versory",
        "--api-url",
        "http://localhost:8000",
        "--refresh-policy",
        "independent",
    ])?;
    assert_eq!(harness.config.refresh_policy, RefreshPolicy::Independent);
    assert_eq!(harness.config.refresh_policy.to_string(), "independent");
    Ok(())
}

#[test]
fn base_url_strips_trailing_slash() {
    let config = ClientConfig::new("http://localhost:8000/api/ ");
    assert_eq!(config.base_url(), "http://localhost:8000/api");
}

#[yare::parameterized(
    empty = { "" },
    not_a_url = { "not a url" },
    wrong_scheme = { "ftp://books.example.com" },
)]
fn validate_rejects_bad_urls(url: &str) {
    assert!(ClientConfig::new(url).validate().is_err());
}

#[test]
fn validate_rejects_zero_durations() {
    let mut config = ClientConfig::new("https://books.example.com");
    config.api_timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = ClientConfig::new("https://books.example.com");
    config.refresh_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = ClientConfig::new("https://books.example.com");
    config.expiry_threshold_secs = -1;
    assert!(config.validate().is_err());
}

#[test]
fn explicit_state_dir_wins() {
    let mut config = ClientConfig::new("https://books.example.com");
    config.state_dir = Some(PathBuf::from("/tmp/versory-explicit"));
    assert_eq!(config.state_dir(), PathBuf::from("/tmp/versory-explicit"));
}

#[test]
#[serial]
fn state_dir_prefers_xdg_state_home() {
    let previous = std::env::var_os("XDG_STATE_HOME");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");

    let config = ClientConfig::new("https://books.example.com");
    assert_eq!(config.state_dir(), PathBuf::from("/tmp/xdg-state/versory"));

    match previous {
        Some(value) => std::env::set_var("XDG_STATE_HOME", value),
        None => std::env::remove_var("XDG_STATE_HOME"),
    }
}
