// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token inspection: payload decoding and expiry checks.
//!
//! Signatures are not verified; the client only needs the `exp` claim to
//! decide when to refresh. Tokens that cannot be decoded are reported as
//! [`DecodeError`] and treated as needing a refresh by the boolean checks.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Claims decoded from an access token's payload segment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenPayload {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Every other claim (`user_id`, `iat`, `jti`, ...).
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl TokenPayload {
    /// Look up a claim other than `exp`, which lives in [`Self::exp`].
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }
}

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    Segments(usize),
    #[error("payload is not valid base64url: {0}")]
    Base64(String),
    #[error("payload is not a JSON object: {0}")]
    Json(String),
    #[error("payload has no numeric exp claim")]
    MissingExpiry,
}

/// Decode the payload segment of a `header.payload.signature` token.
pub fn decode(token: &str) -> Result<TokenPayload, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    // Tolerate padding and the standard alphabet some issuers emit.
    let normalized: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes =
        URL_SAFE_NO_PAD.decode(normalized).map_err(|e| DecodeError::Base64(e.to_string()))?;

    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
    let serde_json::Value::Object(mut claims) = value else {
        return Err(DecodeError::Json("payload is not an object".to_owned()));
    };

    // Fractional expiries are truncated to whole seconds.
    let exp = claims
        .get("exp")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or(DecodeError::MissingExpiry)?;
    claims.insert("exp".to_owned(), serde_json::Value::from(exp));

    serde_json::from_value(serde_json::Value::Object(claims))
        .map_err(|e| DecodeError::Json(e.to_string()))
}

/// Current time in whole seconds since the Unix epoch.
pub fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or_default()
}

/// True if the token expires within `threshold_secs` of `now`, or cannot be decoded.
pub fn is_expiring_soon_at(token: &str, threshold_secs: i64, now: i64) -> bool {
    match decode(token) {
        Ok(payload) => payload.exp.saturating_sub(now) <= threshold_secs,
        Err(_) => true,
    }
}

/// True if the token has expired at `now`, or cannot be decoded.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token) {
        Ok(payload) => payload.exp < now,
        Err(_) => true,
    }
}

/// True if the token expires within `threshold_secs`, or cannot be decoded.
pub fn is_expiring_soon(token: &str, threshold_secs: i64) -> bool {
    is_expiring_soon_at(token, threshold_secs, now_secs())
}

/// True if the token has expired, or cannot be decoded.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_secs())
}

/// Seconds until expiry (negative once expired). `None` if undecodable.
pub fn expires_in(token: &str) -> Option<i64> {
    decode(token).ok().map(|payload| payload.exp.saturating_sub(now_secs()))
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
