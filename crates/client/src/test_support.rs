// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by unit and integration tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::token::now_secs;

/// Build an unsigned `header.payload.signature` token with the given claims.
pub fn mint_token_with(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Build a token expiring at `exp` (seconds since epoch).
pub fn mint_token(exp: i64) -> String {
    mint_token_with(&serde_json::json!({ "token_type": "access", "exp": exp, "user_id": 1 }))
}

/// Build a token expiring `secs` from now (negative for already expired).
pub fn mint_token_in(secs: i64) -> String {
    mint_token(now_secs() + secs)
}
