// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `login`, `register`, `logout`, `whoami`.

use serde_json::{json, Value};

use super::{LoginArgs, RegisterArgs};
use crate::client::ApiClient;
use crate::token;

pub async fn login(api: &ApiClient, args: &LoginArgs) -> anyhow::Result<Value> {
    let user = api.session().login(api, &args.email, &args.password).await?;
    Ok(json!({ "authenticated": true, "user": user }))
}

pub async fn register(api: &ApiClient, args: &RegisterArgs) -> anyhow::Result<Value> {
    let user =
        api.session().register(api, &args.username, &args.email, &args.password).await?;
    Ok(json!({ "authenticated": true, "user": user }))
}

pub async fn logout(api: &ApiClient) -> anyhow::Result<Value> {
    api.session().logout().await;
    Ok(json!({ "authenticated": false }))
}

pub async fn whoami(api: &ApiClient) -> anyhow::Result<Value> {
    let session = api.session().store().snapshot().await;
    let expires_in = session.access_token.as_deref().and_then(token::expires_in);
    Ok(json!({
        "authenticated": session.is_authenticated(),
        "user": session.user,
        "expires_in": expires_in,
        "refresh_policy": api.session().policy().to_string(),
    }))
}
