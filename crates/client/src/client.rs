// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated request pipeline.
//!
//! Every call attaches the current access token. A 401 on a request that
//! has not been retried yet triggers one refresh through the
//! [`SessionManager`] and, if it succeeds, one re-issue of the same request.

use std::sync::{Arc, Once};
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::SessionManager;
use crate::config::ClientConfig;
use crate::error::ApiError;

static CRYPTO: Once = Once::new();

/// Install the process-wide rustls provider (first call wins).
pub fn ensure_crypto() {
    CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// A request description that can be re-issued verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/status/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Set once the request has been re-issued after a refresh.
    pub retried: bool,
    /// Sent without a bearer; a 401 is final and never triggers a refresh.
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Mark as already retried; a 401 then propagates without a refresh.
    pub fn retried(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Send without credentials, for endpoints that issue them.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// HTTP client for the reading-tracker API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionManager>) -> Self {
        ensure_crypto();
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { http, base_url: base_url.trim_end_matches('/').to_owned(), session }
    }

    pub fn from_config(config: &ClientConfig, session: Arc<SessionManager>) -> Self {
        Self::new(&config.base_url(), config.api_timeout(), session)
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send through the pipeline. Non-2xx responses become [`ApiError`].
    pub async fn send(&self, mut req: ApiRequest) -> Result<Response, ApiError> {
        if req.anonymous {
            let resp = self.dispatch(&req, None).await?;
            return check(resp).await;
        }
        let token = self.session.access_token().await;
        let resp = self.dispatch(&req, token.as_deref()).await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return check(resp).await;
        }
        let rejected = error_from_response(resp).await;
        if req.retried {
            tracing::debug!(path = %req.path, "401 on retried request");
            return Err(rejected);
        }

        req.retried = true;
        tracing::debug!(method = %req.method, path = %req.path, "401, refreshing session");
        if !self.session.refresh_session(token.as_deref()).await {
            tracing::info!(path = %req.path, "refresh failed, returning original 401");
            return Err(rejected);
        }

        let token = self.session.access_token().await;
        let resp = self.dispatch(&req, token.as_deref()).await?;
        check(resp).await
    }

    /// Send and decode the body as raw JSON (`null` for an empty body).
    pub async fn send_value(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let resp = self.send(req).await?;
        let bytes = resp.bytes().await.map_err(|e| ApiError::from_transport(&e))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Payload(e.to_string()))
    }

    /// Send and decode the body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
        let value = self.send_value(req).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Payload(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path, to_body(body)?)).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(path, to_body(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    async fn dispatch(&self, req: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.http.request(req.method.clone(), url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await.map_err(|e| {
            let err = ApiError::from_transport(&e);
            tracing::warn!(method = %req.method, path = %req.path, err = %e, "request failed");
            err
        })?;
        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = resp.status().as_u16(),
            retried = req.retried,
            "response"
        );
        Ok(resp)
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

async fn check(resp: Response) -> Result<Response, ApiError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(error_from_response(resp).await)
    }
}

async fn error_from_response(resp: Response) -> ApiError {
    let status = resp.status().as_u16();
    let body = resp.bytes().await.ok().and_then(|b| serde_json::from_slice::<Value>(&b).ok());
    ApiError::from_status(status, body)
}
