// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock reading-tracker API for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use versory::auth::SessionManager;
use versory::client::ApiClient;
use versory::config::RefreshPolicy;
use versory::refresh::RefreshClient;
use versory::session::{MemoryBackend, SessionStore};
use versory::test_support::mint_token_with;
use versory::token::now_secs;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";

/// Observable server state.
#[derive(Default)]
pub struct MockState {
    pub refresh_calls: AtomicU32,
    pub protected_calls: AtomicU32,
    pub refresh_delay_ms: AtomicU64,
    /// When set, `/token/refresh/` answers 401.
    pub refresh_fails: AtomicBool,
    /// When set, login answers with user fields spread at the top level.
    pub spread_login: AtomicBool,
    minted: AtomicU64,
    issued: Mutex<HashSet<String>>,
    pub seen_auth: Mutex<Vec<Option<String>>>,
    pub last_body: Mutex<Option<Value>>,
    pub last_query: Mutex<Option<String>>,
    /// Authorization headers seen by `/token/` and `/register/`.
    pub credential_auth: Mutex<Vec<Option<String>>>,
}

impl MockState {
    /// Mint an access token valid for `secs` that the server will accept.
    pub fn issue(&self, secs: i64) -> String {
        let jti = self.minted.fetch_add(1, Ordering::Relaxed);
        let token = mint_token_with(&json!({
            "token_type": "access",
            "exp": now_secs() + secs,
            "jti": format!("t{jti}"),
            "user_id": 1,
        }));
        self.issued.lock().expect("issued lock").insert(token.clone());
        token
    }

    pub fn refresh_count(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_count(&self) -> u32 {
        self.protected_calls.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().expect("body lock").clone()
    }

    fn record_credential_auth(&self, headers: &HeaderMap) {
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.credential_auth.lock().expect("auth lock").push(header);
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.protected_calls.fetch_add(1, Ordering::SeqCst);
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.seen_auth.lock().expect("auth lock").push(header.clone());

        let token = header.as_deref().and_then(|h| h.strip_prefix("Bearer "));
        let valid = token.is_some_and(|t| self.issued.lock().expect("issued lock").contains(t));
        if valid {
            Ok(())
        } else {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": "Given token not valid for any token type",
                    "code": "token_not_valid",
                })),
            )
                .into_response())
        }
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockApi {
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

pub async fn spawn_mock_api() -> MockApi {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/token/", post(login))
        .route("/api/register/", post(register))
        .route("/api/token/refresh/", post(refresh))
        .route("/api/status/", get(list_status).post(create_status))
        .route("/api/status/{id}/", get(get_status).patch(patch_status).delete(delete_status))
        .route("/api/books/search/", get(search))
        .route("/api/books/isbn/{isbn}/", get(lookup))
        .route("/api/gamification/", get(gamification))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockApi { addr, state }
}

/// Client stack wired to a fresh mock API with an in-memory session.
pub struct Harness {
    pub mock: MockApi,
    pub api: ApiClient,
    pub backend: Arc<MemoryBackend>,
}

impl Harness {
    pub fn manager(&self) -> &Arc<SessionManager> {
        self.api.session()
    }

    pub fn state(&self) -> &MockState {
        &self.mock.state
    }

    /// Store a token pair the server accepts, expiring in `secs`.
    pub async fn sign_in_with_expiry(&self, secs: i64) -> String {
        let access = self.state().issue(secs);
        self.manager().store().set_tokens(access.clone(), "refresh-1".into()).await;
        access
    }

    /// Store an access token the server rejects.
    pub async fn sign_in_stale(&self) {
        self.manager().store().set_tokens("stale.token.value".into(), "refresh-1".into()).await;
    }
}

pub async fn harness(policy: RefreshPolicy) -> Harness {
    let mock = spawn_mock_api().await;
    let backend = Arc::new(MemoryBackend::default());
    let store = Arc::new(SessionStore::new(backend.clone()));
    let refresher = RefreshClient::new(&mock.base_url(), Duration::from_secs(5));
    let manager = Arc::new(SessionManager::new(store, refresher, policy));
    let api = ApiClient::new(&mock.base_url(), Duration::from_secs(5), manager);
    Harness { mock, api, backend }
}

fn user_json() -> Value {
    json!({ "id": 1, "username": "ana", "email": EMAIL, "date_joined": "2024-01-15T09:00:00Z" })
}

pub fn user_book_json(id: u64, isbn: &str, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "book": {
            "isbn": isbn,
            "title": title,
            "pages_count": 300,
            "description": null,
            "cover_url": null,
            "published_date": "1967-05-30",
            "authors": [{ "id": 1, "name": "Gabriel García Márquez" }],
            "genres": [{ "id": 1, "name": "Novela" }],
            "source": "GOOGLE_BOOKS",
        },
        "status": status,
        "status_display": "",
        "start_date": null,
        "pages_read": 120,
        "finished_date": null,
        "rating": null,
        "created_at": format!("2025-01-{:02}T10:00:00Z", id.min(28)),
    })
}

pub fn library_json() -> Value {
    json!([
        user_book_json(1, "9780307474728", "Cien años de soledad", "RD"),
        user_book_json(2, "9788437604947", "El amor en los tiempos del cólera", "TR"),
    ])
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_credential_auth(&headers);
    *state.last_body.lock().expect("body lock") = Some(body.clone());
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response();
    }
    let access = state.issue(3600);
    let payload = if state.spread_login.load(Ordering::SeqCst) {
        let mut payload = user_json();
        payload["access"] = json!(access);
        payload["refresh"] = json!("refresh-1");
        payload
    } else {
        json!({ "access": access, "refresh": "refresh-1", "user": user_json() })
    };
    Json(payload).into_response()
}

async fn register(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_credential_auth(&headers);
    *state.last_body.lock().expect("body lock") = Some(body.clone());
    if body["email"] == EMAIL {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": { "email": ["Este email ya está registrado."] } })),
        )
            .into_response();
    }
    let access = state.issue(3600);
    (
        StatusCode::CREATED,
        Json(json!({
            "access": access,
            "refresh": "refresh-1",
            "id": 2,
            "username": body["username"],
            "email": body["email"],
        })),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if state.refresh_fails.load(Ordering::SeqCst) || body["refresh"].as_str().is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        )
            .into_response();
    }
    let access = state.issue(3600);
    Json(json!({ "access": access, "refresh": "refresh-2" })).into_response()
}

async fn list_status(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    Json(library_json()).into_response()
}

async fn create_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    *state.last_body.lock().expect("body lock") = Some(body.clone());
    let isbn = body["isbn"].as_str().unwrap_or_default();
    let status = body["status"].as_str().unwrap_or("TR");
    (StatusCode::CREATED, Json(user_book_json(3, isbn, "Pedro Páramo", status))).into_response()
}

async fn get_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "No encontrado." })))
            .into_response();
    }
    Json(user_book_json(id, "9780307474728", "Cien años de soledad", "RD")).into_response()
}

async fn patch_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    *state.last_body.lock().expect("body lock") = Some(body.clone());
    let mut entry = user_book_json(id, "9780307474728", "Cien años de soledad", "RD");
    if let (Some(target), Some(patch)) = (entry.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(entry).into_response()
}

async fn delete_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_id): Path<u64>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn search(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    let q = params.get("q").cloned().unwrap_or_default();
    *state.last_query.lock().expect("query lock") = Some(q.clone());
    Json(json!([
        {
            "isbn": "9780307474728",
            "title": format!("{q}: Cien años de soledad"),
            "authors": ["Gabriel García Márquez"],
            "cover_url": null,
            "published_date": "1967",
        },
        {
            "isbn": "9786070728792",
            "title": format!("{q}: Crónica de una muerte anunciada"),
            "authors": ["Gabriel García Márquez"],
        },
    ]))
    .into_response()
}

async fn lookup(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(isbn): Path<String>,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    if isbn == "0000000000" {
        return (StatusCode::NOT_FOUND, Json(json!({ "status": "not_found" }))).into_response();
    }
    let entry = user_book_json(1, &isbn, "Cien años de soledad", "RD");
    Json(json!({ "status": "found", "data": entry["book"] })).into_response()
}

async fn gamification(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    Json(json!({
        "streak": 3,
        "activity_dates": ["2025-03-14", "2025-03-15", "2025-03-16"],
        "yearly_challenge": { "read": 4, "goal": 12, "year": 2025 },
    }))
    .into_response()
}
