//! End-to-end tests for the gateway interception pipeline against an
//! in-process mock of the booking platform.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Method;
use serde_json::json;
use skybook_client::{ApiGateway, AuthApi, GatewayConfig, PendingRequest};
use skybook_core::{Role, Session, SessionEvent, SessionStore, SkybookError, SkybookResult, UserRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory session store mirroring the three flat persisted entries
#[derive(Default)]
struct MemoryStore {
    inner: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    access: Option<String>,
    refresh: Option<String>,
    user: Option<UserRecord>,
}

impl MemoryStore {
    fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        let store = Self::default();
        {
            let mut state = store.inner.lock().unwrap();
            state.access = Some(access.to_string());
            state.refresh = refresh.map(String::from);
            state.user = Some(test_user());
        }
        store
    }

    fn is_empty(&self) -> bool {
        let state = self.inner.lock().unwrap();
        state.access.is_none() && state.refresh.is_none() && state.user.is_none()
    }
}

impl SessionStore for MemoryStore {
    fn access_token(&self) -> SkybookResult<Option<String>> {
        Ok(self.inner.lock().unwrap().access.clone())
    }

    fn refresh_token(&self) -> SkybookResult<Option<String>> {
        Ok(self.inner.lock().unwrap().refresh.clone())
    }

    fn user(&self) -> SkybookResult<Option<UserRecord>> {
        Ok(self.inner.lock().unwrap().user.clone())
    }

    fn store_session(&self, session: &Session) -> SkybookResult<()> {
        let mut state = self.inner.lock().unwrap();
        state.access = Some(session.access_token.clone());
        state.refresh = Some(session.refresh_token.clone());
        state.user = Some(session.user.clone());
        Ok(())
    }

    fn replace_access_token(&self, access_token: &str) -> SkybookResult<()> {
        self.inner.lock().unwrap().access = Some(access_token.to_string());
        Ok(())
    }

    fn clear(&self) -> SkybookResult<()> {
        let mut state = self.inner.lock().unwrap();
        state.access = None;
        state.refresh = None;
        state.user = None;
        Ok(())
    }
}

fn test_user() -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        email: "amelia@example.com".to_string(),
        first_name: "Amelia".to_string(),
        last_name: "Earhart".to_string(),
        role: Role::Client,
        created_at: None,
    }
}

/// Scripted mock of the booking platform
struct MockApi {
    protected_hits: AtomicUsize,
    refresh_hits: AtomicUsize,
    /// Authorization header observed on each hit of the protected route
    auth_headers: Mutex<Vec<Option<String>>>,
    /// Token the protected route currently accepts; `None` rejects everything
    accepted_token: Mutex<Option<String>>,
    /// Token the refresh endpoint hands out; `None` makes refresh fail
    refresh_grants: Option<String>,
    /// Whether the handed-out token becomes accepted by the protected route
    accept_refreshed: bool,
}

impl MockApi {
    fn new(
        accepted_token: Option<&str>,
        refresh_grants: Option<&str>,
        accept_refreshed: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            protected_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            auth_headers: Mutex::new(Vec::new()),
            accepted_token: Mutex::new(accepted_token.map(String::from)),
            refresh_grants: refresh_grants.map(String::from),
            accept_refreshed,
        })
    }
}

async fn protected_handler(State(state): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    state.protected_hits.fetch_add(1, Ordering::SeqCst);

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.auth_headers.lock().unwrap().push(auth.clone());

    let accepted = state.accepted_token.lock().unwrap().clone();
    match (auth, accepted) {
        (Some(header), Some(token)) if header == format!("Bearer {}", token) => {
            Json(json!({"ok": true})).into_response()
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn refresh_handler(
    State(state): State<Arc<MockApi>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    assert!(body["refresh"].is_string(), "refresh body must carry the refresh token");

    match &state.refresh_grants {
        Some(token) => {
            if state.accept_refreshed {
                *state.accepted_token.lock().unwrap() = Some(token.clone());
            }
            Json(json!({"access": token})).into_response()
        }
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn login_handler(Json(body): Json<serde_json::Value>) -> Response {
    if body["password"] == "correct-horse" {
        Json(json!({
            "access": "login-access",
            "refresh": "login-refresh",
            "user": {
                "id": "7f8c1a9e-3f43-4a55-9d8a-2a2f0f4c2b11",
                "email": "amelia@example.com",
                "first_name": "Amelia",
                "last_name": "Earhart",
                "role": "CLIENT"
            }
        }))
        .into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn spawn_server(state: Arc<MockApi>) -> String {
    let app = Router::new()
        .route("/api/v1/protected", get(protected_handler))
        .route("/api/v1/auth/refresh", post(refresh_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/v1", addr)
}

fn gateway_for(base_url: &str, store: Arc<MemoryStore>) -> Arc<ApiGateway> {
    Arc::new(ApiGateway::new(GatewayConfig::new(base_url), store).unwrap())
}

#[tokio::test]
async fn outbound_requests_carry_the_exact_stored_token() {
    let mock = MockApi::new(Some("good-token"), None, false);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::with_tokens("good-token", Some("refresh-1")));
    let gateway = gateway_for(&base_url, store);

    let body: serde_json::Value = gateway.get_json("protected").await.unwrap();
    assert_eq!(body["ok"], true);

    let headers = mock.auth_headers.lock().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].as_deref(), Some("Bearer good-token"));
}

#[tokio::test]
async fn requests_without_a_token_are_sent_unauthenticated() {
    let mock = MockApi::new(Some("good-token"), None, false);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway_for(&base_url, store);

    let result: SkybookResult<serde_json::Value> = gateway.get_json("protected").await;
    assert_eq!(result.unwrap_err().status(), Some(401));

    let headers = mock.auth_headers.lock().unwrap();
    assert_eq!(headers[0], None);
    // No refresh token on record, so no refresh attempt either
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_401_is_retried_exactly_once_with_the_refreshed_token() {
    let mock = MockApi::new(Some("unguessable"), Some("fresh-token"), true);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::with_tokens("stale-token", Some("refresh-1")));
    let gateway = gateway_for(&base_url, store.clone());

    let body: serde_json::Value = gateway.get_json("protected").await.unwrap();
    assert_eq!(body["ok"], true);

    assert_eq!(mock.protected_hits.load(Ordering::SeqCst), 2);
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 1);

    // The retry carried the refreshed token, and the store was updated
    let headers = mock.auth_headers.lock().unwrap();
    assert_eq!(headers[1].as_deref(), Some("Bearer fresh-token"));
    assert_eq!(
        store.access_token().unwrap().as_deref(),
        Some("fresh-token")
    );
}

#[tokio::test]
async fn a_second_401_on_the_retry_is_not_retried_again() {
    // Refresh succeeds but the protected route keeps rejecting
    let mock = MockApi::new(None, Some("fresh-token"), false);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::with_tokens("stale-token", Some("refresh-1")));
    let gateway = gateway_for(&base_url, store);

    let result: SkybookResult<serde_json::Value> = gateway.get_json("protected").await;
    assert_eq!(result.unwrap_err().status(), Some(401));

    // One original attempt, one retry, and nothing more
    assert_eq!(mock.protected_hits.load(Ordering::SeqCst), 2);
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_failure_clears_the_session_and_broadcasts_expiry() {
    let mock = MockApi::new(None, None, false);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::with_tokens("stale-token", Some("refresh-1")));
    let gateway = gateway_for(&base_url, store.clone());
    let mut events = gateway.subscribe_session_events();

    let result: SkybookResult<serde_json::Value> = gateway.get_json("protected").await;
    assert!(matches!(
        result,
        Err(SkybookError::Authentication { .. })
    ));

    // Hard session termination: nothing left in the store
    assert!(store.is_empty());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);

    // The failed request was not re-issued after the failed refresh
    assert_eq!(mock.protected_hits.load(Ordering::SeqCst), 1);
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_maps_bad_credentials_to_an_authentication_error() {
    let mock = MockApi::new(None, None, false);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway_for(&base_url, store);
    let auth = AuthApi::new(gateway);

    let err = auth
        .login("amelia@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, SkybookError::Authentication { .. }));

    let response = auth
        .login("amelia@example.com", "correct-horse")
        .await
        .unwrap();
    assert_eq!(response.access, "login-access");
    assert_eq!(response.user.role, Role::Client);
}

#[tokio::test]
async fn non_401_failures_are_propagated_unchanged() {
    let mock = MockApi::new(Some("good-token"), Some("fresh-token"), true);
    let base_url = spawn_server(mock.clone()).await;

    let store = Arc::new(MemoryStore::with_tokens("good-token", Some("refresh-1")));
    let gateway = gateway_for(&base_url, store);

    // Unknown path: axum answers 404, which must pass through untouched
    let result = gateway
        .execute(PendingRequest::new(Method::GET, "missing"))
        .await
        .unwrap();
    assert_eq!(result.status().as_u16(), 404);
    assert_eq!(mock.refresh_hits.load(Ordering::SeqCst), 0);
}
