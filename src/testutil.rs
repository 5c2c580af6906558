//! Shared test helpers for the crate's `#[cfg(test)]` modules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::models::{Priority, Role, Ticket, TicketStatus, User, UserRef};
use crate::session::{AuthSession, Session};
use crate::storage::{Database, DatabaseError, KeyValueStore, PersistedSession};

/// Open a fresh database in a temporary directory.
///
/// Returns both the `Database` and the `TempDir` guard; keep the `TempDir`
/// alive for the duration of the test.
pub fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// In-memory stand-in for durable storage
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), DatabaseError> {
        let mut map = self.entries.lock().unwrap();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), DatabaseError> {
        let mut map = self.entries.lock().unwrap();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

pub fn make_user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        role,
        name: None,
    }
}

pub fn make_ticket(id: &str, created_by: &str) -> Ticket {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Ticket {
        id: id.to_string(),
        title: format!("Ticket {id}"),
        description: "Something is broken".to_string(),
        status: TicketStatus::Open,
        priority: Priority::Medium,
        created_by: UserRef::Reference(created_by.to_string()),
        created_at: at,
        updated_at: at,
    }
}

/// Wire representation of a ticket, as the service sends it
pub fn ticket_json(ticket: &Ticket) -> Value {
    let mut value = serde_json::to_value(ticket).unwrap();
    if let Some(obj) = value.as_object_mut() {
        if let Some(id) = obj.remove("id") {
            obj.insert("_id".to_string(), id);
        }
    }
    value
}

/// A `reqwest`-backed client with proxy disabled
/// (avoids macOS system-configuration panics in sandboxed tests).
pub fn test_client(base_url: &str) -> ApiClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    ApiClient::with_client(base_url, http)
}

/// Session manager backed by memory, already restored (empty).
pub fn test_auth(base_url: &str) -> (Arc<AuthSession>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let auth = Arc::new(AuthSession::new(test_client(base_url), store.clone()));
    auth.restore();
    (auth, store)
}

/// Session manager restored from a pre-persisted session for `user`.
pub fn signed_in_auth(base_url: &str, user: User) -> Arc<AuthSession> {
    let store = Arc::new(MemoryStore::default());
    PersistedSession::new(store.clone())
        .write(&Session {
            user,
            token: "test-token".to_string(),
        })
        .unwrap();
    let auth = Arc::new(AuthSession::new(test_client(base_url), store));
    auth.restore();
    auth
}

/// Base URL on which nothing is listening
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ============================================================================
// Mock API server
// ============================================================================

/// A canned response for one route
#[derive(Clone)]
pub struct Canned {
    status: StatusCode,
    body: CannedBody,
    delay: Option<Duration>,
}

#[derive(Clone)]
enum CannedBody {
    Json(Value),
    Text(&'static str),
    Empty,
}

impl Canned {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: CannedBody::Json(body),
            delay: None,
        }
    }

    pub fn text(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body: CannedBody::Text(body),
            delay: None,
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: CannedBody::Empty,
            delay: None,
        }
    }

    /// Hold the response back for `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn into_response(self) -> Response {
        match self.body {
            CannedBody::Json(value) => (self.status, axum::Json(value)).into_response(),
            CannedBody::Text(text) => (self.status, text).into_response(),
            CannedBody::Empty => self.status.into_response(),
        }
    }
}

/// A request the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

struct MockState {
    routes: Vec<(Method, String, Canned)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Throwaway HTTP server standing in for the helpdesk API
pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn start(routes: Vec<(Method, &str, Canned)>) -> Self {
        let state = Arc::new(MockState {
            routes: routes
                .into_iter()
                .map(|(method, path, canned)| (method, path.to_string(), canned))
                .collect(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(handle_mock_request)
            .with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().pop()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_mock_request(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        headers: headers.clone(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let canned = state
        .routes
        .iter()
        .find(|(m, p, _)| *m == method && p == uri.path())
        .map(|(_, _, canned)| canned.clone());

    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            canned.into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({"message": "no such route"})),
        )
            .into_response(),
    }
}
