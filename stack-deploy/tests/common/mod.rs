//! Shared test utilities: an in-process mock of the Portainer REST API.
//!
//! Every request is recorded (method, path, query, Authorization header and
//! JSON body) so tests can assert on exactly what went over the wire.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const JWT: &str = "test-jwt-token";
pub const SWARM_ID: &str = "swarm-abc123";
pub const ENDPOINT: u64 = 2;

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn is(&self, method: Method, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

/// What `/api/auth` answers to valid credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReply {
    Token,
    EmptyToken,
    /// 200 with an HTML page, as a misrouted proxy would serve.
    Html,
}

/// A stack stored by the mock server.
#[derive(Debug, Clone)]
pub struct MockStack {
    pub id: u64,
    pub name: String,
    pub swarm_id: String,
    pub content: String,
    pub prune: Option<bool>,
}

#[derive(Debug)]
struct MockState {
    requests: Vec<RecordedRequest>,
    stacks: Vec<MockStack>,
    next_id: u64,
    /// `None` makes the endpoint behave like a non-swarm docker host.
    swarm_id: Option<String>,
    fail_stack_list: bool,
    malformed_stack_list: bool,
    auth_reply: AuthReply,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            stacks: Vec::new(),
            next_id: 1,
            swarm_id: Some(SWARM_ID.to_string()),
            fail_stack_list: false,
            malformed_stack_list: false,
            auth_reply: AuthReply::Token,
        }
    }
}

type SharedState = Arc<Mutex<MockState>>;

/// Mock Portainer instance listening on a random local port.
pub struct MockPortainer {
    pub addr: SocketAddr,
    state: SharedState,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl MockPortainer {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MockState::default()));
        let router = Router::new().fallback(handle).with_state(state.clone());

        // Port 0 lets the OS choose an available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    /// Bare host URL, without any path.
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Host URL carrying an arbitrary path that the client must discard.
    pub fn url_with_path(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).unwrap()
    }

    pub async fn seed_stack(&self, name: &str) -> u64 {
        self.seed_stack_on_swarm(name, SWARM_ID).await
    }

    pub async fn seed_stack_on_swarm(&self, name: &str, swarm_id: &str) -> u64 {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        state.stacks.push(MockStack {
            id,
            name: name.to_string(),
            swarm_id: swarm_id.to_string(),
            content: String::new(),
            prune: None,
        });
        id
    }

    pub async fn set_swarm_id(&self, swarm_id: Option<&str>) {
        self.state.lock().await.swarm_id = swarm_id.map(str::to_string);
    }

    pub async fn set_auth_reply(&self, reply: AuthReply) {
        self.state.lock().await.auth_reply = reply;
    }

    pub async fn fail_stack_list(&self) {
        self.state.lock().await.fail_stack_list = true;
    }

    pub async fn malformed_stack_list(&self) {
        self.state.lock().await.malformed_stack_list = true;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Requests that change state (POST/PUT/DELETE on stacks).
    pub async fn stack_writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method != Method::GET && r.path.starts_with("/api/stacks"))
            .collect()
    }

    pub async fn stacks(&self) -> Vec<MockStack> {
        self.state.lock().await.stacks.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message, "details": message }))).into_response()
}

fn stack_json(stack: &MockStack) -> Value {
    json!({
        "Id": stack.id,
        "Name": stack.name,
        "Type": 1,
        "EndpointId": ENDPOINT,
        "SwarmId": stack.swarm_id,
        "Status": 1,
    })
}

async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let mut state = state.lock().await;
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: query.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();

    if method == Method::POST && segments == ["api", "auth"] {
        let body = body.unwrap_or(Value::Null);
        if body["username"] == USERNAME && body["password"] == PASSWORD {
            return match state.auth_reply {
                AuthReply::Token => Json(json!({ "jwt": JWT })).into_response(),
                AuthReply::EmptyToken => Json(json!({ "jwt": "" })).into_response(),
                AuthReply::Html => {
                    (StatusCode::OK, "<html><body>Portainer</body></html>").into_response()
                }
            };
        }
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid credentials");
    }

    if authorization.as_deref() != Some(format!("Bearer {}", JWT).as_str()) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "endpoints", id, "docker", "swarm"]) => {
            if id.parse::<u64>().ok() != Some(ENDPOINT) {
                return error(StatusCode::NOT_FOUND, "Unable to find an environment");
            }
            match &state.swarm_id {
                Some(swarm_id) => Json(json!({ "ID": swarm_id, "Version": { "Index": 11 } }))
                    .into_response(),
                None => error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "This node is not a swarm manager.",
                ),
            }
        }
        ("GET", ["api", "stacks"]) => {
            if state.fail_stack_list {
                return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
            }
            if state.malformed_stack_list {
                return Json(json!({ "stacks": "not-a-list" })).into_response();
            }
            let filter: Option<String> = query
                .get("filters")
                .and_then(|f| serde_json::from_str::<Value>(f).ok())
                .and_then(|f| f["SwarmId"].as_str().map(str::to_string));
            let stacks: Vec<Value> = state
                .stacks
                .iter()
                .filter(|s| filter.as_deref().is_none_or(|id| s.swarm_id == id))
                .map(stack_json)
                .collect();
            Json(Value::Array(stacks)).into_response()
        }
        ("POST", ["api", "stacks"]) => {
            let valid_query = query.get("endpointId").map(String::as_str) == Some("2")
                && query.get("method").map(String::as_str) == Some("string")
                && query.get("type").map(String::as_str) == Some("1");
            if !valid_query {
                return error(StatusCode::BAD_REQUEST, "Invalid query parameters");
            }
            let body = body.unwrap_or(Value::Null);
            let (Some(name), Some(content), Some(swarm_id)) = (
                body["name"].as_str(),
                body["stackFileContent"].as_str(),
                body["swarmID"].as_str(),
            ) else {
                return error(StatusCode::BAD_REQUEST, "Invalid request payload");
            };
            if state.stacks.iter().any(|s| s.name == name) {
                return error(StatusCode::CONFLICT, "A stack with this name already exists");
            }
            let stack = MockStack {
                id: state.next_id,
                name: name.to_string(),
                swarm_id: swarm_id.to_string(),
                content: content.to_string(),
                prune: None,
            };
            state.next_id += 1;
            let response = stack_json(&stack);
            state.stacks.push(stack);
            Json(response).into_response()
        }
        ("PUT", ["api", "stacks", id]) => {
            let Ok(id) = id.parse::<u64>() else {
                return error(StatusCode::BAD_REQUEST, "Invalid stack identifier");
            };
            let body = body.unwrap_or(Value::Null);
            let Some(stack) = state.stacks.iter_mut().find(|s| s.id == id) else {
                return error(StatusCode::NOT_FOUND, "Unable to find a stack");
            };
            stack.content = body["stackFileContent"].as_str().unwrap_or_default().to_string();
            stack.prune = body["prune"].as_bool();
            Json(stack_json(stack)).into_response()
        }
        ("DELETE", ["api", "stacks", id]) => {
            let Ok(id) = id.parse::<u64>() else {
                return error(StatusCode::BAD_REQUEST, "Invalid stack identifier");
            };
            let before = state.stacks.len();
            state.stacks.retain(|s| s.id != id);
            if state.stacks.len() == before {
                return error(StatusCode::NOT_FOUND, "Unable to find a stack");
            }
            StatusCode::NO_CONTENT.into_response()
        }
        _ => error(StatusCode::NOT_FOUND, "Not found"),
    }
}
