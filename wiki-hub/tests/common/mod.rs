use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiki_hub::api::{self, AppState, CookiePolicy};
use wiki_hub_core::auth::{AuthGate, CredentialVerifier, Role};
use wiki_hub_core::events::EventBus;
use wiki_hub_core::relocation::{MoveOptions, Relocator, StorageLayout, DOCUMENT_FILE};

/// Fixed credentials, so tests skip argon2.
pub struct StaticUsers;

#[async_trait]
impl CredentialVerifier for StaticUsers {
    async fn verify(&self, username: &str, password: &str) -> Option<Role> {
        match (username, password) {
            ("admin", "admin-pw") => Some(Role::Admin),
            ("alice", "alice-pw") => Some(Role::Editor),
            ("victor", "victor-pw") => Some(Role::Viewer),
            // any name is accepted with the guest password
            (_, "guest-pw") => Some(Role::Viewer),
            _ => None,
        }
    }
}

pub struct Harness {
    pub tmp: TempDir,
    pub app: Router,
    pub state: AppState,
    pub layout: StorageLayout,
}

impl Harness {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path(), "documents");
        let state = AppState {
            gate: AuthGate::in_memory(),
            verifier: Arc::new(StaticUsers),
            relocator: Arc::new(Relocator::new(layout.clone(), MoveOptions::default())),
            events: EventBus::new(),
            cookies: CookiePolicy {
                secure: false,
                ..Default::default()
            },
        };
        let app = api::router(state.clone());
        Self {
            tmp,
            app,
            state,
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Cookie header for a fresh session with `role`.
    pub fn session_cookie(&self, username: &str, role: Role) -> String {
        let token = self.state.gate.issue(username, role).unwrap();
        format!("{}={token}", api::SESSION_COOKIE)
    }

    pub fn write_doc(&self, path: &str, body: &str) {
        let dir = self.layout.primary(path);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DOCUMENT_FILE), body).unwrap();
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, json)
    }

    pub async fn relocate(&self, cookie: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, json) = self
            .send(Method::POST, "/api/move", Some(cookie), Some(body))
            .await;
        (status, json)
    }
}
