//! HTTP API layer exposing relocation and session endpoints.

mod response;
mod session;

pub use response::{ApiError, MoveResponse};
pub use session::{parse_cookie, AuthContext, CookiePolicy, SESSION_COOKIE, USER_COOKIE};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wiki_hub_core::auth::{AuthGate, CredentialVerifier, Role};
use wiki_hub_core::events::{Event, EventBus};
use wiki_hub_core::relocation::{RelocationRequest, Relocator};
use wiki_hub_core::WikiError;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub relocator: Arc<Relocator>,
    pub events: EventBus,
    pub cookies: CookiePolicy,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    username: String,
    password: String,
    #[serde(default)]
    keep_logged_in: bool,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    message: String,
    username: String,
    role: Role,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    username: String,
    role: Role,
    created_at: DateTime<Utc>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/move",
            post(move_document).fallback(response::method_not_allowed),
        )
        .route(
            "/api/login",
            post(login).fallback(response::method_not_allowed),
        )
        .route(
            "/api/logout",
            post(logout).fallback(response::method_not_allowed),
        )
        .route("/api/session", get(current_session))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(MoveResponse::failure(message))).into_response()
}

fn with_cookies(cookies: [String; 2]) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| WikiError::internal("Failed to encode cookie", e))?;
        headers.append(header::SET_COOKIE, value);
    }
    Ok(headers)
}

async fn move_document(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<RelocationRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    state.gate.authorize(auth.token.as_deref(), Role::Editor)?;
    let Json(request) = body.map_err(|_| WikiError::validation("Invalid request format"))?;

    let relocator = state.relocator.clone();
    let outcome = tokio::task::spawn_blocking(move || relocator.relocate(&request))
        .await
        .map_err(|e| WikiError::internal("Relocation task failed", e))??;

    info!(
        kind = ?outcome.plan.kind,
        from = %outcome.plan.source,
        to = %outcome.plan.target,
        warnings = outcome.warnings.len(),
        "relocation completed"
    );
    for warning in &outcome.warnings {
        state.events.send(Event::MirrorFailed {
            store: warning.store.as_str().to_string(),
            from: warning.from.display().to_string(),
            to: warning.to.display().to_string(),
            error: warning.error.clone(),
        });
    }
    state.events.send(Event::Relocated {
        old_path: outcome.plan.source.clone(),
        new_path: outcome.plan.target.clone(),
    });
    Ok(Json(MoveResponse::from(&outcome)))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|_| WikiError::validation("Invalid request format"))?;
    let Some(role) = state.verifier.verify(&req.username, &req.password).await else {
        info!(username = %req.username, "login rejected");
        return Ok(failure(
            StatusCode::UNAUTHORIZED,
            "Invalid username or password",
        ));
    };

    let token = state.gate.issue(&req.username, role).map_err(|e| {
        error!(error = %e, "could not issue session");
        e
    })?;
    let headers = match with_cookies(state.cookies.login_cookies(
        &token,
        &req.username,
        req.keep_logged_in,
    )) {
        Ok(headers) => headers,
        Err(e) => {
            state.gate.revoke(&token);
            return Err(e);
        }
    };
    info!(username = %req.username, %role, remember = req.keep_logged_in, "logged in");
    state.events.send(Event::LoggedIn {
        username: req.username.clone(),
    });
    Ok((
        StatusCode::OK,
        headers,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            username: req.username,
            role,
        }),
    )
        .into_response())
}

async fn logout(State(state): State<AppState>, auth: AuthContext) -> Result<Response, ApiError> {
    if let Some(session) = auth.token.as_deref().and_then(|t| state.gate.revoke(t)) {
        info!(username = %session.username, "logged out");
        state.events.send(Event::LoggedOut {
            username: session.username,
        });
    }
    let headers = with_cookies(state.cookies.logout_cookies())?;
    Ok((
        StatusCode::OK,
        headers,
        Json(MoveResponse {
            success: true,
            message: "Logged out".to_string(),
            new_path: None,
            old_path: None,
            warnings: Vec::new(),
        }),
    )
        .into_response())
}

async fn current_session(auth: AuthContext) -> Response {
    match auth.session {
        Some(session) => Json(SessionInfo {
            username: session.username,
            role: session.role,
            created_at: session.created_at,
        })
        .into_response(),
        None => failure(StatusCode::UNAUTHORIZED, "Not logged in"),
    }
}
