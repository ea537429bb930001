//! Wire shape of relocation outcomes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use wiki_hub_core::relocation::RelocationOutcome;
use wiki_hub_core::WikiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "newPath", skip_serializing_if = "Option::is_none", default)]
    pub new_path: Option<String>,
    #[serde(rename = "oldPath", skip_serializing_if = "Option::is_none", default)]
    pub old_path: Option<String>,
    /// Secondary stores that did not follow the move.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

impl MoveResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            new_path: None,
            old_path: None,
            warnings: Vec::new(),
        }
    }
}

impl From<&RelocationOutcome> for MoveResponse {
    fn from(outcome: &RelocationOutcome) -> Self {
        Self {
            success: true,
            message: "Document moved successfully".to_string(),
            new_path: Some(outcome.plan.target.clone()),
            old_path: Some(outcome.plan.source.clone()),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A [`WikiError`] rendered as a failed [`MoveResponse`].
#[derive(Debug)]
pub struct ApiError(pub WikiError);

impl From<WikiError> for ApiError {
    fn from(err: WikiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(MoveResponse::failure(self.0.to_string()))).into_response()
    }
}

pub async fn method_not_allowed() -> (StatusCode, Json<MoveResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MoveResponse::failure("Method not allowed")),
    )
}
