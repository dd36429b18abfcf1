//! Axum route handlers for the Interviews API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interviews::generator::{create_interview, GenerateInterviewRequest};
use crate::models::interview::Interview;
use crate::state::AppState;

const DEFAULT_LATEST_LIMIT: usize = 20;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInterviewResponse {
    pub success: bool,
    pub interview_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DeleteInterviewResponse {
    pub success: bool,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/generate
pub async fn handle_generate_interview(
    State(state): State<AppState>,
    Json(request): Json<GenerateInterviewRequest>,
) -> Result<Json<GenerateInterviewResponse>, AppError> {
    let interview =
        create_interview(state.interviews.as_ref(), state.llm.as_ref(), request).await?;
    Ok(Json(GenerateInterviewResponse {
        success: true,
        interview_id: interview.id,
    }))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Interview>, AppError> {
    let interview = state
        .interviews
        .get_interview(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
    Ok(Json(interview))
}

/// GET /api/v1/interviews?userId=
///
/// The caller's own interviews, newest first.
pub async fn handle_list_user_interviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Interview>>, AppError> {
    let interviews = state.interviews.list_interviews_by_user(&params.user_id).await?;
    Ok(Json(interviews))
}

/// GET /api/v1/interviews/latest?userId=&limit=
///
/// Other users' interviews, newest first. Without a userId the list is empty.
pub async fn handle_latest_interviews(
    State(state): State<AppState>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<Vec<Interview>>, AppError> {
    let Some(user_id) = params.user_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(Json(Vec::new()));
    };
    let limit = params.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    let interviews = state
        .interviews
        .list_latest_interviews(&user_id, limit)
        .await?;
    Ok(Json(interviews))
}

/// POST /api/v1/interviews/:id/complete
pub async fn handle_complete_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.interviews.mark_interview_completed(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/interviews/:id?userId=
///
/// Owner only. Feedback for the interview is deleted with it.
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DeleteInterviewResponse>, AppError> {
    let interview = state
        .interviews
        .get_interview(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    if interview.user_id != params.user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own interviews".to_string(),
        ));
    }

    let removed = state.feedback.delete_feedback_for_interview(&id).await?;
    state.interviews.delete_interview(&id).await?;
    info!("Deleted interview {id} and {removed} feedback documents");

    Ok(Json(DeleteInterviewResponse {
        success: true,
        message: "Interview deleted successfully".to_string(),
    }))
}
