use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::feedback::pipeline::{generate_feedback, FeedbackOutcome, FeedbackRequest};
use crate::models::feedback::Feedback;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: String,
}

/// POST /api/v1/feedback
///
/// Runs the pipeline for a finished transcript. Scoring or storage failures
/// come back as `{"success": false}` with status 200.
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackOutcome>, AppError> {
    if request.interview_id.trim().is_empty() || request.user_id.trim().is_empty() {
        return Err(AppError::Validation(
            "interviewId and userId are required".to_string(),
        ));
    }

    let outcome =
        generate_feedback(state.feedback.as_ref(), state.scorer.as_ref(), &request).await;
    Ok(Json(outcome))
}

/// GET /api/v1/interviews/:id/feedback?userId=
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Feedback>, AppError> {
    let feedback = state
        .feedback
        .find_feedback(&interview_id, &params.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No feedback for interview {interview_id} and user {}",
                params.user_id
            ))
        })?;
    Ok(Json(feedback))
}
