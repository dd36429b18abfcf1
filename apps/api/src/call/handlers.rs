//! Axum route handlers for server-hosted call sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::call::machine::{CallContext, CallMachine, CallMode, CallSnapshot, Input};
use crate::call::session::{spawn_session, CallHandle};
use crate::call::vapi::{map_server_message, ServerEnvelope};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    pub user_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub interview_id: Option<String>,
    #[serde(default)]
    pub feedback_id: Option<String>,
    pub mode: CallMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallResponse {
    pub call_id: Uuid,
    pub snapshot: CallSnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/calls
///
/// Creates a session and issues `start`. Interview mode loads questions and
/// duration from the stored interview.
pub async fn handle_create_call(
    State(state): State<AppState>,
    Json(request): Json<CreateCallRequest>,
) -> Result<(StatusCode, Json<CreateCallResponse>), AppError> {
    state.calls.sweep().await;

    let context = match request.mode {
        CallMode::Generate => CallContext {
            mode: CallMode::Generate,
            user_name: request.user_name,
            user_id: request.user_id,
            interview_id: None,
            feedback_id: None,
            questions: Vec::new(),
            duration_minutes: 0,
            workflow_id: state.config.vapi_workflow_id.clone(),
            repeat_grace: state.config.call_repeat_grace,
        },
        CallMode::Interview => {
            let interview_id = request
                .interview_id
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| AppError::Validation("interviewId is required".to_string()))?;
            let interview = state
                .interviews
                .get_interview(&interview_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
            CallContext {
                mode: CallMode::Interview,
                user_name: request.user_name,
                user_id: request.user_id,
                interview_id: Some(interview.id),
                feedback_id: request.feedback_id,
                questions: interview.questions,
                duration_minutes: interview.duration,
                workflow_id: None,
                repeat_grace: state.config.call_repeat_grace,
            }
        }
    };

    let call_id = Uuid::new_v4();
    let handle = spawn_session(
        call_id,
        CallMachine::new(context),
        state.gateways.connect(call_id),
        state.session_deps(),
    );
    state.calls.insert(handle.clone()).await;
    handle.send(Input::Start).await.map_err(anyhow::Error::from)?;
    info!("Created call session {call_id} ({:?})", request.mode);

    Ok((
        StatusCode::CREATED,
        Json(CreateCallResponse {
            call_id,
            snapshot: handle.snapshot(),
        }),
    ))
}

async fn find_call(state: &AppState, id: Uuid) -> Result<CallHandle, AppError> {
    state
        .calls
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Call {id} not found")))
}

/// Queues `input` for the session and answers 202 with the snapshot as it was
/// when the command was accepted. The session applies the command afterwards,
/// so callers read the outcome from `GET /api/v1/calls/:id`.
async fn dispatch(
    state: &AppState,
    id: Uuid,
    input: Input,
) -> Result<(StatusCode, Json<CallSnapshot>), AppError> {
    let handle = find_call(state, id).await?;
    handle.send(input).await.map_err(anyhow::Error::from)?;
    Ok((StatusCode::ACCEPTED, Json(handle.snapshot())))
}

/// GET /api/v1/calls/:id
pub async fn handle_get_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CallSnapshot>, AppError> {
    Ok(Json(find_call(&state, id).await?.snapshot()))
}

/// POST /api/v1/calls/:id/start
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CallSnapshot>), AppError> {
    dispatch(&state, id, Input::Start).await
}

/// POST /api/v1/calls/:id/disconnect
pub async fn handle_disconnect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CallSnapshot>), AppError> {
    dispatch(&state, id, Input::Disconnect).await
}

/// POST /api/v1/calls/:id/leave
pub async fn handle_leave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CallSnapshot>), AppError> {
    dispatch(&state, id, Input::Leave).await
}

/// POST /api/v1/calls/:id/repeat
pub async fn handle_repeat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CallSnapshot>), AppError> {
    dispatch(&state, id, Input::Repeat).await
}

/// POST /api/v1/calls/:id/events
///
/// Voice provider webhook. Unknown message types are acknowledged and dropped.
/// Messages from a provider call that `repeat` replaced are dropped by the session.
pub async fn handle_gateway_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(envelope): Json<ServerEnvelope>,
) -> Result<Json<Value>, AppError> {
    let handle = find_call(&state, id).await?;
    let message_type = envelope.message.message_type.clone();
    let provider_call_id = envelope.message.call.as_ref().map(|call| call.id.clone());
    let Some(event) = map_server_message(envelope.message) else {
        debug!("Ignoring {message_type} message for call {id}");
        return Ok(Json(json!({ "received": false })));
    };
    handle
        .send_provider_event(provider_call_id, event)
        .await
        .map_err(anyhow::Error::from)?;
    Ok(Json(json!({ "received": true })))
}
