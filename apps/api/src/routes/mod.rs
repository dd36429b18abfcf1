pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::call::handlers as calls;
use crate::feedback::handlers as feedback;
use crate::interviews::handlers as interviews;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interviews API
        .route(
            "/api/v1/interviews",
            get(interviews::handle_list_user_interviews),
        )
        .route(
            "/api/v1/interviews/generate",
            post(interviews::handle_generate_interview),
        )
        .route(
            "/api/v1/interviews/latest",
            get(interviews::handle_latest_interviews),
        )
        .route(
            "/api/v1/interviews/:id",
            get(interviews::handle_get_interview).delete(interviews::handle_delete_interview),
        )
        .route(
            "/api/v1/interviews/:id/complete",
            post(interviews::handle_complete_interview),
        )
        .route(
            "/api/v1/interviews/:id/feedback",
            get(feedback::handle_get_feedback),
        )
        // Feedback API
        .route("/api/v1/feedback", post(feedback::handle_create_feedback))
        // Call session API
        .route("/api/v1/calls", post(calls::handle_create_call))
        .route("/api/v1/calls/:id", get(calls::handle_get_call))
        .route("/api/v1/calls/:id/start", post(calls::handle_start))
        .route("/api/v1/calls/:id/disconnect", post(calls::handle_disconnect))
        .route("/api/v1/calls/:id/leave", post(calls::handle_leave))
        .route("/api/v1/calls/:id/repeat", post(calls::handle_repeat))
        .route("/api/v1/calls/:id/events", post(calls::handle_gateway_event))
        .with_state(state)
}
