//! Document store seam for interviews and feedback.
//!
//! Handlers, the feedback pipeline and call sessions only see the two traits
//! below. `AppState` carries them as `Arc<dyn ...>`; `main` picks Postgres when
//! `DATABASE_URL` is set and the in-memory store otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::feedback::{Feedback, NewFeedback};
use crate::models::interview::Interview;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("Corrupt {collection} document {id}: {reason}")]
    Corrupt {
        collection: &'static str,
        id: String,
        reason: String,
    },
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Persists a new interview. The id on the record is used as-is.
    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError>;

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError>;

    /// Interviews owned by `user_id`, newest first.
    async fn list_interviews_by_user(&self, user_id: &str) -> Result<Vec<Interview>, StoreError>;

    /// Interviews owned by anyone except `user_id`, newest first.
    async fn list_latest_interviews(
        &self,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Interview>, StoreError>;

    /// Sets `status = completed` and stamps `completed_at`. Safe to repeat.
    async fn mark_interview_completed(&self, id: &str) -> Result<(), StoreError>;

    async fn delete_interview(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Writes the whole record in one step. With `id = Some(..)` the document is
    /// overwritten in place, otherwise a fresh id is allocated. Returns the id.
    async fn upsert_feedback(
        &self,
        id: Option<&str>,
        feedback: &NewFeedback,
    ) -> Result<String, StoreError>;

    /// First feedback for the (interview, user) pair, if any.
    async fn find_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError>;

    /// Removes every feedback document for the interview; returns how many went.
    async fn delete_feedback_for_interview(&self, interview_id: &str) -> Result<u64, StoreError>;
}

/// Allocates a document id for stores that do not generate their own.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
