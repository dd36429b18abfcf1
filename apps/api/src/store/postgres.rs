use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use super::{new_document_id, FeedbackStore, InterviewStore, StoreError};
use crate::models::feedback::{Feedback, FeedbackRow, NewFeedback};
use crate::models::interview::{Interview, InterviewRow};

/// Postgres-backed store. Schema lives in `migrations/0001_init.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_interview(row: InterviewRow) -> Result<Interview, StoreError> {
    let id = row.id.clone();
    Interview::try_from(row).map_err(|reason| StoreError::Corrupt {
        collection: "interviews",
        id,
        reason,
    })
}

fn to_interviews(rows: Vec<InterviewRow>) -> Result<Vec<Interview>, StoreError> {
    rows.into_iter().map(to_interview).collect()
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, user_id, role, interview_type, level, tech_stack, questions,
                 duration_minutes, status, completed_at, cover_image, profile_picture_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&interview.id)
        .bind(&interview.user_id)
        .bind(&interview.role)
        .bind(interview.interview_type.as_str())
        .bind(&interview.level)
        .bind(&interview.tech_stack)
        .bind(&interview.questions)
        .bind(interview.duration as i32)
        .bind(interview.status.as_str())
        .bind(interview.completed_at)
        .bind(&interview.cover_image)
        .bind(&interview.profile_picture_url)
        .bind(interview.created_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted interview {} for user {}", interview.id, interview.user_id);
        Ok(())
    }

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError> {
        sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(to_interview)
            .transpose()
    }

    async fn list_interviews_by_user(&self, user_id: &str) -> Result<Vec<Interview>, StoreError> {
        let rows = sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        to_interviews(rows)
    }

    async fn list_latest_interviews(
        &self,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Interview>, StoreError> {
        let rows = sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE user_id <> $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(exclude_user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        to_interviews(rows)
    }

    async fn mark_interview_completed(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE interviews SET status = 'completed', completed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: "interviews",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_interview(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn upsert_feedback(
        &self,
        id: Option<&str>,
        feedback: &NewFeedback,
    ) -> Result<String, StoreError> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);

        // Single statement: the document is either fully replaced or untouched.
        sqlx::query(
            r#"
            INSERT INTO feedback
                (id, interview_id, user_id, total_score, category_scores, strengths,
                 areas_for_improvement, final_assessment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                interview_id = EXCLUDED.interview_id,
                user_id = EXCLUDED.user_id,
                total_score = EXCLUDED.total_score,
                category_scores = EXCLUDED.category_scores,
                strengths = EXCLUDED.strengths,
                areas_for_improvement = EXCLUDED.areas_for_improvement,
                final_assessment = EXCLUDED.final_assessment,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&id)
        .bind(&feedback.interview_id)
        .bind(&feedback.user_id)
        .bind(feedback.total_score)
        .bind(Json(&feedback.category_scores))
        .bind(&feedback.strengths)
        .bind(&feedback.areas_for_improvement)
        .bind(&feedback.final_assessment)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "SELECT * FROM feedback WHERE interview_id = $1 AND user_id = $2 ORDER BY created_at LIMIT 1",
        )
        .bind(interview_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Feedback::from))
    }

    async fn delete_feedback_for_interview(&self, interview_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM feedback WHERE interview_id = $1")
            .bind(interview_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
