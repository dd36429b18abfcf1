use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: i32,
    pub comment: String,
}

/// Feedback content as written by the pipeline; the store assigns or reuses the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub interview_id: String,
    pub user_id: String,
    pub total_score: i32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    #[serde(flatten)]
    pub body: NewFeedback,
}

#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: String,
    pub interview_id: String,
    pub user_id: String,
    pub total_score: i32,
    pub category_scores: Json<Vec<CategoryScore>>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
    pub created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            body: NewFeedback {
                interview_id: row.interview_id,
                user_id: row.user_id,
                total_score: row.total_score,
                category_scores: row.category_scores.0,
                strengths: row.strengths,
                areas_for_improvement: row.areas_for_improvement,
                final_assessment: row.final_assessment,
                created_at: row.created_at,
            },
        }
    }
}
