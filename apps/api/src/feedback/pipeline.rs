//! Feedback generation pipeline.
//!
//! Flow: engagement gate → (zero-score record | scorer → normalize) → upsert.
//! Every failure collapses into `FeedbackOutcome::failed()`; callers decide
//! what a failure means for the user (the call session redirects home).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::feedback::engagement::substantive_answers;
use crate::feedback::rubric::{feedback_from_scored, zero_engagement_feedback};
use crate::feedback::scorer::FeedbackScorer;
use crate::models::transcript::TranscriptMessage;
use crate::store::FeedbackStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<TranscriptMessage>,
    /// When present, the existing document is overwritten instead of allocating a new id.
    #[serde(default)]
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

impl FeedbackOutcome {
    pub fn saved(feedback_id: String) -> Self {
        Self {
            success: true,
            feedback_id: Some(feedback_id),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            feedback_id: None,
        }
    }
}

/// Runs the pipeline and never returns an error: failures are logged and reported
/// as `{success: false}`.
pub async fn generate_feedback(
    store: &dyn FeedbackStore,
    scorer: &dyn FeedbackScorer,
    request: &FeedbackRequest,
) -> FeedbackOutcome {
    match try_generate_feedback(store, scorer, request).await {
        Ok(feedback_id) => FeedbackOutcome::saved(feedback_id),
        Err(e) => {
            error!(
                "Feedback generation failed for interview {}: {e}",
                request.interview_id
            );
            FeedbackOutcome::failed()
        }
    }
}

async fn try_generate_feedback(
    store: &dyn FeedbackStore,
    scorer: &dyn FeedbackScorer,
    request: &FeedbackRequest,
) -> Result<String, AppError> {
    let answers = substantive_answers(&request.transcript);

    let feedback = if answers.is_empty() {
        info!(
            "No substantive answers in interview {}; writing zero-score feedback",
            request.interview_id
        );
        zero_engagement_feedback(&request.interview_id, &request.user_id, Utc::now())
    } else {
        info!(
            "Scoring interview {} ({} messages, {} substantive answers)",
            request.interview_id,
            request.transcript.len(),
            answers.len()
        );
        let scored = scorer
            .score(&request.interview_id, &request.transcript)
            .await
            .map_err(|e| AppError::Llm(format!("Scoring call failed: {e}")))?;
        feedback_from_scored(&request.interview_id, &request.user_id, scored, Utc::now())
    };

    let feedback_id = store
        .upsert_feedback(request.feedback_id.as_deref(), &feedback)
        .await?;

    info!(
        "Saved feedback {feedback_id} for interview {} (total score {})",
        request.interview_id, feedback.total_score
    );
    Ok(feedback_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::feedback::rubric::RUBRIC;
    use crate::feedback::scorer::fakes::{scored, StaticScorer};
    use crate::models::feedback::{Feedback, NewFeedback};
    use crate::models::transcript::Role;
    use crate::store::{MemoryStore, StoreError};

    fn request(transcript: Vec<TranscriptMessage>, feedback_id: Option<&str>) -> FeedbackRequest {
        FeedbackRequest {
            interview_id: "X".to_string(),
            user_id: "Y".to_string(),
            transcript,
            feedback_id: feedback_id.map(str::to_string),
        }
    }

    fn engaged_transcript() -> Vec<TranscriptMessage> {
        vec![
            TranscriptMessage::new(Role::Assistant, "Tell me about your React experience."),
            TranscriptMessage::new(
                Role::User,
                "I have 2 years of React experience building production apps with hooks and context.",
            ),
        ]
    }

    #[tokio::test]
    async fn test_engaged_transcript_is_scored_once_and_persisted() {
        let store = MemoryStore::new();
        let scorer = StaticScorer::returning(scored(&[("Technical Knowledge", 82.0)]));

        let outcome = generate_feedback(&store, &scorer, &request(engaged_transcript(), None)).await;

        assert!(outcome.success);
        assert_eq!(scorer.call_count(), 1);
        let id = outcome.feedback_id.unwrap();
        let stored = store.get_feedback(&id).await.unwrap().unwrap();
        assert_eq!(stored.body.interview_id, "X");
        assert_eq!(stored.body.user_id, "Y");
        assert_eq!(stored.body.total_score, 74);
        assert_eq!(stored.body.category_scores.len(), 5);
    }

    #[tokio::test]
    async fn test_no_engagement_short_circuits_to_zero_score() {
        let store = MemoryStore::new();
        let scorer = StaticScorer::returning(scored(&[]));
        let transcript = vec![
            TranscriptMessage::new(Role::User, "ok"),
            TranscriptMessage::new(Role::User, "Hello, thank you for having me"),
            TranscriptMessage::new(Role::Assistant, "Let us begin with your background in detail."),
        ];

        let outcome = generate_feedback(&store, &scorer, &request(transcript, None)).await;

        assert!(outcome.success);
        assert_eq!(scorer.call_count(), 0);
        let stored = store
            .get_feedback(outcome.feedback_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.body.total_score, 0);
        assert_eq!(stored.body.category_scores.len(), 5);
        assert!(stored.body.category_scores.iter().all(|c| c.score == 0));
    }

    #[tokio::test]
    async fn test_duplicate_categories_are_normalized_before_persisting() {
        let store = MemoryStore::new();
        let scorer = StaticScorer::returning(scored(&[
            ("Communication Skills", 70.0),
            ("Communication Skills", 20.0),
            ("Technical Knowledge", 80.0),
            ("Problem Solving", 75.0),
            ("Technical Knowledge", 1.0),
            ("Cultural Fit", 60.0),
            ("Confidence and Clarity", 65.0),
        ]));

        let outcome = generate_feedback(&store, &scorer, &request(engaged_transcript(), None)).await;
        let stored = store
            .get_feedback(outcome.feedback_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();

        let names: Vec<&str> = stored.body.category_scores.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, RUBRIC.to_vec());
        assert_eq!(stored.body.category_scores[0].score, 70);
        assert_eq!(stored.body.category_scores[1].score, 80);
    }

    #[tokio::test]
    async fn test_supplied_feedback_id_is_overwritten() {
        let store = MemoryStore::new();
        let scorer = StaticScorer::returning(scored(&[("Problem Solving", 90.0)]));

        let first = generate_feedback(&store, &scorer, &request(vec![], Some("fb-1"))).await;
        let second =
            generate_feedback(&store, &scorer, &request(engaged_transcript(), Some("fb-1"))).await;

        assert_eq!(first.feedback_id.as_deref(), Some("fb-1"));
        assert_eq!(second.feedback_id.as_deref(), Some("fb-1"));
        let stored = store.get_feedback("fb-1").await.unwrap().unwrap();
        assert_eq!(stored.body.total_score, 74);
    }

    #[tokio::test]
    async fn test_scorer_failure_reports_unsuccessful_and_writes_nothing() {
        let store = MemoryStore::new();
        let scorer = StaticScorer::failing();

        let outcome = generate_feedback(&store, &scorer, &request(engaged_transcript(), None)).await;

        assert_eq!(outcome, FeedbackOutcome::failed());
        assert!(store.find_feedback("X", "Y").await.unwrap().is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl FeedbackStore for BrokenStore {
        async fn upsert_feedback(
            &self,
            _id: Option<&str>,
            _feedback: &NewFeedback,
        ) -> Result<String, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_feedback(
            &self,
            _interview_id: &str,
            _user_id: &str,
        ) -> Result<Option<Feedback>, StoreError> {
            Ok(None)
        }

        async fn delete_feedback_for_interview(&self, _interview_id: &str) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_reports_unsuccessful() {
        let scorer = Arc::new(StaticScorer::returning(scored(&[])));
        let outcome = generate_feedback(&BrokenStore, scorer.as_ref(), &request(vec![], None)).await;
        assert!(!outcome.success);
        assert!(outcome.feedback_id.is_none());
    }

    #[test]
    fn test_outcome_serializes_like_the_client_expects() {
        let json = serde_json::to_value(FeedbackOutcome::saved("abc".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "feedbackId": "abc"}));
        let json = serde_json::to_value(FeedbackOutcome::failed()).unwrap();
        assert_eq!(json, serde_json::json!({"success": false}));
    }
}
