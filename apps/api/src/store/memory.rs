use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{new_document_id, FeedbackStore, InterviewStore, StoreError};
use crate::models::feedback::{Feedback, NewFeedback};
use crate::models::interview::{Interview, InterviewStatus};

/// Process-local document store. Used when no database is configured and by tests.
#[derive(Default)]
pub struct MemoryStore {
    interviews: RwLock<HashMap<String, Interview>>,
    // Vec keeps insertion order so `find_feedback` returns the first write.
    feedback: RwLock<Vec<Feedback>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get_feedback(&self, id: &str) -> Result<Option<Feedback>, StoreError> {
        Ok(self.feedback.read().await.iter().find(|f| f.id == id).cloned())
    }
}

fn newest_first(mut interviews: Vec<Interview>) -> Vec<Interview> {
    interviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    interviews
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError> {
        self.interviews
            .write()
            .await
            .insert(interview.id.clone(), interview.clone());
        Ok(())
    }

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError> {
        Ok(self.interviews.read().await.get(id).cloned())
    }

    async fn list_interviews_by_user(&self, user_id: &str) -> Result<Vec<Interview>, StoreError> {
        let interviews = self.interviews.read().await;
        Ok(newest_first(
            interviews
                .values()
                .filter(|i| i.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_latest_interviews(
        &self,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Interview>, StoreError> {
        let interviews = self.interviews.read().await;
        let mut latest = newest_first(
            interviews
                .values()
                .filter(|i| i.user_id != exclude_user_id)
                .cloned()
                .collect(),
        );
        latest.truncate(limit);
        Ok(latest)
    }

    async fn mark_interview_completed(&self, id: &str) -> Result<(), StoreError> {
        let mut interviews = self.interviews.write().await;
        let interview = interviews.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: "interviews",
            id: id.to_string(),
        })?;
        interview.status = InterviewStatus::Completed;
        interview.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_interview(&self, id: &str) -> Result<(), StoreError> {
        self.interviews.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn upsert_feedback(
        &self,
        id: Option<&str>,
        feedback: &NewFeedback,
    ) -> Result<String, StoreError> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        let mut docs = self.feedback.write().await;
        let doc = Feedback {
            id: id.clone(),
            body: feedback.clone(),
        };
        match docs.iter_mut().find(|f| f.id == id) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
        Ok(id)
    }

    async fn find_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        Ok(self
            .feedback
            .read()
            .await
            .iter()
            .find(|f| f.body.interview_id == interview_id && f.body.user_id == user_id)
            .cloned())
    }

    async fn delete_feedback_for_interview(&self, interview_id: &str) -> Result<u64, StoreError> {
        let mut docs = self.feedback.write().await;
        let before = docs.len();
        docs.retain(|f| f.body.interview_id != interview_id);
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, Utc};

    use crate::models::feedback::NewFeedback;
    use crate::models::interview::{Interview, InterviewStatus, InterviewType};

    pub fn interview(id: &str, user_id: &str, created_at: DateTime<Utc>) -> Interview {
        Interview {
            id: id.to_string(),
            user_id: user_id.to_string(),
            role: "Backend Engineer".to_string(),
            interview_type: InterviewType::Technical,
            level: "Senior".to_string(),
            tech_stack: vec!["Rust".to_string(), "Postgres".to_string()],
            questions: vec![
                "How do you design an idempotent API?".to_string(),
                "Walk me through debugging a deadlock.".to_string(),
            ],
            duration: 5,
            status: InterviewStatus::Pending,
            completed_at: None,
            cover_image: "/covers/adobe.png".to_string(),
            profile_picture_url: None,
            created_at,
        }
    }

    pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(minutes)
    }

    pub fn feedback(interview_id: &str, user_id: &str, total_score: i32) -> NewFeedback {
        NewFeedback {
            interview_id: interview_id.to_string(),
            user_id: user_id.to_string(),
            total_score,
            category_scores: vec![],
            strengths: vec![],
            areas_for_improvement: vec![],
            final_assessment: "ok".to_string(),
            created_at: Utc::now(),
        }
    }
}
