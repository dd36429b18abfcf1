//! Feedback scorer: pluggable backend that turns a transcript into rubric scores.
//!
//! `AppState` holds an `Arc<dyn FeedbackScorer>`; production wires
//! `LlmFeedbackScorer`, tests substitute canned scorers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::feedback::prompts::{SCORING_PERSONA, SCORING_PROMPT_TEMPLATE};
use crate::feedback::rubric::ScoredFeedback;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{complete_json, LanguageModel, LlmError};
use crate::models::transcript::TranscriptMessage;

#[async_trait]
pub trait FeedbackScorer: Send + Sync {
    async fn score(
        &self,
        interview_id: &str,
        transcript: &[TranscriptMessage],
    ) -> Result<ScoredFeedback, LlmError>;
}

/// Renders the transcript as `- role: content` lines.
pub fn format_transcript(transcript: &[TranscriptMessage]) -> String {
    transcript
        .iter()
        .map(|m| format!("- {}: {}\n", m.role.as_str(), m.content))
        .collect()
}

/// Scores through the language model with the fixed rubric prompt. Makes a
/// single model call per score; give it a client that does not retry.
pub struct LlmFeedbackScorer {
    llm: Arc<dyn LanguageModel>,
}

impl LlmFeedbackScorer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FeedbackScorer for LlmFeedbackScorer {
    async fn score(
        &self,
        interview_id: &str,
        transcript: &[TranscriptMessage],
    ) -> Result<ScoredFeedback, LlmError> {
        let prompt = SCORING_PROMPT_TEMPLATE
            .replace("{interview_id}", interview_id)
            .replace("{analysis_date}", &Utc::now().to_rfc3339())
            .replace("{transcript}", &format_transcript(transcript));

        complete_json(self.llm.as_ref(), &prompt, &json_system(SCORING_PERSONA)).await
    }
}
