//! Interview generation: question list from the model, deterministic cover
//! image, and the stored `Interview` record.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interviews::prompts::{
    BEHAVIORAL_FOCUS, MIXED_FOCUS, QUESTION_PERSONA, QUESTION_PROMPT_TEMPLATE, TECHNICAL_FOCUS,
};
use crate::llm_client::prompts::json_system;
use crate::llm_client::{complete_json, LanguageModel, LlmError};
use crate::models::interview::{split_tech_stack, Interview, InterviewStatus, InterviewType};
use crate::seed::seeded_index;
use crate::store::{new_document_id, InterviewStore};

pub const DEFAULT_DURATION_MINUTES: u32 = 10;

const COVERS: [&str; 12] = [
    "adobe", "amazon", "facebook", "hostinger", "pinterest", "quora", "reddit", "skype",
    "spotify", "telegram", "tiktok", "yahoo",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInterviewRequest {
    #[serde(rename = "type")]
    pub interview_type: String,
    pub role: String,
    pub level: String,
    /// Comma-joined, as the interview form sends it.
    pub techstack: String,
    pub amount: usize,
    pub userid: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Cover image path picked from the interview id.
pub fn cover_image_for(interview_id: &str) -> String {
    let cover = COVERS[seeded_index(interview_id, 0, COVERS.len())];
    format!("/covers/{cover}.png")
}

pub fn fallback_questions(role: &str, amount: usize) -> Vec<String> {
    let mut questions = vec![
        format!("Tell me about your experience with {role}"),
        "What challenges have you faced in your previous projects?".to_string(),
        "How do you approach problem-solving in your work?".to_string(),
        format!("What interests you most about this {role} position?"),
        "Describe a time when you had to learn a new technology quickly.".to_string(),
    ];
    questions.truncate(amount);
    questions
}

pub fn build_question_prompt(
    interview_type: InterviewType,
    role: &str,
    level: &str,
    techstack: &str,
    amount: usize,
) -> String {
    let focus = match interview_type {
        InterviewType::Technical => TECHNICAL_FOCUS,
        InterviewType::Behavioral => BEHAVIORAL_FOCUS,
        InterviewType::Mixed => MIXED_FOCUS,
    };
    QUESTION_PROMPT_TEMPLATE
        .replace("{focus}", focus)
        .replace("{amount}", &amount.to_string())
        .replace("{role}", role)
        .replace("{level}", level)
        .replace("{techstack}", techstack)
        .replace("{type}", interview_type.as_str())
}

/// Asks the model for questions. Unparsable or empty answers fall back to a
/// fixed generic list; transport and API failures are returned.
pub async fn generate_questions(
    llm: &dyn LanguageModel,
    interview_type: InterviewType,
    role: &str,
    level: &str,
    techstack: &str,
    amount: usize,
) -> Result<Vec<String>, LlmError> {
    let prompt = build_question_prompt(interview_type, role, level, techstack, amount);
    let system = json_system(QUESTION_PERSONA);

    let questions = match complete_json::<Vec<String>>(llm, &prompt, &system).await {
        Ok(questions) => questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect::<Vec<_>>(),
        Err(LlmError::Parse(e)) => {
            warn!("Question list was not a JSON string array ({e}); using fallback questions");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    if questions.is_empty() {
        warn!("No usable questions generated for {role}; using fallback questions");
        return Ok(fallback_questions(role, amount));
    }
    Ok(questions)
}

/// Generates questions and persists a pending interview. Returns the new record.
pub async fn create_interview(
    store: &dyn InterviewStore,
    llm: &dyn LanguageModel,
    request: GenerateInterviewRequest,
) -> Result<Interview, AppError> {
    if request.role.trim().is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if request.userid.trim().is_empty() {
        return Err(AppError::Validation("userid cannot be empty".to_string()));
    }
    if request.amount == 0 {
        return Err(AppError::Validation("amount must be at least 1".to_string()));
    }
    let interview_type: InterviewType = request
        .interview_type
        .parse()
        .map_err(AppError::Validation)?;

    let questions = generate_questions(
        llm,
        interview_type,
        &request.role,
        &request.level,
        &request.techstack,
        request.amount,
    )
    .await
    .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let id = new_document_id();
    let interview = Interview {
        cover_image: cover_image_for(&id),
        id,
        user_id: request.userid,
        role: request.role,
        interview_type,
        level: request.level,
        tech_stack: split_tech_stack(&request.techstack),
        questions,
        duration: request.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        status: InterviewStatus::Pending,
        completed_at: None,
        profile_picture_url: request.profile_picture_url,
        created_at: Utc::now(),
    };

    store.create_interview(&interview).await?;
    info!(
        "Created {} interview {} with {} questions",
        interview.interview_type,
        interview.id,
        interview.questions.len()
    );
    Ok(interview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fakes::CannedModel;
    use crate::store::MemoryStore;

    fn request(amount: usize, duration: Option<u32>) -> GenerateInterviewRequest {
        GenerateInterviewRequest {
            interview_type: "Technical".to_string(),
            role: "Frontend Developer".to_string(),
            level: "Junior".to_string(),
            techstack: "React, TypeScript".to_string(),
            amount,
            userid: "u-1".to_string(),
            profile_picture_url: None,
            duration,
        }
    }

    #[test]
    fn test_cover_image_is_deterministic_and_known() {
        let cover = cover_image_for("iv-123");
        assert_eq!(cover, cover_image_for("iv-123"));
        assert!(COVERS.iter().any(|c| cover == format!("/covers/{c}.png")));
        // 'x' = 120, 120 % 12 = 0
        assert_eq!(cover_image_for("x"), "/covers/adobe.png");
    }

    #[test]
    fn test_fallback_is_truncated_to_amount() {
        let questions = fallback_questions("SRE", 3);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "Tell me about your experience with SRE");
        assert_eq!(fallback_questions("SRE", 10).len(), 5);
    }

    #[test]
    fn test_prompt_picks_focus_by_type() {
        let prompt = build_question_prompt(InterviewType::Behavioral, "PM", "Senior", "Jira", 4);
        assert!(prompt.contains("Conflict resolution"));
        assert!(prompt.contains("Generate exactly 4 unique questions."));
        assert!(!prompt.contains("{focus}"));

        let prompt = build_question_prompt(InterviewType::Technical, "SWE", "Mid", "Go", 2);
        assert!(prompt.contains("Deep technical knowledge of Go"));
    }

    #[tokio::test]
    async fn test_unparsable_answer_falls_back() {
        let llm = CannedModel::answering(&["Here are some questions: 1. Why?"]);
        let questions =
            generate_questions(&llm, InterviewType::Mixed, "QA", "Junior", "Selenium", 2)
                .await
                .unwrap();
        assert_eq!(questions, fallback_questions("QA", 2));
    }

    #[tokio::test]
    async fn test_empty_array_falls_back() {
        let llm = CannedModel::answering(&["[]"]);
        let questions =
            generate_questions(&llm, InterviewType::Mixed, "QA", "Junior", "Selenium", 5)
                .await
                .unwrap();
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn test_model_failure_is_returned() {
        let llm = CannedModel::failing("overloaded");
        let result =
            generate_questions(&llm, InterviewType::Mixed, "QA", "Junior", "Selenium", 2).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_interview_persists_pending_record() {
        let store = MemoryStore::new();
        let llm = CannedModel::answering(&[r#"["What is JSX?", "Explain useEffect."]"#]);

        let interview = create_interview(&store, &llm, request(2, None)).await.unwrap();

        assert_eq!(interview.questions, vec!["What is JSX?", "Explain useEffect."]);
        assert_eq!(interview.tech_stack, vec!["React", "TypeScript"]);
        assert_eq!(interview.duration, DEFAULT_DURATION_MINUTES);
        assert_eq!(interview.status, InterviewStatus::Pending);
        assert_eq!(interview.cover_image, cover_image_for(&interview.id));
        let stored = store.get_interview(&interview.id).await.unwrap();
        assert_eq!(stored, Some(interview));
    }

    #[tokio::test]
    async fn test_create_interview_keeps_explicit_duration() {
        let store = MemoryStore::new();
        let llm = CannedModel::answering(&[r#"["Q1"]"#]);
        let interview = create_interview(&store, &llm, request(1, Some(25))).await.unwrap();
        assert_eq!(interview.duration, 25);
    }

    #[tokio::test]
    async fn test_create_interview_rejects_unknown_type() {
        let store = MemoryStore::new();
        let llm = CannedModel::answering(&[]);
        let mut bad = request(2, None);
        bad.interview_type = "Panel".to_string();

        let err = create_interview(&store, &llm, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(llm.calls(), 0);
    }
}
