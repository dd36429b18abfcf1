//! Interviewer persona synthesis for role-specific calls.
//!
//! Name and greeting are picked with `seeded_index` from the interview id, so the
//! same interview always meets the same interviewer.

use serde::Serialize;

use crate::call::prompts::{FIRST_MESSAGE_TEMPLATE, INTERVIEWER_SYSTEM_TEMPLATE};
use crate::seed::seeded_index;

const GREETING_SALT: u64 = 0;
const NAME_SALT: u64 = 1000;

const INTERVIEWER_NAMES: [&str; 48] = [
    "Hailey", "Sarah", "Emma", "Olivia", "Sophia", "Isabella", "Ava", "Mia", "Charlotte",
    "Amelia", "Harper", "Evelyn", "Abigail", "Emily", "Elizabeth", "Ella", "Avery", "Sofia",
    "Camila", "Aria", "Scarlett", "Victoria", "Madison", "Luna", "Grace", "Chloe", "Penelope",
    "Layla", "Riley", "Nora", "Lily", "Eleanor", "Hannah", "Stella", "Natalie", "Zoe", "Leah",
    "Hazel", "Violet", "Aurora", "Audrey", "Claire", "Lucy", "Anna", "Caroline", "Maya",
    "Alice", "Ruby",
];

const GREETINGS: [&str; 12] = [
    "Hello! Thanks for taking the time to speak with me today.",
    "Hi there! I'm glad we could make this work.",
    "Good to meet you! I've been looking forward to our conversation.",
    "Welcome! Thanks for joining me for this interview.",
    "Hello! It's great to have you here today.",
    "Hi! I'm excited to get to know you a bit better.",
    "Good to see you! Let's talk about your professional journey.",
    "Hello! I'm keen to hear about your skills and experience.",
    "Hi there! Thanks for making time for this.",
    "Welcome! I'm looking forward to understanding your background.",
    "Hello! Let's make this a good conversation.",
    "Hi! Let's start by getting to know each other.",
];

pub fn select_persona_name(interview_id: &str) -> &'static str {
    INTERVIEWER_NAMES[seeded_index(interview_id, NAME_SALT, INTERVIEWER_NAMES.len())]
}

pub fn select_greeting(interview_id: &str) -> &'static str {
    GREETINGS[seeded_index(interview_id, GREETING_SALT, GREETINGS.len())]
}

/// Renders questions as a newline-separated bullet list.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inline assistant definition sent to the voice gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: TranscriberConfig,
    pub voice: VoiceConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ModelMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMessage {
    pub role: String,
    pub content: String,
}

/// Builds the full interviewer configuration for one call.
pub fn build_interviewer(agent_name: &str, greeting: &str, questions: &[String]) -> AssistantConfig {
    let system_prompt = INTERVIEWER_SYSTEM_TEMPLATE
        .replace("{agent_name}", agent_name)
        .replace("{questions}", &format_questions(questions));

    AssistantConfig {
        name: agent_name.to_string(),
        first_message: FIRST_MESSAGE_TEMPLATE
            .replace("{greeting}", greeting)
            .replace("{agent_name}", agent_name),
        transcriber: TranscriberConfig {
            provider: "deepgram".to_string(),
            model: "nova-2".to_string(),
            language: "en".to_string(),
        },
        voice: VoiceConfig {
            provider: "11labs".to_string(),
            voice_id: "sarah".to_string(),
            stability: 0.4,
            similarity_boost: 0.8,
            speed: 0.9,
            style: 0.5,
            use_speaker_boost: true,
        },
        model: ModelConfig {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            messages: vec![ModelMessage {
                role: "system".to_string(),
                content: system_prompt,
            }],
        },
    }
}

/// Persona for `interview_id`: seeded name and greeting plus the question list.
pub fn interviewer_for(interview_id: &str, questions: &[String]) -> AssistantConfig {
    build_interviewer(
        select_persona_name(interview_id),
        select_greeting(interview_id),
        questions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_deterministic_per_interview() {
        for id in ["a", "interview-42", "Zk81hQmN0pXw", ""] {
            assert_eq!(select_persona_name(id), select_persona_name(id));
            assert_eq!(select_greeting(id), select_greeting(id));
        }
    }

    #[test]
    fn test_name_and_greeting_use_distinct_seeds() {
        let id = "x";
        // 'x' = 120: greeting index 120 % 12 = 0, name index 1120 % 48 = 16.
        assert_eq!(select_greeting(id), GREETINGS[0]);
        assert_eq!(select_persona_name(id), INTERVIEWER_NAMES[16]);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = INTERVIEWER_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), INTERVIEWER_NAMES.len());
    }

    #[test]
    fn test_format_questions_bullets() {
        let questions = vec!["What is ownership?".to_string(), "Explain Send.".to_string()];
        assert_eq!(format_questions(&questions), "- What is ownership?\n- Explain Send.");
        assert_eq!(format_questions(&[]), "");
    }

    #[test]
    fn test_interviewer_embeds_questions_and_persona() {
        let questions = vec!["How does async work in Rust?".to_string()];
        let config = interviewer_for("iv-7", &questions);

        assert_eq!(config.name, select_persona_name("iv-7"));
        assert!(config.first_message.starts_with(select_greeting("iv-7")));
        assert!(config.first_message.contains(&config.name));
        let system = &config.model.messages[0].content;
        assert!(system.contains("- How does async work in Rust?"));
        assert!(system.contains(&config.name));
        assert!(!system.contains("{questions}"));
    }

    #[test]
    fn test_interviewer_serializes_camel_case() {
        let json = serde_json::to_value(build_interviewer("Nora", "Hi!", &[])).unwrap();
        assert_eq!(json["firstMessage"].as_str().unwrap().split(' ').next(), Some("Hi!"));
        assert_eq!(json["voice"]["voiceId"], "sarah");
        assert_eq!(json["voice"]["useSpeakerBoost"], true);
        assert_eq!(json["transcriber"]["model"], "nova-2");
    }
}
