// Prompt fragments shared by every module that calls the model.
// Module-specific prompts live in a prompts.rs next to their caller.

/// Appended to system prompts whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds a system prompt from a persona line plus the JSON-only instruction.
pub fn json_system(persona: &str) -> String {
    format!("{persona} {JSON_ONLY_INSTRUCTION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_instruction() {
        let system = json_system("You are a recruiter.");
        assert!(system.starts_with("You are a recruiter."));
        assert!(system.ends_with(JSON_ONLY_INSTRUCTION));
    }
}
