// Prompts for interview question generation.

/// Persona for question generation, wrapped with the JSON-only instruction.
pub const QUESTION_PERSONA: &str =
    "You are a hiring manager who writes interview questions that real companies ask.";

/// Replace `{amount}`, `{role}`, `{level}`, `{techstack}`, `{type}` and `{focus}`.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate {amount} professional, real-world interview questions for a {role} position.

Role: {role}
Level: {level}
Tech Stack: {techstack}
Type: {type}

Ask what actual companies ask: practical, hands-on scenarios that test real skills and problem-solving.

Question types to include:
{focus}

Requirements:
- Specific to the {role} role and the {techstack} stack
- Real-world scenarios and practical challenges
- Difficulty pitched at the {level} level
- Ask for specific examples and concrete details
- Leave room for follow-up questions

Return ONLY a JSON array of strings, for example:
["How would you debug a memory leak in a Node.js service?", "Tell me about a time you had to learn a new technology quickly."]

Generate exactly {amount} unique questions."#;

pub const TECHNICAL_FOCUS: &str = "- Deep technical knowledge of {techstack}
- System design and architecture challenges
- Code review and debugging scenarios
- Performance optimization problems
- Technology-specific best practices";

pub const BEHAVIORAL_FOCUS: &str = "- Leadership and teamwork scenarios
- Conflict resolution and communication
- Project management and prioritization
- Learning and adaptation experiences
- Problem-solving under pressure";

pub const MIXED_FOCUS: &str = "- Technical skills assessment for {techstack}
- Problem-solving and debugging scenarios
- Team collaboration and communication
- Project experience and challenges
- Real-world implementation experience";
