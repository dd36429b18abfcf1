// Prompts for transcript scoring.

/// Persona for the scoring call. `json_system` appends the JSON-only rule.
pub const SCORING_PERSONA: &str = "You are a senior technical recruiter who writes \
    interview assessments that hiring managers rely on. Every judgement must be \
    specific to the candidate and backed by what they actually said.";

/// Scoring prompt. Replace `{interview_id}`, `{analysis_date}` and `{transcript}`.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"Assess the mock interview below.

Interview: {interview_id}
Assessed on: {analysis_date}

TRANSCRIPT:
{transcript}

Score the candidate in EXACTLY these five categories, each once, in this order:
1. "Communication Skills": clarity, structure of answers, how concepts were explained
2. "Technical Knowledge": depth and accuracy, command of the relevant stack
3. "Problem Solving": approach to challenges, debugging method, analytical reasoning
4. "Cultural Fit": collaboration signals, growth mindset, professional demeanour
5. "Confidence and Clarity": composure, directness, engagement

SCORING BANDS (apply to every category and to the total):
- 90-100: exceptional, would hire immediately
- 80-89: strong, recommend for hire
- 70-79: good, minor gaps
- 60-69: fair, hire with reservations
- 50-59: below average, significant gaps
- 0-49: poor, major concerns

Reference concrete moments from the transcript in every comment.

Return a JSON object with this EXACT schema:
{
  "totalScore": 0,
  "categoryScores": [
    {"name": "Communication Skills", "score": 0, "comment": "..."},
    {"name": "Technical Knowledge", "score": 0, "comment": "..."},
    {"name": "Problem Solving", "score": 0, "comment": "..."},
    {"name": "Cultural Fit", "score": 0, "comment": "..."},
    {"name": "Confidence and Clarity", "score": 0, "comment": "..."}
  ],
  "strengths": ["..."],
  "areasForImprovement": ["..."],
  "finalAssessment": "..."
}"#;
