//! The fixed five-category rubric and the normalization applied to scorer output.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::feedback::{CategoryScore, NewFeedback};

/// Rubric categories, in the order they are presented and padded.
pub const RUBRIC: [&str; 5] = [
    "Communication Skills",
    "Technical Knowledge",
    "Problem Solving",
    "Cultural Fit",
    "Confidence and Clarity",
];

const NOT_ASSESSED_COMMENT: &str = "Not assessed by the scoring service.";

/// Raw structured answer from the scoring service.
///
/// Scores arrive as JSON numbers (possibly fractional); they are rounded but
/// not range-checked here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredFeedback {
    pub total_score: f64,
    pub category_scores: Vec<ScoredCategory>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredCategory {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub comment: String,
}

/// Canonical rubric name for `name`, ignoring case and surrounding whitespace.
fn rubric_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    RUBRIC.iter().copied().find(|r| r.eq_ignore_ascii_case(name))
}

/// Reduces scorer categories to exactly the five rubric entries.
///
/// First occurrence of each name wins and keeps its position; names outside
/// the rubric are dropped; the result is capped at five; any rubric category
/// the scorer skipped is appended with a zero score.
pub fn normalize_categories(categories: &[ScoredCategory]) -> Vec<CategoryScore> {
    let mut seen = HashSet::new();
    let mut normalized: Vec<CategoryScore> = categories
        .iter()
        .filter_map(|c| rubric_name(&c.name).map(|name| (name, c)))
        .filter(|(name, _)| seen.insert(*name))
        .map(|(name, c)| CategoryScore {
            name: name.to_string(),
            score: c.score.round() as i32,
            comment: c.comment.clone(),
        })
        .take(RUBRIC.len())
        .collect();

    for name in RUBRIC {
        if !seen.contains(name) {
            normalized.push(CategoryScore {
                name: name.to_string(),
                score: 0,
                comment: NOT_ASSESSED_COMMENT.to_string(),
            });
        }
    }

    normalized
}

/// Builds the persisted record from a scorer answer.
pub fn feedback_from_scored(
    interview_id: &str,
    user_id: &str,
    scored: ScoredFeedback,
    created_at: DateTime<Utc>,
) -> NewFeedback {
    NewFeedback {
        interview_id: interview_id.to_string(),
        user_id: user_id.to_string(),
        total_score: scored.total_score.round() as i32,
        category_scores: normalize_categories(&scored.category_scores),
        strengths: scored.strengths,
        areas_for_improvement: scored.areas_for_improvement,
        final_assessment: scored.final_assessment,
        created_at,
    }
}

/// Fixed record written when the candidate never engaged with the interview.
pub fn zero_engagement_feedback(
    interview_id: &str,
    user_id: &str,
    created_at: DateTime<Utc>,
) -> NewFeedback {
    let comments = [
        "No meaningful responses were given; the candidate did not engage with the questions.",
        "Technical knowledge could not be assessed without answers.",
        "No problem-solving examples or reasoning were provided.",
        "Cultural fit cannot be evaluated without candidate engagement.",
        "There were no responses from which to judge confidence or clarity.",
    ];

    NewFeedback {
        interview_id: interview_id.to_string(),
        user_id: user_id.to_string(),
        total_score: 0,
        category_scores: RUBRIC
            .iter()
            .zip(comments)
            .map(|(name, comment)| CategoryScore {
                name: name.to_string(),
                score: 0,
                comment: comment.to_string(),
            })
            .collect(),
        strengths: vec![],
        areas_for_improvement: vec![
            "Engagement".to_string(),
            "Communication".to_string(),
            "Participation".to_string(),
        ],
        final_assessment: "The candidate did not meaningfully engage with this interview. \
            Responses were absent, dismissive or too brief to assess qualifications, \
            motivation or suitability for the role."
            .to_string(),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str, score: f64) -> ScoredCategory {
        ScoredCategory {
            name: name.to_string(),
            score,
            comment: format!("{name} comment"),
        }
    }

    fn names(scores: &[CategoryScore]) -> Vec<&str> {
        scores.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_duplicates_keep_first_occurrence_in_order() {
        let input = vec![
            cat("Technical Knowledge", 80.0),
            cat("Communication Skills", 70.0),
            cat("Technical Knowledge", 10.0),
            cat("Problem Solving", 60.0),
            cat("Communication Skills", 5.0),
            cat("Cultural Fit", 75.0),
            cat("Confidence and Clarity", 65.0),
        ];

        let normalized = normalize_categories(&input);
        assert_eq!(
            names(&normalized),
            vec![
                "Technical Knowledge",
                "Communication Skills",
                "Problem Solving",
                "Cultural Fit",
                "Confidence and Clarity",
            ]
        );
        assert_eq!(normalized[0].score, 80);
        assert_eq!(normalized[1].score, 70);
    }

    #[test]
    fn test_always_exactly_five_unique_names() {
        let input: Vec<ScoredCategory> = RUBRIC
            .iter()
            .chain(RUBRIC.iter())
            .map(|n| cat(n, 50.0))
            .collect();
        let normalized = normalize_categories(&input);
        assert_eq!(normalized.len(), 5);
        let unique: HashSet<&str> = names(&normalized).into_iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_missing_categories_are_padded_with_zero() {
        let normalized = normalize_categories(&[cat("Problem Solving", 88.0)]);
        assert_eq!(normalized.len(), 5);
        assert_eq!(normalized[0].name, "Problem Solving");
        assert_eq!(normalized[0].score, 88);
        assert!(normalized[1..].iter().all(|c| c.score == 0));
        assert_eq!(normalized[1].name, "Communication Skills");
    }

    #[test]
    fn test_unknown_names_are_dropped_and_case_is_canonicalized() {
        let normalized = normalize_categories(&[
            cat("Leadership", 99.0),
            cat("  cultural fit ", 72.4),
        ]);
        assert_eq!(normalized[0].name, "Cultural Fit");
        assert_eq!(normalized[0].score, 72);
        assert!(normalized.iter().all(|c| c.name != "Leadership"));
    }

    #[test]
    fn test_zero_engagement_feedback_shape() {
        let feedback = zero_engagement_feedback("X", "Y", Utc::now());
        assert_eq!(feedback.total_score, 0);
        assert_eq!(names(&feedback.category_scores), RUBRIC.to_vec());
        assert!(feedback.category_scores.iter().all(|c| c.score == 0));
        assert!(feedback.strengths.is_empty());
        assert_eq!(feedback.areas_for_improvement.len(), 3);
    }

    #[test]
    fn test_scored_feedback_parses_camel_case_answer() {
        let scored: ScoredFeedback = serde_json::from_value(serde_json::json!({
            "totalScore": 77.6,
            "categoryScores": [{"name": "Problem Solving", "score": 70, "comment": "ok"}],
            "strengths": ["Structured answers"],
            "areasForImprovement": ["Depth"],
            "finalAssessment": "Promising"
        }))
        .unwrap();

        let feedback = feedback_from_scored("X", "Y", scored, Utc::now());
        assert_eq!(feedback.total_score, 78);
        assert_eq!(feedback.category_scores.len(), 5);
        assert_eq!(feedback.strengths, vec!["Structured answers"]);
    }
}
