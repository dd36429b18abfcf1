//! Engagement gate: decides whether a transcript contains anything worth scoring.

use crate::models::transcript::{Role, TranscriptMessage};

/// Candidate messages at or below this many characters (after trimming) never count.
pub const MIN_ANSWER_CHARS: usize = 10;

/// Case-insensitive fragments that mark a message as greeting or closing filler.
const FILLER_FRAGMENTS: [&str; 3] = ["hello", "hi", "thank you"];

/// Returns the candidate messages that count as real answers.
///
/// A message counts when it comes from the user, is longer than
/// `MIN_ANSWER_CHARS` once trimmed, and contains none of the filler fragments.
/// The fragment match is a plain substring test, so it is deliberately strict.
pub fn substantive_answers(transcript: &[TranscriptMessage]) -> Vec<&TranscriptMessage> {
    transcript
        .iter()
        .filter(|msg| msg.role == Role::User)
        .filter(|msg| msg.content.trim().chars().count() > MIN_ANSWER_CHARS)
        .filter(|msg| !is_filler(&msg.content))
        .collect()
}

fn is_filler(content: &str) -> bool {
    let lower = content.to_lowercase();
    FILLER_FRAGMENTS.iter().any(|f| lower.contains(f))
}
