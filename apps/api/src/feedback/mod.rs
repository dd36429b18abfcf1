//! Feedback generation: engagement gate, rubric scoring, normalization and
//! persistence.

pub mod engagement;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod rubric;
pub mod scorer;
