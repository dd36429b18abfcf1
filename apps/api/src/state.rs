use std::sync::Arc;

use crate::call::gateway::GatewayConnector;
use crate::call::registry::CallRegistry;
use crate::call::session::SessionDeps;
use crate::config::Config;
use crate::feedback::scorer::FeedbackScorer;
use crate::llm_client::LanguageModel;
use crate::store::{FeedbackStore, InterviewStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub interviews: Arc<dyn InterviewStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    /// Question generation.
    pub llm: Arc<dyn LanguageModel>,
    /// Pluggable feedback scorer. Default: LlmFeedbackScorer over a client that never retries.
    pub scorer: Arc<dyn FeedbackScorer>,
    pub gateways: Arc<dyn GatewayConnector>,
    pub calls: CallRegistry,
}

impl AppState {
    pub fn session_deps(&self) -> SessionDeps {
        SessionDeps {
            interviews: self.interviews.clone(),
            feedback: self.feedback.clone(),
            scorer: self.scorer.clone(),
        }
    }
}
