//! Voice gateway contract consumed by call sessions.
//!
//! A session owns exactly one `VoiceGateway` handle, created for it by a
//! `GatewayConnector`. Events flowing back from the provider are normalised to
//! `GatewayEvent` before they reach the state machine.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::call::persona::AssistantConfig;
use crate::models::transcript::Role;

/// Variables interpolated by the provider into workflow or assistant prompts.
pub type CallVariables = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Voice API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No active call to stop")]
    NoActiveCall,
}

/// What the gateway should connect the caller to.
#[derive(Debug, Clone, PartialEq)]
pub enum StartTarget {
    /// Pre-configured provider workflow (generic "generate new interview" calls).
    Workflow { workflow_id: String },
    /// Inline interviewer persona (role-specific calls).
    Assistant(Box<AssistantConfig>),
}

/// A transcript message as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub message_type: String,
    pub transcript_type: Option<String>,
    pub role: Role,
    pub transcript: String,
}

impl TranscriptEvent {
    pub fn is_final(&self) -> bool {
        self.message_type == "transcript" && self.transcript_type.as_deref() == Some("final")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    CallStart,
    CallEnd,
    Message(TranscriptEvent),
    SpeechStart,
    SpeechEnd,
    /// Error text if the provider sent any.
    Error(Option<String>),
}

/// Provider call ids started by one session, oldest first.
///
/// `repeat()` starts a fresh provider call under the same session, and the
/// previous call keeps reporting for a while after it is stopped. Those late
/// events carry the old id and must not reach the state machine.
#[derive(Debug, Default)]
pub struct AttemptLog {
    ids: Vec<String>,
}

impl AttemptLog {
    pub fn record(&mut self, provider_call_id: String) {
        self.ids.push(provider_call_id);
    }

    /// True when a later start replaced the attempt `provider_call_id` belongs to.
    /// Ids not seen yet count as current: their start may still be in flight.
    pub fn is_superseded(&self, provider_call_id: &str) -> bool {
        match self.ids.split_last() {
            Some((_, earlier)) => earlier.iter().any(|id| id == provider_call_id),
            None => false,
        }
    }
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn start(&self, target: &StartTarget, variables: &CallVariables) -> Result<(), GatewayError>;

    async fn stop(&self) -> Result<(), GatewayError>;

    /// Whether events tagged with `provider_call_id` come from a replaced attempt.
    async fn is_superseded(&self, provider_call_id: &str) -> bool;
}

/// Hands each new session its own gateway handle.
pub trait GatewayConnector: Send + Sync {
    fn connect(&self, call_id: Uuid) -> Arc<dyn VoiceGateway>;
}
