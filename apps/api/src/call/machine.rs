//! Call session state machine.
//!
//! `CallMachine::apply` is the single transition function: it takes one
//! `Input`, mutates the session and returns the side effects the driver must
//! perform, in order. Nothing in here touches the network, a clock or a task;
//! `call::session` owns those and feeds their results back as further inputs.
//!
//! ```text
//! INACTIVE ──start──▶ CONNECTING ──call-start──▶ ACTIVE ──(tick to 0 | call-end | disconnect | leave)──▶ FINISHED
//!     ▲                    │                        │
//!     └── start failed / unexpected error / repeat ─┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call::classify::{
    classify_start_failure, classify_transport_error, start_failure_alert, transport_error_alert,
    StartFailure, TransportError,
};
use crate::call::gateway::{CallVariables, GatewayEvent, StartTarget};
use crate::call::persona::{format_questions, interviewer_for};
use crate::call::transcript::Transcript;
use crate::feedback::pipeline::{FeedbackOutcome, FeedbackRequest};
use crate::models::transcript::TranscriptMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// Generic call that collects interview parameters; no feedback.
    Generate,
    /// Role-specific interview with a synthesized persona.
    Interview,
}

/// Where the caller should be sent next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum Destination {
    Home,
    Feedback {
        #[serde(rename = "interviewId")]
        interview_id: String,
    },
}

/// Everything a session knows about the call it is running.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub mode: CallMode,
    pub user_name: String,
    pub user_id: Option<String>,
    pub interview_id: Option<String>,
    pub feedback_id: Option<String>,
    pub questions: Vec<String>,
    /// Countdown length in minutes; 0 disables the countdown.
    pub duration_minutes: u32,
    pub workflow_id: Option<String>,
    pub repeat_grace: Duration,
}

impl CallContext {
    fn full_duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Start,
    /// The gateway refused to start; carries its error text.
    StartFailed(String),
    Gateway(GatewayEvent),
    Tick,
    Disconnect,
    Leave,
    Repeat,
    /// The repeat grace delay elapsed.
    RestartDue,
    FeedbackCompleted(FeedbackOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartGateway {
        target: StartTarget,
        variables: CallVariables,
    },
    StopGateway,
    /// Begin one-second ticks, first tick one second from now.
    ArmTimer,
    CancelTimer,
    ScheduleRestart(Duration),
    CancelRestart,
    /// Mark the interview completed, then run the feedback pipeline.
    GenerateFeedback(FeedbackRequest),
    Navigate(Destination),
    Alert(String),
}

/// Read-only view of a session, serialized for clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    pub status: CallStatus,
    pub transcript: Vec<TranscriptMessage>,
    pub last_message: Option<String>,
    pub time_remaining_seconds: u64,
    pub is_speaking: bool,
    pub is_repeating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Destination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

#[derive(Debug)]
pub struct CallMachine {
    context: CallContext,
    status: CallStatus,
    transcript: Transcript,
    time_remaining: u64,
    is_speaking: bool,
    is_repeating: bool,
    timer_armed: bool,
    // Per call attempt: gateway stop and finish handling happen at most once.
    stop_requested: bool,
    finish_handled: bool,
    feedback_pending: bool,
    left: bool,
    redirect: Option<Destination>,
    alert: Option<String>,
}

impl CallMachine {
    pub fn new(context: CallContext) -> Self {
        let time_remaining = context.full_duration_secs();
        Self {
            context,
            status: CallStatus::Inactive,
            transcript: Transcript::new(),
            time_remaining,
            is_speaking: false,
            is_repeating: false,
            timer_armed: false,
            stop_requested: false,
            finish_handled: false,
            feedback_pending: false,
            left: false,
            redirect: None,
            alert: None,
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    /// True once the caller has been sent elsewhere and no feedback run is outstanding.
    pub fn is_closed(&self) -> bool {
        self.redirect.is_some() && !self.feedback_pending
    }

    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            status: self.status,
            transcript: self.transcript.messages().to_vec(),
            last_message: self.transcript.last_content().map(str::to_string),
            time_remaining_seconds: self.time_remaining,
            is_speaking: self.is_speaking,
            is_repeating: self.is_repeating,
            redirect: self.redirect.clone(),
            alert: self.alert.clone(),
        }
    }

    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            Input::Start => self.start(&mut effects),
            Input::StartFailed(message) => self.start_failed(&message, &mut effects),
            Input::Gateway(event) => self.gateway_event(event, &mut effects),
            Input::Tick => self.tick(&mut effects),
            Input::Disconnect => self.disconnect(&mut effects),
            Input::Leave => self.leave(&mut effects),
            Input::Repeat => self.repeat(&mut effects),
            Input::RestartDue => self.restart_due(&mut effects),
            Input::FeedbackCompleted(outcome) => self.feedback_completed(outcome, &mut effects),
        }
        effects
    }

    // ────────────────────────────────────────────────────────────────────────
    // User commands
    // ────────────────────────────────────────────────────────────────────────

    fn start(&mut self, effects: &mut Vec<Effect>) {
        if self.left {
            return;
        }
        if !matches!(self.status, CallStatus::Inactive | CallStatus::Finished) {
            warn!("Ignoring start while call is {:?}", self.status);
            return;
        }
        if self.status == CallStatus::Finished {
            self.transcript.clear();
        }

        self.stop_requested = false;
        self.finish_handled = false;
        self.redirect = None;
        self.alert = None;
        self.time_remaining = self.context.full_duration_secs();

        let (target, variables) = match self.context.mode {
            CallMode::Generate => {
                let Some(workflow_id) = self.context.workflow_id.clone() else {
                    self.status = CallStatus::Inactive;
                    let failure = StartFailure::Misconfigured(
                        "voice workflow id is not configured".to_string(),
                    );
                    self.raise(start_failure_alert(&failure), effects);
                    return;
                };
                let mut variables = CallVariables::new();
                variables.insert("username".to_string(), self.context.user_name.clone());
                variables.insert(
                    "userId".to_string(),
                    self.context.user_id.clone().unwrap_or_default(),
                );
                (StartTarget::Workflow { workflow_id }, variables)
            }
            CallMode::Interview => {
                let seed = self.context.interview_id.as_deref().unwrap_or_default();
                let persona = interviewer_for(seed, &self.context.questions);
                let mut variables = CallVariables::new();
                variables.insert(
                    "questions".to_string(),
                    format_questions(&self.context.questions),
                );
                (StartTarget::Assistant(Box::new(persona)), variables)
            }
        };

        self.status = CallStatus::Connecting;
        effects.push(Effect::StartGateway { target, variables });
    }

    fn start_failed(&mut self, message: &str, effects: &mut Vec<Effect>) {
        if self.status != CallStatus::Connecting {
            return;
        }
        self.status = CallStatus::Inactive;
        let failure = classify_start_failure(message);
        warn!("Call failed to start ({failure:?})");
        self.raise(start_failure_alert(&failure), effects);
    }

    fn disconnect(&mut self, effects: &mut Vec<Effect>) {
        if !self.is_live() {
            return;
        }
        self.end_call(effects);
        self.finish(effects);
    }

    /// Stops the call and sends the caller home at once. A feedback run that the
    /// finish rule starts still completes, but its redirect is dropped.
    fn leave(&mut self, effects: &mut Vec<Effect>) {
        if self.left {
            return;
        }
        if self.is_live() {
            self.end_call(effects);
            self.left = true;
            self.finish(effects);
        } else {
            if self.is_repeating {
                self.is_repeating = false;
                effects.push(Effect::CancelRestart);
            }
            self.left = true;
        }
        self.set_redirect(Destination::Home, effects);
    }

    fn repeat(&mut self, effects: &mut Vec<Effect>) {
        if self.left || !self.is_live() {
            return;
        }
        self.is_repeating = true;
        self.end_call(effects);
        self.transcript.clear();
        self.time_remaining = self.context.full_duration_secs();
        self.status = CallStatus::Inactive;
        effects.push(Effect::ScheduleRestart(self.context.repeat_grace));
    }

    fn restart_due(&mut self, effects: &mut Vec<Effect>) {
        if !self.is_repeating {
            return;
        }
        self.is_repeating = false;
        self.start(effects);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Gateway events and timer
    // ────────────────────────────────────────────────────────────────────────

    fn gateway_event(&mut self, event: GatewayEvent, effects: &mut Vec<Effect>) {
        match event {
            GatewayEvent::CallStart => {
                if self.status != CallStatus::Connecting {
                    return;
                }
                self.status = CallStatus::Active;
                info!("Call active");
                if self.context.duration_minutes > 0 {
                    self.time_remaining = self.context.full_duration_secs();
                    self.timer_armed = true;
                    effects.push(Effect::ArmTimer);
                }
            }
            GatewayEvent::CallEnd => {
                self.cancel_timer(effects);
                let ends_call = self.is_live()
                    || (self.status == CallStatus::Inactive && self.is_repeating);
                if ends_call {
                    self.status = CallStatus::Finished;
                    self.is_speaking = false;
                }
                if self.status == CallStatus::Finished {
                    self.finish(effects);
                }
            }
            GatewayEvent::Message(message) => {
                if message.is_final() && self.is_live() {
                    self.transcript.append(message.role, message.transcript);
                }
            }
            GatewayEvent::SpeechStart => self.is_speaking = true,
            GatewayEvent::SpeechEnd => self.is_speaking = false,
            GatewayEvent::Error(message) => {
                match classify_transport_error(message.as_deref()) {
                    TransportError::Unexpected(message) => {
                        if !self.is_live() {
                            warn!("Gateway error outside a live call: {message}");
                            return;
                        }
                        self.cancel_timer(effects);
                        self.status = CallStatus::Inactive;
                        self.is_speaking = false;
                        self.raise(Some(transport_error_alert(&message)), effects);
                    }
                    noise => warn!("Ignoring gateway error noise ({noise:?})"),
                }
            }
        }
    }

    fn tick(&mut self, effects: &mut Vec<Effect>) {
        if !self.timer_armed || self.status != CallStatus::Active {
            return;
        }
        if self.time_remaining <= 1 {
            self.time_remaining = 0;
            info!("Call time limit reached");
            self.end_call(effects);
            self.finish(effects);
        } else {
            self.time_remaining -= 1;
        }
    }

    fn feedback_completed(&mut self, outcome: FeedbackOutcome, effects: &mut Vec<Effect>) {
        self.feedback_pending = false;
        if self.left {
            info!("Feedback finished after leave (success: {})", outcome.success);
            return;
        }
        let destination = match (outcome.success, self.context.interview_id.clone()) {
            (true, Some(interview_id)) => Destination::Feedback { interview_id },
            _ => Destination::Home,
        };
        self.set_redirect(destination, effects);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Helpers
    // ────────────────────────────────────────────────────────────────────────

    fn is_live(&self) -> bool {
        matches!(self.status, CallStatus::Connecting | CallStatus::Active)
    }

    fn cancel_timer(&mut self, effects: &mut Vec<Effect>) {
        if self.timer_armed {
            self.timer_armed = false;
            effects.push(Effect::CancelTimer);
        }
    }

    /// Cancels the countdown before stopping the gateway, once per attempt.
    fn end_call(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_timer(effects);
        if !self.stop_requested {
            self.stop_requested = true;
            effects.push(Effect::StopGateway);
        }
        self.status = CallStatus::Finished;
        self.is_speaking = false;
    }

    /// Side effect of reaching FINISHED. Suppressed while repeating and run
    /// once per call attempt.
    fn finish(&mut self, effects: &mut Vec<Effect>) {
        if self.is_repeating || self.finish_handled {
            return;
        }
        self.finish_handled = true;

        if self.context.mode == CallMode::Generate {
            self.set_redirect(Destination::Home, effects);
            return;
        }

        let (Some(interview_id), Some(user_id)) =
            (self.context.interview_id.clone(), self.context.user_id.clone())
        else {
            warn!("Call finished without interview or user id; skipping feedback");
            self.set_redirect(Destination::Home, effects);
            return;
        };

        self.feedback_pending = true;
        effects.push(Effect::GenerateFeedback(FeedbackRequest {
            interview_id,
            user_id,
            transcript: self.transcript.messages().to_vec(),
            feedback_id: self.context.feedback_id.clone(),
        }));
    }

    fn set_redirect(&mut self, destination: Destination, effects: &mut Vec<Effect>) {
        if self.left && self.redirect.is_some() {
            return;
        }
        self.redirect = Some(destination.clone());
        effects.push(Effect::Navigate(destination));
    }

    fn raise(&mut self, alert: Option<String>, effects: &mut Vec<Effect>) {
        if let Some(alert) = alert {
            self.alert = Some(alert.clone());
            effects.push(Effect::Alert(alert));
        }
    }
}
