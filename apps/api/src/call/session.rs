//! Per-call driver task.
//!
//! Each call runs one tokio task that owns its `CallMachine`. Commands and
//! gateway events arrive on an mpsc channel; provider events from a call that
//! `repeat()` has since replaced are dropped there. The countdown and repeat grace
//! delay are local timers, and feedback runs on a spawned task that reports
//! back through a second channel. All state changes happen inside this one
//! task; the latest snapshot is published on a watch channel.

use std::collections::VecDeque;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::call::gateway::{GatewayEvent, VoiceGateway};
use crate::call::machine::{CallMachine, CallSnapshot, CallStatus, Effect, Input};
use crate::feedback::pipeline::{generate_feedback, FeedbackOutcome, FeedbackRequest};
use crate::feedback::scorer::FeedbackScorer;
use crate::store::{FeedbackStore, InterviewStore};

const INPUT_BUFFER: usize = 64;
const TICK: Duration = Duration::from_secs(1);

/// Collaborators a session needs besides its gateway.
#[derive(Clone)]
pub struct SessionDeps {
    pub interviews: Arc<dyn InterviewStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub scorer: Arc<dyn FeedbackScorer>,
}

#[derive(Debug, Error)]
#[error("Call session {0} has shut down")]
pub struct SessionClosed(pub Uuid);

#[derive(Debug)]
enum SessionMessage {
    Input(Input),
    /// Event from the voice provider, tagged with its provider call id if known.
    Provider {
        call_id: Option<String>,
        event: GatewayEvent,
    },
}

/// What the driver publishes after every batch of inputs.
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: CallSnapshot,
    /// When the session last became closed, if it is.
    pub closed_since: Option<Instant>,
}

/// Cheap, cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct CallHandle {
    id: Uuid,
    inputs: mpsc::Sender<SessionMessage>,
    published: watch::Receiver<Published>,
    created_at: Instant,
}

impl CallHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub async fn send(&self, input: Input) -> Result<(), SessionClosed> {
        self.deliver(SessionMessage::Input(input)).await
    }

    /// Forwards a provider event. Events whose `provider_call_id` belongs to a
    /// replaced attempt never reach the state machine.
    pub async fn send_provider_event(
        &self,
        provider_call_id: Option<String>,
        event: GatewayEvent,
    ) -> Result<(), SessionClosed> {
        self.deliver(SessionMessage::Provider {
            call_id: provider_call_id,
            event,
        })
        .await
    }

    async fn deliver(&self, message: SessionMessage) -> Result<(), SessionClosed> {
        self.inputs.send(message).await.map_err(|_| SessionClosed(self.id))
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.published.borrow().snapshot.clone()
    }

    pub fn closed_since(&self) -> Option<Instant> {
        self.published.borrow().closed_since
    }

    /// Waits for the next published change.
    #[cfg(test)]
    pub async fn changed(&mut self) -> Result<CallSnapshot, SessionClosed> {
        self.published
            .changed()
            .await
            .map_err(|_| SessionClosed(self.id))?;
        Ok(self.snapshot())
    }
}

/// Spawns the driver task for `machine` and returns its handle.
pub fn spawn_session(
    id: Uuid,
    machine: CallMachine,
    gateway: Arc<dyn VoiceGateway>,
    deps: SessionDeps,
) -> CallHandle {
    let (input_tx, input_rx) = mpsc::channel(INPUT_BUFFER);
    let (feedback_tx, feedback_rx) = mpsc::channel(1);
    let (published_tx, published_rx) = watch::channel(Published {
        snapshot: machine.snapshot(),
        closed_since: None,
    });

    let driver = SessionDriver {
        id,
        machine,
        gateway,
        deps,
        inputs: input_rx,
        feedback_tx,
        feedback_rx,
        published: published_tx,
        timer: None,
        restart: None,
        closed_since: None,
    };
    tokio::spawn(driver.run().instrument(info_span!("call", %id)));

    CallHandle {
        id,
        inputs: input_tx,
        published: published_rx,
        created_at: Instant::now(),
    }
}

struct SessionDriver {
    id: Uuid,
    machine: CallMachine,
    gateway: Arc<dyn VoiceGateway>,
    deps: SessionDeps,
    inputs: mpsc::Receiver<SessionMessage>,
    feedback_tx: mpsc::Sender<FeedbackOutcome>,
    feedback_rx: mpsc::Receiver<FeedbackOutcome>,
    published: watch::Sender<Published>,
    timer: Option<Interval>,
    restart: Option<Pin<Box<Sleep>>>,
    closed_since: Option<Instant>,
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

async fn restart_elapsed(restart: &mut Option<Pin<Box<Sleep>>>) {
    match restart {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

impl SessionDriver {
    async fn run(mut self) {
        info!("Call session started");
        loop {
            let input = tokio::select! {
                received = self.inputs.recv() => match received {
                    Some(SessionMessage::Input(input)) => input,
                    Some(SessionMessage::Provider { call_id, event }) => {
                        match self.admit(call_id, event).await {
                            Some(input) => input,
                            None => continue,
                        }
                    }
                    None => break,
                },
                Some(outcome) = self.feedback_rx.recv() => Input::FeedbackCompleted(outcome),
                _ = next_tick(&mut self.timer) => Input::Tick,
                _ = restart_elapsed(&mut self.restart) => {
                    self.restart = None;
                    Input::RestartDue
                }
            };
            self.process(input).await;
        }
        if matches!(
            self.machine.status(),
            CallStatus::Connecting | CallStatus::Active
        ) {
            if let Err(e) = self.gateway.stop().await {
                warn!("Gateway stop on shutdown failed: {e}");
            }
        }
        info!("Call session dropped");
    }

    async fn admit(&self, call_id: Option<String>, event: GatewayEvent) -> Option<Input> {
        if let Some(call_id) = call_id {
            if self.gateway.is_superseded(&call_id).await {
                debug!("Dropping {event:?} from replaced provider call {call_id}");
                return None;
            }
        }
        Some(Input::Gateway(event))
    }

    /// Applies `input` and every input its effects produce, then publishes once.
    async fn process(&mut self, input: Input) {
        let mut queue = VecDeque::from([input]);
        while let Some(input) = queue.pop_front() {
            let before = self.machine.status();
            let effects = self.machine.apply(input);
            let after = self.machine.status();
            if before != after {
                info!("Call status {before:?} -> {after:?}");
            }
            for effect in effects {
                if let Some(follow_up) = self.execute(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
        self.publish();
    }

    async fn execute(&mut self, effect: Effect) -> Option<Input> {
        match effect {
            Effect::StartGateway { target, variables } => {
                if let Err(e) = self.gateway.start(&target, &variables).await {
                    error!("Gateway start failed: {e}");
                    return Some(Input::StartFailed(e.to_string()));
                }
            }
            Effect::StopGateway => {
                if let Err(e) = self.gateway.stop().await {
                    warn!("Gateway stop failed: {e}");
                }
            }
            Effect::ArmTimer => {
                let mut timer = interval_at(Instant::now() + TICK, TICK);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.timer = Some(timer);
            }
            Effect::CancelTimer => self.timer = None,
            Effect::ScheduleRestart(delay) => {
                self.restart = Some(Box::pin(tokio::time::sleep(delay)));
            }
            Effect::CancelRestart => self.restart = None,
            Effect::GenerateFeedback(request) => self.spawn_feedback(request),
            Effect::Navigate(destination) => info!("Redirecting caller to {destination:?}"),
            Effect::Alert(message) => warn!("Call alert: {message}"),
        }
        None
    }

    fn spawn_feedback(&self, request: FeedbackRequest) {
        let deps = self.deps.clone();
        let tx = self.feedback_tx.clone();
        let task = async move {
            if let Err(e) = deps.interviews.mark_interview_completed(&request.interview_id).await {
                warn!("Could not mark interview {} completed: {e}", request.interview_id);
            }
            let outcome =
                generate_feedback(deps.feedback.as_ref(), deps.scorer.as_ref(), &request).await;
            // The session may already be gone; the feedback document is saved regardless.
            let _ = tx.send(outcome).await;
        };
        tokio::spawn(task.instrument(info_span!("feedback", call = %self.id)));
    }

    fn publish(&mut self) {
        self.closed_since = match (self.machine.is_closed(), self.closed_since) {
            (true, None) => Some(Instant::now()),
            (true, since) => since,
            (false, _) => None,
        };
        self.published.send_replace(Published {
            snapshot: self.machine.snapshot(),
            closed_since: self.closed_since,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::gateway::fakes::RecordingGateway;
    use crate::call::machine::{CallContext, CallMode, Destination};
    use crate::feedback::scorer::fakes::{scored, StaticScorer};
    use crate::models::interview::InterviewStatus;
    use crate::store::memory::fixtures::{interview, minutes_ago};
    use crate::store::MemoryStore;

    fn context(duration_minutes: u32) -> CallContext {
        CallContext {
            mode: CallMode::Interview,
            user_name: "Dana".to_string(),
            user_id: Some("Y".to_string()),
            interview_id: Some("X".to_string()),
            feedback_id: None,
            questions: vec!["Explain borrowing.".to_string()],
            duration_minutes,
            workflow_id: None,
            repeat_grace: Duration::from_millis(1000),
        }
    }

    async fn deps() -> (SessionDeps, Arc<MemoryStore>, Arc<StaticScorer>) {
        let store = Arc::new(MemoryStore::new());
        store
            .create_interview(&interview("X", "Y", minutes_ago(1)))
            .await
            .unwrap();
        let scorer = Arc::new(StaticScorer::returning(scored(&[])));
        let deps = SessionDeps {
            interviews: store.clone(),
            feedback: store.clone(),
            scorer: scorer.clone(),
        };
        (deps, store, scorer)
    }

    /// Lets the driver and any spawned feedback task run to quiescence.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_stops_gateway_once_after_duration() {
        let gateway = Arc::new(RecordingGateway::default());
        let (deps, store, _) = deps().await;
        let handle = spawn_session(
            Uuid::new_v4(),
            CallMachine::new(context(5)),
            gateway.clone(),
            deps,
        );

        handle.send(Input::Start).await.unwrap();
        handle.send(Input::Gateway(GatewayEvent::CallStart)).await.unwrap();
        settle().await;
        assert_eq!(handle.snapshot().status, CallStatus::Active);
        assert_eq!(gateway.start_count(), 1);

        tokio::time::sleep(Duration::from_secs(299)).await;
        settle().await;
        assert_eq!(handle.snapshot().status, CallStatus::Active);
        assert_eq!(handle.snapshot().time_remaining_seconds, 1);
        assert_eq!(gateway.stop_count(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(handle.snapshot().status, CallStatus::Finished);
        assert_eq!(gateway.stop_count(), 1);

        // A trailing call-end and more time passing change nothing.
        handle.send(Input::Gateway(GatewayEvent::CallEnd)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(gateway.stop_count(), 1);

        let snapshot = handle.snapshot();
        assert_eq!(
            snapshot.redirect,
            Some(Destination::Feedback {
                interview_id: "X".to_string()
            })
        );
        let stored = store.get_interview("X").await.unwrap().unwrap();
        assert_eq!(stored.status, InterviewStatus::Completed);
        // Nobody spoke, so the zero-score record was written without scoring.
        let feedback = store.find_feedback("X", "Y").await.unwrap().unwrap();
        assert_eq!(feedback.body.total_score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_restarts_after_grace_without_feedback() {
        let gateway = Arc::new(RecordingGateway::default());
        let (deps, store, scorer) = deps().await;
        let handle = spawn_session(
            Uuid::new_v4(),
            CallMachine::new(context(5)),
            gateway.clone(),
            deps,
        );

        handle.send(Input::Start).await.unwrap();
        handle.send(Input::Gateway(GatewayEvent::CallStart)).await.unwrap();
        handle.send(Input::Repeat).await.unwrap();
        handle.send(Input::Gateway(GatewayEvent::CallEnd)).await.unwrap();
        settle().await;
        assert!(handle.snapshot().is_repeating);
        assert_eq!(gateway.stop_count(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        let snapshot = handle.snapshot();
        assert!(!snapshot.is_repeating);
        assert_eq!(snapshot.status, CallStatus::Connecting);
        assert_eq!(gateway.start_count(), 2);
        assert_eq!(scorer.call_count(), 0);
        let stored = store.get_interview("X").await.unwrap().unwrap();
        assert_eq!(stored.status, InterviewStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_end_from_replaced_call_is_dropped() {
        let gateway = Arc::new(RecordingGateway::default());
        let (deps, store, scorer) = deps().await;
        let handle = spawn_session(
            Uuid::new_v4(),
            CallMachine::new(context(5)),
            gateway.clone(),
            deps,
        );

        handle.send(Input::Start).await.unwrap();
        handle
            .send_provider_event(Some("attempt-1".to_string()), GatewayEvent::CallStart)
            .await
            .unwrap();
        handle.send(Input::Repeat).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1001)).await;
        settle().await;
        assert_eq!(gateway.start_count(), 2);

        handle
            .send_provider_event(Some("attempt-1".to_string()), GatewayEvent::CallEnd)
            .await
            .unwrap();
        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.status, CallStatus::Connecting);
        assert_eq!(snapshot.redirect, None);
        assert_eq!(scorer.call_count(), 0);
        assert!(store.find_feedback("X", "Y").await.unwrap().is_none());
        let stored = store.get_interview("X").await.unwrap().unwrap();
        assert_eq!(stored.status, InterviewStatus::Pending);

        handle
            .send_provider_event(Some("attempt-2".to_string()), GatewayEvent::CallStart)
            .await
            .unwrap();
        settle().await;
        assert_eq!(handle.snapshot().status, CallStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_while_connecting_has_no_dangling_timer() {
        let gateway = Arc::new(RecordingGateway::default());
        let (deps, _, _) = deps().await;
        let handle = spawn_session(
            Uuid::new_v4(),
            CallMachine::new(context(5)),
            gateway.clone(),
            deps,
        );

        handle.send(Input::Start).await.unwrap();
        handle.send(Input::Leave).await.unwrap();
        handle.send(Input::Gateway(GatewayEvent::CallStart)).await.unwrap();
        settle().await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.status, CallStatus::Finished);
        assert_eq!(snapshot.redirect, Some(Destination::Home));
        assert_eq!(snapshot.time_remaining_seconds, 300);
        assert_eq!(gateway.stop_count(), 1);
        assert!(handle.closed_since().is_some());
    }

    #[tokio::test]
    async fn test_start_failure_is_fed_back_as_alert() {
        let gateway = Arc::new(RecordingGateway::failing_start("microphone blocked"));
        let (deps, _, _) = deps().await;
        let mut handle = spawn_session(
            Uuid::new_v4(),
            CallMachine::new(context(5)),
            gateway,
            deps,
        );

        handle.send(Input::Start).await.unwrap();
        let snapshot = handle.changed().await.unwrap();
        assert_eq!(snapshot.status, CallStatus::Inactive);
        assert!(snapshot.alert.unwrap().contains("microphone blocked"));
    }
}
