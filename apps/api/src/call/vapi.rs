//! Vapi implementation of the voice gateway, plus mapping of Vapi server
//! messages (delivered to our webhook) onto `GatewayEvent`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::call::gateway::{
    AttemptLog, CallVariables, GatewayConnector, GatewayError, GatewayEvent, StartTarget,
    TranscriptEvent, VoiceGateway,
};
use crate::models::transcript::Role;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds one `VapiGateway` per call session, sharing the HTTP client.
#[derive(Clone)]
pub struct VapiConnector {
    client: Client,
    api_key: String,
    base_url: String,
}

impl VapiConnector {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl GatewayConnector for VapiConnector {
    fn connect(&self, call_id: Uuid) -> Arc<dyn VoiceGateway> {
        Arc::new(VapiGateway {
            connector: self.clone(),
            call_id,
            active: Mutex::new(None),
            attempts: Mutex::new(AttemptLog::default()),
        })
    }
}

#[derive(Debug, Clone)]
struct ActiveCall {
    provider_id: String,
    control_url: Option<String>,
}

pub struct VapiGateway {
    connector: VapiConnector,
    call_id: Uuid,
    active: Mutex<Option<ActiveCall>>,
    attempts: Mutex<AttemptLog>,
}

#[derive(Debug, Deserialize)]
struct CreateCallResponse {
    id: String,
    #[serde(default)]
    monitor: Option<Monitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Monitor {
    control_url: Option<String>,
}

/// Request body for `POST /call`. `metadata.callId` ties webhook traffic back to
/// our session. Vapi only returns `monitor.controlUrl`, which `stop` posts to,
/// when the monitor plan enables control.
fn create_call_body(call_id: Uuid, target: &StartTarget, variables: &CallVariables) -> Value {
    let monitor_plan = json!({ "controlEnabled": true });
    let mut body = json!({
        "assistantOverrides": {
            "variableValues": variables,
            "monitorPlan": monitor_plan,
        },
        "metadata": { "callId": call_id.to_string() },
    });
    match target {
        StartTarget::Workflow { workflow_id } => body["workflowId"] = json!(workflow_id),
        StartTarget::Assistant(assistant) => {
            let mut assistant = json!(assistant);
            assistant["monitorPlan"] = monitor_plan;
            body["assistant"] = assistant;
        }
    }
    body
}

async fn api_error(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    GatewayError::Api { status, message }
}

#[async_trait]
impl VoiceGateway for VapiGateway {
    async fn start(&self, target: &StartTarget, variables: &CallVariables) -> Result<(), GatewayError> {
        let body = create_call_body(self.call_id, target, variables);
        let response = self
            .connector
            .client
            .post(format!("{}/call", self.connector.base_url))
            .bearer_auth(&self.connector.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: CreateCallResponse = response.json().await?;
        info!("Voice call {} created for session {}", created.id, self.call_id);
        self.attempts.lock().await.record(created.id.clone());
        *self.active.lock().await = Some(ActiveCall {
            provider_id: created.id,
            control_url: created.monitor.and_then(|m| m.control_url),
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        let Some(active) = self.active.lock().await.take() else {
            return Err(GatewayError::NoActiveCall);
        };
        let Some(control_url) = active.control_url else {
            debug!("Voice call {} has no control URL", active.provider_id);
            return Err(GatewayError::NoActiveCall);
        };

        let response = self
            .connector
            .client
            .post(control_url)
            .json(&json!({ "type": "end-call" }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        info!("Voice call {} ended", active.provider_id);
        Ok(())
    }

    async fn is_superseded(&self, provider_call_id: &str) -> bool {
        self.attempts.lock().await.is_superseded(provider_call_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Webhook messages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServerEnvelope {
    pub message: ServerMessage,
}

/// The provider call a server message belongs to.
#[derive(Debug, Deserialize)]
pub struct ProviderCall {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub call: Option<ProviderCall>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub transcript_type: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

fn parse_role(role: &str) -> Option<Role> {
    match role {
        "user" => Some(Role::User),
        "assistant" | "bot" => Some(Role::Assistant),
        "system" => Some(Role::System),
        _ => None,
    }
}

fn error_text(error: Option<Value>) -> Option<String> {
    match error? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("message") {
                return Some(s.clone());
            }
            Some(Value::Object(map).to_string())
        }
        other => Some(other.to_string()),
    }
}

/// Maps a server message to the gateway event set. Messages the session has no
/// use for map to `None`.
pub fn map_server_message(message: ServerMessage) -> Option<GatewayEvent> {
    match message.message_type.as_str() {
        "status-update" => match message.status.as_deref() {
            Some("in-progress") => Some(GatewayEvent::CallStart),
            Some("ended") => Some(GatewayEvent::CallEnd),
            _ => None,
        },
        "transcript" => {
            let role = parse_role(message.role.as_deref()?)?;
            Some(GatewayEvent::Message(TranscriptEvent {
                message_type: "transcript".to_string(),
                transcript_type: message.transcript_type,
                role,
                transcript: message.transcript.unwrap_or_default(),
            }))
        }
        "speech-update" if message.role.as_deref() == Some("assistant") => {
            match message.status.as_deref() {
                Some("started") => Some(GatewayEvent::SpeechStart),
                Some("stopped") => Some(GatewayEvent::SpeechEnd),
                _ => None,
            }
        }
        "error" => Some(GatewayEvent::Error(error_text(message.error))),
        _ => None,
    }
}
