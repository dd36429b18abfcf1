mod call;
mod config;
mod db;
mod errors;
mod feedback;
mod interviews;
mod llm_client;
mod models;
mod routes;
mod seed;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::call::registry::CallRegistry;
use crate::call::vapi::VapiConnector;
use crate::config::Config;
use crate::db::create_pool;
use crate::feedback::scorer::LlmFeedbackScorer;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{FeedbackStore, InterviewStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Document store: Postgres when configured, in-memory otherwise
    let (interviews, feedback): (Arc<dyn InterviewStore>, Arc<dyn FeedbackStore>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::new(create_pool(url).await?));
                let interviews: Arc<dyn InterviewStore> = store.clone();
                let feedback: Arc<dyn FeedbackStore> = store;
                (interviews, feedback)
            }
            None => {
                warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
                let store = Arc::new(MemoryStore::new());
                let interviews: Arc<dyn InterviewStore> = store.clone();
                let feedback: Arc<dyn FeedbackStore> = store;
                (interviews, feedback)
            }
        };

    // Initialize LLM clients: question generation retries, feedback scoring does not
    let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let scoring_llm = LlmClient::new(config.anthropic_api_key.clone()).with_max_attempts(1);
    let scorer = Arc::new(LlmFeedbackScorer::new(Arc::new(scoring_llm)));

    // Voice gateway
    if config.vapi_api_key.is_none() {
        warn!("VAPI_API_KEY not set; voice calls will fail to start");
    }
    if config.vapi_workflow_id.is_none() {
        warn!("VAPI_WORKFLOW_ID not set; generic interview calls are disabled");
    }
    let gateways = Arc::new(VapiConnector::new(
        config.vapi_api_key.clone().unwrap_or_default(),
        config.vapi_base_url.clone(),
    ));

    // Build app state
    let state = AppState {
        config: config.clone(),
        interviews,
        feedback,
        llm,
        scorer,
        gateways,
        calls: CallRegistry::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
