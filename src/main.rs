use anyhow::Result;
use chat_translator::config::Config;
use chat_translator::db::Database;
use chat_translator::gateway::GeminiGateway;
use chat_translator::history::{HistoryStore, InMemoryHistoryStore};
use chat_translator::orchestrator::Orchestrator;
use chat_translator::server::{self, AppState};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_translator=info".parse()?),
        )
        .init();

    info!("Starting chat translator");

    let config = Config::from_env()?;

    let store: Arc<dyn HistoryStore> = match &config.database_url {
        Some(url) => Arc::new(Database::new(url).await?),
        None => {
            warn!("DATABASE_URL not set, chat history is kept in memory and lost on restart");
            Arc::new(InMemoryHistoryStore::new())
        }
    };

    let gateway = Arc::new(GeminiGateway::from_config(&config));

    info!(
        "Model: {}, history: {}, gateway attempts: {}",
        config.ai_model,
        store.backend(),
        config.gateway_max_attempts
    );
    if config.api_key.is_none() {
        warn!("API_KEY not set, /api routes are open");
    }

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(gateway, store),
        api_key: config.api_key.clone(),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
