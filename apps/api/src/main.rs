mod business_managers;
mod chatbot;
mod competences;
mod config;
mod consultants;
mod cv;
mod db;
mod documents;
mod errors;
mod llm_client;
mod missions;
mod models;
mod pagination;
mod practices;
mod routes;
mod state;
mod text;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chatbot::history::ChatHistory;
use crate::config::Config;
use crate::cv::analyzer::{CvAnalyzer, KeywordCvAnalyzer, LlmCvAnalyzer};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Consultator API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (connections are opened per chat request)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let chat_history = ChatHistory::new(
        redis,
        config.chat_history_ttl_secs,
        config.chat_history_max_turns,
    );
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let cv_analyzer = build_cv_analyzer(&config)?;
    info!("CV analyzer: {}", cv_analyzer.name());

    let state = AppState {
        db,
        s3,
        config: config.clone(),
        chat_history,
        cv_analyzer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// LLM analyzer when an API key is configured, keyword heuristics otherwise.
fn build_cv_analyzer(config: &Config) -> Result<Arc<dyn CvAnalyzer>> {
    match &config.llm_api_key {
        Some(key) => {
            let client = LlmClient::new(config.llm_provider, key.clone(), config.llm_model.clone())?;
            info!(
                "LLM client initialized ({:?}, model: {})",
                client.provider(),
                client.model()
            );
            Ok(Arc::new(LlmCvAnalyzer(client)))
        }
        None => {
            warn!("LLM_API_KEY not set; CV analysis uses the keyword analyzer");
            Ok(Arc::new(KeywordCvAnalyzer))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "consultator-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
