use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::chatbot::history::ChatHistory;
use crate::config::Config;
use crate::cv::analyzer::CvAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Redis-backed conversation memory for the chatbot.
    pub chat_history: ChatHistory,
    /// Pluggable CV analyzer. LLM-backed when `LLM_API_KEY` is set, keyword heuristics otherwise.
    pub cv_analyzer: Arc<dyn CvAnalyzer>,
}
