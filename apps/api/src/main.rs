mod config;
mod cv;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod ocr_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::cv::locator::CvLocator;
use crate::cv::store::{CvStore, PgCvStore};
use crate::db::{create_pool, ensure_cv_tables};
use crate::extraction::{DocumentExtractor, OcrEngine, VisionTranscriber};
use crate::llm_client::LlmClient;
use crate::ocr_client::OcrClient;
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

    info!("Starting CV extraction API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and make sure every configured collection exists
    let pool = create_pool(&config.database_url).await?;
    ensure_cv_tables(&pool, &config.cv_collections).await?;

    // Uploads directory
    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    info!("Uploads directory: {}", config.uploads_dir.display());

    // Optional OCR capability (Google Cloud Vision)
    let ocr: Option<Arc<dyn OcrEngine>> = match &config.google_vision_api_key {
        Some(key) => {
            info!("OCR client initialized");
            Some(Arc::new(OcrClient::new(key.clone())))
        }
        None => {
            info!("GOOGLE_VISION_API_KEY not set; OCR extraction disabled");
            None
        }
    };

    // Optional LLM-vision capability (Anthropic)
    let vision: Option<Arc<dyn VisionTranscriber>> = match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmClient::new(key.clone())))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set; LLM-vision extraction disabled");
            None
        }
    };

    let extractor = Arc::new(DocumentExtractor::new(ocr, vision.clone()));

    let store: Arc<dyn CvStore> = Arc::new(PgCvStore::new(pool));
    let locator = Arc::new(CvLocator::new(
        store.clone(),
        config.cv_collections.clone(),
        config.uploads_dir.clone(),
        config.allow_unscoped_lookup,
        vision,
    ));
    info!(
        "CV locator searching collections: {:?} (unscoped fallback: {})",
        config.cv_collections, config.allow_unscoped_lookup
    );

    // Build app state
    let state = AppState {
        store,
        locator,
        extractor,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
