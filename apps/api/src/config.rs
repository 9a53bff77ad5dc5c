use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Anthropic key for LLM-vision transcription. Optional: when absent the
    /// vision tier of the extraction pipeline is skipped.
    pub anthropic_api_key: Option<String>,
    /// Google Cloud Vision key for OCR. Optional, same semantics as above.
    pub google_vision_api_key: Option<String>,
    /// Directory where uploaded CV files are written and where re-extraction
    /// looks for stale records' files.
    pub uploads_dir: PathBuf,
    /// Table names the locator searches, in order. Records have been written
    /// into differently named tables by older code paths, so lookups fan out
    /// across all of them.
    pub cv_collections: Vec<String>,
    /// Opt-in for the owner-unscoped lookup fallback. Off by default: the
    /// unscoped strategies can match another user's record when two users
    /// share an identifier value, so they must be explicitly enabled.
    pub allow_unscoped_lookup: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let cv_collections = std::env::var("CV_COLLECTIONS")
            .unwrap_or_else(|_| "cvs,resumes".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if cv_collections.is_empty() {
            bail!("CV_COLLECTIONS must name at least one collection");
        }
        for name in &cv_collections {
            if !is_valid_collection_name(name) {
                bail!("Invalid collection name in CV_COLLECTIONS: '{name}'");
            }
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            google_vision_api_key: optional_env("GOOGLE_VISION_API_KEY"),
            uploads_dir: PathBuf::from(
                std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            ),
            cv_collections,
            allow_unscoped_lookup: std::env::var("ALLOW_UNSCOPED_LOOKUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Collection names become SQL table identifiers, so they are restricted to a
/// safe character set at load time rather than escaped at query time.
fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
