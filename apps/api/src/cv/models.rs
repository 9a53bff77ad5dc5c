use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::extraction::MIN_USABLE_TEXT_CHARS;

/// A stored CV record. Records have been created by several code paths over
/// time, which is why three text-bearing columns exist: `extracted_text` is
/// the current field, `content` and `cv_text` are legacy names still carried
/// by older rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvDocument {
    pub id: String,
    pub user_id: String,
    /// Secondary timestamp-derived identifier assigned at upload, used as a
    /// fallback lookup key and in on-disk file naming.
    pub file_id: String,
    /// On-disk name, `{file_id}_{cleaned original name}`.
    pub filename: String,
    /// The filename exactly as the user uploaded it.
    pub original_name: String,
    /// Best-known location of the uploaded bytes. May be stale if the file
    /// was moved after upload; healed by the locator when re-extraction
    /// finds the file elsewhere.
    pub file_path: String,
    pub content_type: String,
    pub file_size: i64,
    pub extracted_text: Option<String>,
    pub content: Option<String>,
    pub cv_text: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl CvDocument {
    /// Yields every stored text field that meets the usability threshold,
    /// in precedence order: `extracted_text`, `content`, `cv_text`. Callers
    /// that reject a field (failed content check, stale sentinel) move on
    /// to the next one before falling back to re-extraction.
    pub fn stored_texts(&self) -> impl Iterator<Item = &str> {
        [
            self.extracted_text.as_deref(),
            self.content.as_deref(),
            self.cv_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|t| meets_threshold(t))
    }
}

/// Listing shape returned to the frontend; text fields are deliberately
/// omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvSummary {
    pub id: String,
    pub file_id: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: i64,
    pub user_id: String,
}

impl From<&CvDocument> for CvSummary {
    fn from(doc: &CvDocument) -> Self {
        Self {
            id: doc.id.clone(),
            file_id: doc.file_id.clone(),
            original_name: doc.original_name.clone(),
            uploaded_at: doc.uploaded_at,
            size: doc.file_size,
            user_id: doc.user_id.clone(),
        }
    }
}

/// True if the trimmed text meets the minimum-usable character count.
pub fn meets_threshold(text: &str) -> bool {
    text.trim().chars().count() >= MIN_USABLE_TEXT_CHARS
}

const CV_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "employment",
    "work",
    "university",
    "degree",
    "project",
    "certification",
];

/// Lightweight semantic check: does this text plausibly belong to a CV?
/// Catches boilerplate and error pages that slipped into a text field while
/// staying cheap enough to run on every lookup.
pub fn looks_like_cv(text: &str) -> bool {
    let lower = text.to_lowercase();
    CV_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
