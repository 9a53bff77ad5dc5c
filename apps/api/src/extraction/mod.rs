//! Multi-strategy document text extraction.
//!
//! Given an uploaded file of unknown quality (text PDF, scanned image,
//! corrupted stream, plain text with the wrong extension), there is no
//! reliable way to predict which extraction technique will work. The
//! pipeline therefore runs every applicable technique, keeps each non-empty
//! result as a candidate, and returns the longest one.
//!
//! KNOWN LIMITATION: longest-wins has no quality guarantee. A long but
//! garbled OCR result can beat a shorter clean parse. In practice failed
//! techniques return empty or near-empty strings rather than plausible
//! garbage, which is what makes the heuristic workable. A pluggable quality
//! score would be the place to improve this.

pub mod pdf;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Extracted text shorter than this (after trimming) is treated as unusable.
pub const MIN_USABLE_TEXT_CHARS: usize = 100;

/// Prefix of the sentinel string returned when every technique fails. The
/// extractor never errors for "no extractable text"; callers detect failure
/// with `is_failure_message` or a length check.
pub const FAILURE_PREFIX: &str = "Failed to extract text from file:";

/// Upper bound on a single OCR or LLM-vision call, shared with the
/// locator's vision fallback. A timeout discards that attempt only; the
/// pipeline moves on to the next technique.
pub const EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(90);

/// OCR capability: image bytes in, detected text out.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn detect_text(&self, image: &[u8]) -> Result<String>;
}

/// LLM-vision capability: base64-encoded file in, free-text transcription out.
#[async_trait]
pub trait VisionTranscriber: Send + Sync {
    async fn transcribe(&self, media_type: &str, data_b64: &str) -> Result<String>;
}

/// The extraction seam the locator depends on, so tests can substitute a
/// mock and assert on call counts.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> String;
}

/// File classification by extension. Content sniffing is deliberately not
/// attempted; misclassified plain text is still recovered by the raw-read
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Word,
    Unknown,
}

impl FileKind {
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "jpg" | "jpeg" | "png" | "bmp" | "tiff" | "webp" => FileKind::Image,
            "doc" | "docx" => FileKind::Word,
            _ => FileKind::Unknown,
        }
    }
}

/// One successful extraction attempt. Candidates are compared by trimmed
/// character count only; the method name is kept for diagnostics.
#[derive(Debug)]
struct Candidate {
    method: &'static str,
    text: String,
}

impl Candidate {
    fn len(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Picks the longest candidate. Ties go to the earlier attempt, which is
/// also the cheaper and more trusted technique.
fn select_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .fold(None, |best: Option<Candidate>, c| match best {
            Some(b) if b.len() >= c.len() => Some(b),
            _ => Some(c),
        })
}

fn failure_message(file_name: &str, reason: &str) -> String {
    format!("{FAILURE_PREFIX} {file_name}. {reason}")
}

/// True if `text` is one of the extractor's sentinel failure strings rather
/// than document content.
pub fn is_failure_message(text: &str) -> bool {
    text.starts_with(FAILURE_PREFIX)
}

/// MIME type for a file based on its extension, for vision API payloads.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Multi-strategy extractor with optional OCR and LLM-vision capabilities.
/// Stateless across invocations; safe to share and call concurrently.
#[derive(Clone)]
pub struct DocumentExtractor {
    ocr: Option<Arc<dyn OcrEngine>>,
    vision: Option<Arc<dyn VisionTranscriber>>,
}

impl DocumentExtractor {
    pub fn new(
        ocr: Option<Arc<dyn OcrEngine>>,
        vision: Option<Arc<dyn VisionTranscriber>>,
    ) -> Self {
        Self { ocr, vision }
    }

    async fn run_pdf_techniques(&self, path: &Path, candidates: &mut Vec<Candidate>) {
        // Structural tier: three independent parsers. A clearly sufficient
        // result short-circuits the rest of the tier.
        match pdf::extract_with_lopdf(path) {
            Ok(text) => push_non_empty(candidates, "lopdf", text),
            Err(e) => warn!("lopdf extraction failed for {}: {e}", path.display()),
        }

        if !has_sufficient(candidates) {
            match pdf::extract_with_pdf_extract(path) {
                Ok(text) => push_non_empty(candidates, "pdf_extract", text),
                Err(e) => warn!("pdf-extract failed for {}: {e}", path.display()),
            }
        }

        if !has_sufficient(candidates) && pdf::pdftotext_available().await {
            match pdf::extract_with_pdftotext(path).await {
                Ok(text) => push_non_empty(candidates, "pdftotext", text),
                Err(e) => warn!("pdftotext failed for {}: {e}", path.display()),
            }
        }

        // Expensive tiers, only while the best result is still unusable.
        if !has_sufficient(candidates) {
            if let Some(ocr) = self.ocr.clone() {
                self.ocr_pdf_pages(path, ocr.as_ref(), candidates).await;
            }
        }

        if !has_sufficient(candidates) {
            if let Some(vision) = self.vision.clone() {
                self.vision_transcribe(path, vision.as_ref(), candidates)
                    .await;
            }
        }
    }

    async fn run_image_techniques(&self, path: &Path, candidates: &mut Vec<Candidate>) {
        if let Some(ocr) = self.ocr.clone() {
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    match timeout(EXTERNAL_CALL_TIMEOUT, ocr.detect_text(&bytes)).await {
                        Ok(Ok(text)) => push_non_empty(candidates, "ocr", text),
                        Ok(Err(e)) => warn!("OCR failed for {}: {e}", path.display()),
                        Err(_) => warn!("OCR timed out for {}", path.display()),
                    }
                }
                Err(e) => warn!("Could not read image {}: {e}", path.display()),
            }
        }

        if !has_sufficient(candidates) {
            if let Some(vision) = self.vision.clone() {
                self.vision_transcribe(path, vision.as_ref(), candidates)
                    .await;
            }
        }
    }

    /// Rasterizes each PDF page and OCRs the page images, concatenating the
    /// per-page text into one candidate. A failed or timed-out page is
    /// skipped; the remaining pages still contribute.
    async fn ocr_pdf_pages(
        &self,
        path: &Path,
        ocr: &dyn OcrEngine,
        candidates: &mut Vec<Candidate>,
    ) {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => {
                warn!("Could not create temp dir for rasterization: {e}");
                return;
            }
        };

        let pages = match pdf::rasterize_pdf(path, dir.path()).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Rasterization failed for {}: {e}", path.display());
                return;
            }
        };

        let mut combined = String::new();
        for page in &pages {
            let bytes = match tokio::fs::read(page).await {
                Ok(b) => b,
                Err(e) => {
                    warn!("Could not read page image {}: {e}", page.display());
                    continue;
                }
            };
            match timeout(EXTERNAL_CALL_TIMEOUT, ocr.detect_text(&bytes)).await {
                Ok(Ok(text)) => {
                    combined.push_str(&text);
                    combined.push_str("\n\n");
                }
                Ok(Err(e)) => warn!("OCR failed on page {}: {e}", page.display()),
                Err(_) => warn!("OCR timed out on page {}", page.display()),
            }
        }

        push_non_empty(candidates, "ocr", combined);
    }

    /// Base64-encodes the whole file and asks the LLM to transcribe it. The
    /// most expensive and most tolerant technique; last resort for messy
    /// layouts that defeat everything else.
    async fn vision_transcribe(
        &self,
        path: &Path,
        vision: &dyn VisionTranscriber,
        candidates: &mut Vec<Candidate>,
    ) {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Could not read {} for transcription: {e}", path.display());
                return;
            }
        };
        let data_b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);

        match timeout(
            EXTERNAL_CALL_TIMEOUT,
            vision.transcribe(media_type_for(path), &data_b64),
        )
        .await
        {
            Ok(Ok(text)) => push_non_empty(candidates, "llm_vision", text),
            Ok(Err(e)) => warn!("LLM-vision transcription failed for {}: {e}", path.display()),
            Err(_) => warn!("LLM-vision transcription timed out for {}", path.display()),
        }
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    /// Runs every technique applicable to the file's type and returns the
    /// longest non-empty result. Never errors: total failure produces a
    /// descriptive sentinel string instead.
    async fn extract(&self, path: &Path) -> String {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        if !path.exists() {
            return failure_message(&file_name, "File not found.");
        }

        let kind = FileKind::classify(path);
        info!("Extracting text from {:?} file: {}", kind, path.display());

        let mut candidates = Vec::new();
        match kind {
            FileKind::Pdf => self.run_pdf_techniques(path, &mut candidates).await,
            FileKind::Image => self.run_image_techniques(path, &mut candidates).await,
            // No dedicated parser for Word documents; the raw-read fallback
            // below occasionally salvages text from older formats.
            FileKind::Word | FileKind::Unknown => {}
        }

        // Best-effort raw read, for every kind: recovers plain-text uploads
        // regardless of extension, and fails cleanly on binary content.
        match tokio::fs::read_to_string(path).await {
            Ok(text) => push_non_empty(&mut candidates, "raw_read", text),
            Err(e) => debug!("Raw read of {} not usable: {e}", path.display()),
        }

        match select_best(candidates) {
            Some(best) => {
                info!(
                    "Selected '{}' result with {} characters for {}",
                    best.method,
                    best.len(),
                    path.display()
                );
                best.text
            }
            None => failure_message(
                &file_name,
                "The file may be scanned, image-based, or secured.",
            ),
        }
    }
}

fn push_non_empty(candidates: &mut Vec<Candidate>, method: &'static str, text: String) {
    if text.trim().is_empty() {
        debug!("Technique '{method}' produced no text");
    } else {
        candidates.push(Candidate { method, text });
    }
}

fn has_sufficient(candidates: &[Candidate]) -> bool {
    candidates.iter().any(|c| c.len() > MIN_USABLE_TEXT_CHARS)
}
