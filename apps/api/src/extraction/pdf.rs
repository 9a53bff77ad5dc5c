//! PDF-specific extraction techniques.
//!
//! Three independent structural parsers are wrapped here: `lopdf`,
//! `pdf-extract`, and the `pdftotext` CLI from poppler-utils. Different
//! engines fail on different malformed inputs (encrypted files, corrupted
//! streams, unusual encodings), so the pipeline runs them as peers rather
//! than treating one as a fallback of the others. Rasterization for the OCR
//! tier lives here too.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Structural extraction with lopdf: walk every page and concatenate the
/// decoded text content.
pub fn extract_with_lopdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let text = doc.extract_text(&pages)?;
    debug!(
        "lopdf extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Structural extraction with the pdf-extract crate, a second engine with a
/// different content-stream parser. pdf-extract is known to panic on some
/// malformed files, so the call is isolated behind catch_unwind and a panic
/// is reported as an ordinary extraction failure.
pub fn extract_with_pdf_extract(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    let result = std::panic::catch_unwind(move || pdf_extract::extract_text(&path));
    match result {
        Ok(Ok(text)) => {
            debug!("pdf-extract extracted {} characters", text.chars().count());
            Ok(text)
        }
        Ok(Err(e)) => bail!("pdf-extract failed: {e}"),
        Err(_) => bail!("pdf-extract panicked on malformed input"),
    }
}

/// Returns true if the pdftotext utility (poppler-utils) is on the PATH.
pub async fn pdftotext_available() -> bool {
    Command::new("pdftotext")
        .arg("-v")
        .output()
        .await
        .is_ok()
}

/// Structural extraction via the pdftotext CLI with layout preservation.
/// The utility writes to a file, so output goes through a temp path.
pub async fn extract_with_pdftotext(path: &Path) -> Result<String> {
    let out_file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .context("Failed to create temp file for pdftotext output")?;

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg(out_file.path())
        .output()
        .await
        .context("Failed to run pdftotext")?;

    if !output.status.success() {
        bail!(
            "pdftotext exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let text = tokio::fs::read_to_string(out_file.path())
        .await
        .context("Failed to read pdftotext output")?;
    debug!("pdftotext extracted {} characters", text.chars().count());
    Ok(text)
}

/// Rasterizes every page of a PDF to PNG images under `out_dir` using the
/// pdftoppm CLI, returning the page image paths in page order. Used by the
/// OCR tier for scanned documents.
pub async fn rasterize_pdf(path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let prefix = out_dir.join("page");
    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg("300")
        .arg(path)
        .arg(&prefix)
        .output()
        .await
        .context("Failed to run pdftoppm")?;

    if !output.status.success() {
        bail!(
            "pdftoppm exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir)
        .await
        .context("Failed to list rasterized pages")?;
    while let Some(entry) = entries.next_entry().await? {
        let p = entry.path();
        if p.extension().is_some_and(|ext| ext == "png") {
            pages.push(p);
        }
    }
    // pdftoppm zero-pads page numbers, so lexicographic order is page order
    pages.sort();

    debug!("Rasterized {} to {} page images", path.display(), pages.len());
    Ok(pages)
}
