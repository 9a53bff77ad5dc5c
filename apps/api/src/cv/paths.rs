//! File-id generation, filename cleaning, and candidate-path derivation.
//!
//! Upload code has named files inconsistently over time (`{file_id}_{name}`
//! in the current scheme, `{record id}_{name}` in an older one, the bare
//! filename in the oldest), so recovering a record's bytes means probing
//! every naming convention under the uploads directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use crate::cv::models::CvDocument;

const FILE_ID_SUFFIX_LEN: usize = 6;
const FILE_ID_SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a timestamp-based file id: `YYYYMMDD-HHMMSS-random6`.
pub fn generate_file_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let mut rng = rand::thread_rng();
    let suffix: String = (0..FILE_ID_SUFFIX_LEN)
        .map(|_| FILE_ID_SUFFIX_CHARS[rng.gen_range(0..FILE_ID_SUFFIX_CHARS.len())] as char)
        .collect();
    format!("{timestamp}-{suffix}")
}

/// Cleans a filename for on-disk use: spaces and path separators become
/// underscores.
pub fn clean_filename(name: &str) -> String {
    name.replace([' ', '/', '\\'], "_")
}

/// Derives the ordered list of paths where a record's uploaded bytes might
/// live. The recorded path comes first; the naming-convention probes follow.
/// Duplicates are removed preserving first occurrence.
pub fn candidate_paths(doc: &CvDocument, uploads_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let clean_original = clean_filename(&doc.original_name);

    if !doc.file_path.is_empty() {
        paths.push(PathBuf::from(&doc.file_path));
    }
    if !doc.file_id.is_empty() && !clean_original.is_empty() {
        paths.push(uploads_dir.join(format!("{}_{}", doc.file_id, clean_original)));
    }
    if !clean_original.is_empty() {
        // Older upload code used the record id instead of the file id
        paths.push(uploads_dir.join(format!("{}_{}", doc.id, clean_original)));
    }
    if !doc.filename.is_empty() {
        paths.push(uploads_dir.join(&doc.filename));
    }
    if !doc.original_name.is_empty() {
        paths.push(uploads_dir.join(&doc.original_name));
        if clean_original != doc.original_name {
            paths.push(uploads_dir.join(&clean_original));
        }
    }

    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}
