//! CV record resolution and usable-text recovery.
//!
//! Identifiers arriving from the frontend are loosely specified: they may be
//! a record id, a file id, or a filename fragment, and the record may live
//! in any of several collections written by older code paths. The locator
//! tries each interpretation in a fixed order and, once a record is found,
//! makes a best effort to produce usable text for it, re-extracting from
//! disk and healing stale metadata along the way.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use base64::Engine;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cv::models::{looks_like_cv, meets_threshold, CvDocument};
use crate::cv::paths::candidate_paths;
use crate::cv::store::{CvStore, Lookup, LookupKey};
use crate::extraction::{
    is_failure_message, media_type_for, TextExtractor, VisionTranscriber, EXTERNAL_CALL_TIMEOUT,
};

/// A resolved record together with the collection it was found in, so
/// follow-up writes go back to the same table.
#[derive(Debug)]
pub struct Located {
    pub collection: String,
    pub doc: CvDocument,
}

#[derive(Debug, Error)]
pub enum LocateError {
    /// No record matched the identifier under any resolution strategy.
    #[error("CV not found")]
    NotFound,

    /// The record exists but no stored field, file re-extraction, or
    /// vision fallback produced usable text.
    #[error("Could not extract sufficient content from CV")]
    InsufficientContent,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Stateless resolver over the configured collections. Safe to share and
/// invoke concurrently; concurrent recovery of the same record is tolerated
/// (last writer wins, both compute equivalent text from the same file).
pub struct CvLocator {
    store: Arc<dyn CvStore>,
    collections: Vec<String>,
    uploads_dir: PathBuf,
    allow_unscoped_lookup: bool,
    vision: Option<Arc<dyn VisionTranscriber>>,
}

impl CvLocator {
    pub fn new(
        store: Arc<dyn CvStore>,
        collections: Vec<String>,
        uploads_dir: PathBuf,
        allow_unscoped_lookup: bool,
        vision: Option<Arc<dyn VisionTranscriber>>,
    ) -> Self {
        Self {
            store,
            collections,
            uploads_dir,
            allow_unscoped_lookup,
            vision,
        }
    }

    /// Resolves an identifier to a record. Strategy order per collection:
    /// native-key match, verbatim string match, file-id match — all
    /// owner-scoped. If every owner-scoped attempt fails, an unscoped pass
    /// runs only when explicitly enabled, then a filename-substring pass
    /// (owner-scoped) as the final fallback.
    pub async fn find_by_id(&self, id: &str, owner_id: &str) -> Result<Option<Located>> {
        let keys = resolution_keys(id);

        for collection in &self.collections {
            for key in &keys {
                let lookup = Lookup {
                    key: key.clone(),
                    owner: Some(owner_id),
                };
                if let Some(doc) = self.store.find_one(collection, &lookup).await? {
                    debug!("Resolved CV '{id}' in '{collection}' via {key:?}");
                    return Ok(Some(Located {
                        collection: collection.clone(),
                        doc,
                    }));
                }
            }
        }

        // Unscoped pass: records written by the oldest code path carry an
        // inconsistently named owner field, so the owner constraint can miss
        // them. Matching without it can return another user's record when
        // identifiers collide, hence the explicit opt-in.
        if self.allow_unscoped_lookup {
            warn!("Owner-scoped lookups failed for '{id}'; trying unscoped fallback");
            for collection in &self.collections {
                for key in &keys {
                    let lookup = Lookup {
                        key: key.clone(),
                        owner: None,
                    };
                    if let Some(doc) = self.store.find_one(collection, &lookup).await? {
                        warn!(
                            "Unscoped lookup matched CV '{}' in '{collection}' owned by '{}'",
                            doc.id, doc.user_id
                        );
                        return Ok(Some(Located {
                            collection: collection.clone(),
                            doc,
                        }));
                    }
                }
            }
        }

        for collection in &self.collections {
            let lookup = Lookup {
                key: LookupKey::FilenameContains(id),
                owner: Some(owner_id),
            };
            if let Some(doc) = self.store.find_one(collection, &lookup).await? {
                debug!("Resolved CV '{id}' in '{collection}' via filename match");
                return Ok(Some(Located {
                    collection: collection.clone(),
                    doc,
                }));
            }
        }

        Ok(None)
    }

    /// Resolves an identifier and returns usable text for the record,
    /// recovering it from disk if the stored fields are empty or stale.
    ///
    /// With `require_cv_content` set, stored text must also pass the
    /// career-keyword check; text that fails it triggers the same recovery
    /// chain as missing text.
    pub async fn get_usable_text(
        &self,
        id: &str,
        owner_id: &str,
        extractor: &dyn TextExtractor,
        require_cv_content: bool,
    ) -> Result<String, LocateError> {
        let Located { collection, doc } = self
            .find_by_id(id, owner_id)
            .await?
            .ok_or(LocateError::NotFound)?;

        let accept = |text: &str| !require_cv_content || looks_like_cv(text);

        // Stored text first: the extracted_text field, then the legacy
        // field names older records used. A field holding an old failure
        // sentinel, or text the content check rejects, is skipped in favor
        // of the next field before falling back to re-extraction.
        for text in doc.stored_texts() {
            if is_failure_message(text) {
                warn!(
                    "Stored text for CV {} is a stale failure sentinel; skipping field",
                    doc.id
                );
                continue;
            }
            if !accept(text) {
                warn!(
                    "Stored text for CV {} failed the content check; trying next field",
                    doc.id
                );
                continue;
            }
            let text = text.to_string();
            if let Err(e) = self.store.touch_last_used(&collection, &doc.id).await {
                warn!("Could not update last_used for CV {}: {e}", doc.id);
            }
            return Ok(text);
        }

        // Probe every naming convention the upload code has used and
        // re-extract from the first paths that still exist.
        let existing: Vec<PathBuf> = candidate_paths(&doc, &self.uploads_dir)
            .into_iter()
            .filter(|p| p.exists())
            .collect();

        for path in &existing {
            info!("Re-extracting CV {} from {}", doc.id, path.display());
            let text = extractor.extract(path).await;
            if !is_failure_message(&text) && meets_threshold(&text) && accept(&text) {
                self.persist_recovered(&collection, &doc, &text, path).await;
                return Ok(text);
            }
        }

        // Last resort: hand the raw file to the vision model directly.
        if let (Some(vision), Some(path)) = (self.vision.as_ref(), existing.first()) {
            if let Some(text) = vision_last_resort(vision.as_ref(), path).await {
                if meets_threshold(&text) && accept(&text) {
                    self.persist_recovered(&collection, &doc, &text, path).await;
                    return Ok(text);
                }
            }
        }

        Err(LocateError::InsufficientContent)
    }

    /// Writes recovered text back onto the record, healing the stored path
    /// when extraction succeeded from a different location. Failures here
    /// are logged, not propagated: the caller already has its text, and the
    /// next lookup will simply recover again.
    async fn persist_recovered(&self, collection: &str, doc: &CvDocument, text: &str, path: &Path) {
        let healed_path = (Path::new(&doc.file_path) != path).then_some(path);
        match self
            .store
            .update_extracted_text(collection, &doc.id, text, healed_path)
            .await
        {
            Ok(true) => {
                info!(
                    "Persisted {} recovered characters for CV {}{}",
                    text.chars().count(),
                    doc.id,
                    if healed_path.is_some() {
                        " (healed file path)"
                    } else {
                        ""
                    }
                );
            }
            Ok(false) => warn!("CV {} vanished before recovered text could be saved", doc.id),
            Err(e) => warn!("Could not persist recovered text for CV {}: {e}", doc.id),
        }
    }
}

/// The ordered identifier interpretations for the owner-scoped and unscoped
/// passes. The native-key strategy only applies when the identifier parses.
fn resolution_keys(id: &str) -> Vec<LookupKey<'_>> {
    let mut keys = Vec::new();
    if let Ok(uuid) = Uuid::parse_str(id) {
        keys.push(LookupKey::NativeId(uuid));
    }
    keys.push(LookupKey::StringId(id));
    keys.push(LookupKey::FileId(id));
    keys
}

async fn vision_last_resort(vision: &dyn VisionTranscriber, path: &Path) -> Option<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            warn!("Could not read {} for vision fallback: {e}", path.display());
            return None;
        }
    };
    let data_b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);

    match timeout(
        EXTERNAL_CALL_TIMEOUT,
        vision.transcribe(media_type_for(path), &data_b64),
    )
    .await
    {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!("Vision fallback failed for {}: {e}", path.display());
            None
        }
        Err(_) => {
            warn!("Vision fallback timed out for {}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MemoryStore {
        collections: Mutex<HashMap<String, Vec<CvDocument>>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                collections: Mutex::new(HashMap::new()),
            }
        }

        fn with_doc(collection: &str, doc: CvDocument) -> Arc<Self> {
            let store = Self::new();
            store
                .collections
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default()
                .push(doc);
            Arc::new(store)
        }

        fn get(&self, collection: &str, id: &str) -> Option<CvDocument> {
            self.collections
                .lock()
                .unwrap()
                .get(collection)?
                .iter()
                .find(|d| d.id == id)
                .cloned()
        }
    }

    fn matches(doc: &CvDocument, lookup: &Lookup<'_>) -> bool {
        if let Some(owner) = lookup.owner {
            if doc.user_id != owner {
                return false;
            }
        }
        match &lookup.key {
            LookupKey::NativeId(uuid) => doc.id == uuid.to_string(),
            LookupKey::StringId(s) => doc.id == *s,
            LookupKey::FileId(s) => doc.file_id == *s,
            LookupKey::FilenameContains(s) => doc.filename.contains(s),
        }
    }

    #[async_trait]
    impl CvStore for MemoryStore {
        async fn find_one(
            &self,
            collection: &str,
            lookup: &Lookup<'_>,
        ) -> Result<Option<CvDocument>> {
            Ok(self
                .collections
                .lock()
                .unwrap()
                .get(collection)
                .and_then(|docs| docs.iter().find(|d| matches(d, lookup)).cloned()))
        }

        async fn insert(&self, collection: &str, doc: &CvDocument) -> Result<()> {
            self.collections
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default()
                .push(doc.clone());
            Ok(())
        }

        async fn update_extracted_text(
            &self,
            collection: &str,
            id: &str,
            text: &str,
            healed_path: Option<&Path>,
        ) -> Result<bool> {
            let mut collections = self.collections.lock().unwrap();
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(false);
            };
            let Some(doc) = docs.iter_mut().find(|d| d.id == id) else {
                return Ok(false);
            };
            doc.extracted_text = Some(text.to_string());
            if let Some(path) = healed_path {
                doc.file_path = path.to_string_lossy().into_owned();
            }
            doc.last_used = Utc::now();
            Ok(true)
        }

        async fn touch_last_used(&self, collection: &str, id: &str) -> Result<()> {
            let mut collections = self.collections.lock().unwrap();
            if let Some(doc) = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            {
                doc.last_used = Utc::now();
            }
            Ok(())
        }

        async fn list_for_user(&self, collection: &str, user_id: &str) -> Result<Vec<CvDocument>> {
            Ok(self
                .collections
                .lock()
                .unwrap()
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| d.user_id == user_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    struct FixedExtractor {
        text: String,
        calls: AtomicUsize,
    }

    impl FixedExtractor {
        fn returning(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract(&self, _path: &Path) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.clone()
        }
    }

    fn doc(id: &str, user: &str) -> CvDocument {
        CvDocument {
            id: id.to_string(),
            user_id: user.to_string(),
            file_id: format!("20240115-103000-{id}"),
            filename: format!("20240115-103000-{id}_resume.pdf"),
            original_name: "resume.pdf".to_string(),
            file_path: format!("/uploads/{id}_resume.pdf"),
            content_type: "application/pdf".to_string(),
            file_size: 1024,
            extracted_text: None,
            content: None,
            cv_text: None,
            uploaded_at: Utc::now(),
            last_used: Utc::now(),
        }
    }

    fn locator(store: Arc<MemoryStore>, uploads_dir: &Path, unscoped: bool) -> CvLocator {
        CvLocator::new(
            store,
            vec!["cvs".to_string(), "resumes".to_string()],
            uploads_dir.to_path_buf(),
            unscoped,
            None,
        )
    }

    fn cv_body() -> String {
        format!("EXPERIENCE: {}", "maintained extraction pipelines. ".repeat(10))
    }

    #[tokio::test]
    async fn lookups_are_owner_scoped_by_default() {
        let store = MemoryStore::with_doc("cvs", doc("abc123", "u1"));
        let loc = locator(store, Path::new("/uploads"), false);

        assert!(loc.find_by_id("abc123", "u1").await.unwrap().is_some());
        assert!(loc.find_by_id("abc123", "u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unscoped_fallback_only_matches_when_opted_in() {
        let store = MemoryStore::with_doc("cvs", doc("abc123", "u1"));

        let strict = locator(store.clone(), Path::new("/uploads"), false);
        assert!(strict.find_by_id("abc123", "u2").await.unwrap().is_none());

        let permissive = locator(store, Path::new("/uploads"), true);
        let found = permissive.find_by_id("abc123", "u2").await.unwrap();
        assert_eq!(found.unwrap().doc.user_id, "u1");
    }

    #[tokio::test]
    async fn native_key_strategy_normalizes_uuid_formatting() {
        let uuid = Uuid::new_v4();
        let store = MemoryStore::with_doc("cvs", doc(&uuid.to_string(), "u1"));
        let loc = locator(store, Path::new("/uploads"), false);

        let shouty = uuid.to_string().to_uppercase();
        let found = loc.find_by_id(&shouty, "u1").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn file_id_and_filename_strategies_resolve() {
        let store = MemoryStore::with_doc("cvs", doc("abc123", "u1"));
        let loc = locator(store, Path::new("/uploads"), false);

        let by_file_id = loc.find_by_id("20240115-103000-abc123", "u1").await.unwrap();
        assert!(by_file_id.is_some());

        let by_fragment = loc.find_by_id("resume.pdf", "u1").await.unwrap();
        assert!(by_fragment.is_some());
    }

    #[tokio::test]
    async fn secondary_collections_are_searched() {
        let store = MemoryStore::new();
        store.insert("resumes", &doc("abc123", "u1")).await.unwrap();
        let loc = locator(Arc::new(store), Path::new("/uploads"), false);

        let found = loc.find_by_id("abc123", "u1").await.unwrap().unwrap();
        assert_eq!(found.collection, "resumes");
    }

    #[tokio::test]
    async fn unresolvable_id_is_not_found() {
        let store = MemoryStore::with_doc("cvs", doc("abc123", "u1"));
        let loc = locator(store.clone(), Path::new("/uploads"), false);

        assert!(loc.find_by_id("zzz", "u1").await.unwrap().is_none());

        let extractor = FixedExtractor::returning("");
        let err = loc
            .get_usable_text("zzz", "u1", extractor.as_ref(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::NotFound));
    }

    #[tokio::test]
    async fn stored_text_short_circuits_extraction() {
        let mut d = doc("abc123", "u1");
        let stored = cv_body();
        d.extracted_text = Some(stored.clone());
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, Path::new("/uploads"), false);

        let extractor = FixedExtractor::returning("should never be used");
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();
        assert_eq!(text, stored);
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn legacy_content_field_is_honored() {
        let mut d = doc("abc123", "u1");
        d.content = Some(cv_body());
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, Path::new("/uploads"), false);

        let extractor = FixedExtractor::returning("unused");
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();
        assert!(text.starts_with("EXPERIENCE:"));
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_text_is_recovered_from_file_and_persisted() {
        let uploads = tempfile::tempdir().unwrap();
        let file_path = uploads.path().join("abc123_resume.pdf");
        std::fs::File::create(&file_path)
            .unwrap()
            .write_all(b"%PDF-1.4 stub")
            .unwrap();

        let mut d = doc("abc123", "u1");
        d.extracted_text = Some(String::new());
        d.file_path = file_path.to_string_lossy().into_owned();
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store.clone(), uploads.path(), false);

        let recovered = cv_body();
        let extractor = FixedExtractor::returning(&recovered);
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();

        assert_eq!(text, recovered);
        assert_eq!(extractor.call_count(), 1);
        let persisted = store.get("cvs", "abc123").unwrap();
        assert_eq!(persisted.extracted_text.as_deref(), Some(recovered.as_str()));
    }

    #[tokio::test]
    async fn stale_path_is_healed_when_probe_finds_the_file() {
        let uploads = tempfile::tempdir().unwrap();
        let mut d = doc("abc123", "u1");
        d.file_path = "/gone/after/container/rebuild.pdf".to_string();
        // file exists under the current naming convention
        let real_path = uploads.path().join(format!("{}_resume.pdf", d.file_id));
        std::fs::write(&real_path, b"%PDF-1.4 stub").unwrap();

        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store.clone(), uploads.path(), false);

        let extractor = FixedExtractor::returning(&cv_body());
        loc.get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();

        let persisted = store.get("cvs", "abc123").unwrap();
        assert_eq!(persisted.file_path, real_path.to_string_lossy().into_owned());
    }

    #[tokio::test]
    async fn no_file_and_no_vision_is_insufficient_content() {
        let uploads = tempfile::tempdir().unwrap();
        let mut d = doc("abc123", "u1");
        d.file_path = "/nowhere/resume.pdf".to_string();
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, uploads.path(), false);

        let extractor = FixedExtractor::returning(&cv_body());
        let err = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::InsufficientContent));
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn thin_extraction_results_are_not_persisted() {
        let uploads = tempfile::tempdir().unwrap();
        let file_path = uploads.path().join("abc123_resume.pdf");
        std::fs::write(&file_path, b"%PDF-1.4 stub").unwrap();

        let mut d = doc("abc123", "u1");
        d.file_path = file_path.to_string_lossy().into_owned();
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store.clone(), uploads.path(), false);

        let extractor = FixedExtractor::returning("a few words only");
        let err = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::InsufficientContent));
        assert!(store.get("cvs", "abc123").unwrap().extracted_text.is_none());
    }

    #[tokio::test]
    async fn content_check_rejects_non_cv_text_and_triggers_recovery() {
        let uploads = tempfile::tempdir().unwrap();
        let mut d = doc("abc123", "u1");
        d.file_path = "/nowhere/resume.pdf".to_string();
        // long enough, but plainly not CV content
        d.extracted_text = Some("lorem ipsum dolor sit amet. ".repeat(10));
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, uploads.path(), false);

        let extractor = FixedExtractor::returning("");

        // without the check the stored text is returned as-is
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();
        assert!(text.starts_with("lorem ipsum"));

        // with the check it is rejected and recovery finds nothing
        let err = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::InsufficientContent));
    }

    #[tokio::test]
    async fn legacy_field_is_consulted_when_content_check_rejects_stored_text() {
        let uploads = tempfile::tempdir().unwrap();
        let mut d = doc("abc123", "u1");
        d.file_path = "/nowhere/resume.pdf".to_string();
        // primary field is long but plainly not a CV; the legacy field is
        d.extracted_text = Some("lorem ipsum dolor sit amet. ".repeat(10));
        let legacy = cv_body();
        d.content = Some(legacy.clone());
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, uploads.path(), false);

        let extractor = FixedExtractor::returning("");
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), true)
            .await
            .unwrap();
        assert_eq!(text, legacy);
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn stale_stored_sentinels_are_skipped_over() {
        let uploads = tempfile::tempdir().unwrap();
        let mut d = doc("abc123", "u1");
        d.file_path = "/nowhere/resume.pdf".to_string();
        // an old failure string persisted by a previous version, long
        // enough to pass the length threshold on its own
        d.extracted_text = Some(format!(
            "Failed to extract text from file: {}. The file may be scanned, image-based, or secured.",
            "a_very_long_filename_resume_final_v2_really_final.pdf"
        ));
        let legacy = cv_body();
        d.cv_text = Some(legacy.clone());
        let store = MemoryStore::with_doc("cvs", d.clone());
        let loc = locator(store, uploads.path(), false);

        let extractor = FixedExtractor::returning("");
        let text = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap();
        assert_eq!(text, legacy);

        // a record holding only the sentinel is insufficient, not served
        d.cv_text = None;
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store, uploads.path(), false);
        let err = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::InsufficientContent));
    }

    #[tokio::test]
    async fn failure_sentinels_from_the_extractor_are_never_persisted() {
        let uploads = tempfile::tempdir().unwrap();
        let file_path = uploads.path().join("abc123_resume.pdf");
        std::fs::write(&file_path, b"%PDF-1.4 stub").unwrap();

        let mut d = doc("abc123", "u1");
        d.file_path = file_path.to_string_lossy().into_owned();
        let store = MemoryStore::with_doc("cvs", d);
        let loc = locator(store.clone(), uploads.path(), false);

        // a long sentinel could otherwise pass the length threshold
        let sentinel = format!(
            "Failed to extract text from file: {}. The file may be scanned, image-based, or secured. Extra padding to exceed the threshold for this test case.",
            "a_very_long_filename_resume_final_v2_really_final.pdf"
        );
        let extractor = FixedExtractor::returning(&sentinel);
        let err = loc
            .get_usable_text("abc123", "u1", extractor.as_ref(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocateError::InsufficientContent));
        assert!(store.get("cvs", "abc123").unwrap().extracted_text.is_none());
    }
}
