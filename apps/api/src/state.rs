use std::sync::Arc;

use crate::config::Config;
use crate::cv::locator::CvLocator;
use crate::cv::store::CvStore;
use crate::extraction::DocumentExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Direct store access for inserts and listings; lookups go through the
    /// locator instead.
    pub store: Arc<dyn CvStore>,
    pub locator: Arc<CvLocator>,
    pub extractor: Arc<DocumentExtractor>,
    pub config: Config,
}
