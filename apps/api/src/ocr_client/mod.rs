/// OCR Client — wraps the Google Cloud Vision `images:annotate` REST API.
///
/// Only DOCUMENT_TEXT_DETECTION is used: it is tuned for dense text (scanned
/// CV pages) rather than sparse scene text.
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::extraction::OcrEngine;

const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vision API error: {0}")]
    Api(String),

    #[error("Vision API returned no annotation")]
    EmptyAnnotation,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    image: ImageContent<'a>,
    features: Vec<Feature<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    feature_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    message: String,
}

/// Google Cloud Vision client, authenticated by API key.
#[derive(Clone)]
pub struct OcrClient {
    client: Client,
    api_key: String,
}

impl OcrClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl OcrEngine for OcrClient {
    /// Runs document text detection over a single image and returns the full
    /// detected text.
    async fn detect_text(&self, image: &[u8]) -> Result<String> {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        let request_body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent { content: &content },
                features: vec![Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                }],
            }],
        };

        let response = self
            .client
            .post(VISION_API_URL)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(OcrError::Http)?
            .error_for_status()
            .map_err(OcrError::Http)?;

        let annotate: AnnotateResponse = response.json().await.map_err(OcrError::Http)?;
        let image_response = annotate
            .responses
            .into_iter()
            .next()
            .ok_or(OcrError::EmptyAnnotation)?;

        if let Some(status) = image_response.error {
            return Err(OcrError::Api(status.message).into());
        }

        let annotation = image_response
            .full_text_annotation
            .ok_or(OcrError::EmptyAnnotation)?;

        debug!(
            "Vision OCR detected {} characters",
            annotation.text.chars().count()
        );
        Ok(annotation.text)
    }
}
