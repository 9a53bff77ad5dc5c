use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cv::locator::LocateError;
use crate::cv::models::{CvDocument, CvSummary};
use crate::cv::paths::{clean_filename, generate_file_id};
use crate::errors::AppError;
use crate::extraction::{is_failure_message, TextExtractor};
use crate::state::AppState;

/// Auth verification happens upstream; handlers only consume the resolved
/// user identity from the X-User-Id header the gateway sets.
fn user_id_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[derive(Deserialize)]
pub struct TextQuery {
    /// When true, stored text must also pass the CV content check before it
    /// is trusted.
    #[serde(default)]
    pub validate: bool,
}

/// POST /api/v1/cv
/// Multipart upload: saves the file under the uploads directory, runs a
/// best-effort extraction, and inserts the record into the primary
/// collection. Extraction failure does not fail the upload; lookup-time
/// recovery will retry later.
pub async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let mut upload: Option<(String, String, bytes::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("cv_file") {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
            upload = Some((original_name, content_type, data));
        }
    }
    let (original_name, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'cv_file' field".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let file_id = generate_file_id();
    let filename = format!("{file_id}_{}", clean_filename(&original_name));

    tokio::fs::create_dir_all(&state.config.uploads_dir)
        .await
        .map_err(|e| AppError::Storage(format!("Could not create uploads dir: {e}")))?;
    let file_path = state.config.uploads_dir.join(&filename);
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::Storage(format!("Could not save upload: {e}")))?;

    let text = state.extractor.extract(&file_path).await;
    let extracted_text = (!is_failure_message(&text)).then_some(text);
    let extracted_chars = extracted_text
        .as_deref()
        .map(|t| t.chars().count())
        .unwrap_or(0);

    let now = Utc::now();
    let doc = CvDocument {
        id: Uuid::new_v4().to_string(),
        user_id,
        file_id: file_id.clone(),
        filename: filename.clone(),
        original_name: original_name.clone(),
        file_path: file_path.to_string_lossy().into_owned(),
        content_type,
        file_size: data.len() as i64,
        extracted_text,
        content: None,
        cv_text: None,
        uploaded_at: now,
        last_used: now,
    };

    // New uploads always land in the primary collection; the secondary ones
    // exist only so old records stay findable.
    let collection = &state.config.cv_collections[0];
    state
        .store
        .insert(collection, &doc)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "id": doc.id,
        "fileId": file_id,
        "filename": filename,
        "originalName": original_name,
        "extractedChars": extracted_chars,
    })))
}

/// GET /api/v1/cv
/// Lists the caller's CV records across every configured collection.
pub async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let mut summaries: Vec<CvSummary> = Vec::new();
    for collection in &state.config.cv_collections {
        let docs = state
            .store
            .list_for_user(collection, &user_id)
            .await
            .map_err(AppError::Internal)?;
        summaries.extend(docs.iter().map(CvSummary::from));
    }
    summaries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

    Ok(Json(json!({ "cvs": summaries })))
}

/// GET /api/v1/cv/:id/text
/// Resolves the identifier and returns usable extracted text, recovering it
/// from disk if necessary.
pub async fn handle_get_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<TextQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let text = state
        .locator
        .get_usable_text(&id, &user_id, state.extractor.as_ref(), query.validate)
        .await
        .map_err(|e| match e {
            LocateError::NotFound => AppError::NotFound(format!("CV not found: {id}")),
            LocateError::InsufficientContent => AppError::InsufficientContent(
                "Could not extract sufficient content from CV".to_string(),
            ),
            LocateError::Store(e) => AppError::Internal(e),
        })?;

    Ok(Json(json!({
        "cvId": id,
        "characters": text.chars().count(),
        "text": text,
    })))
}
