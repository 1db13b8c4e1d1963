//! Prescription upload endpoint.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::intake::{IntakeOutcome, UploadRequest};

/// `POST /api/intake`: multipart form with a single `file` field.
///
/// The part's content type is authoritative; when the browser sends none
/// (or a generic octet-stream) it is guessed from the file name.
pub async fn submit(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<IntakeOutcome>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .filter(|ct| !ct.eq_ignore_ascii_case("application/octet-stream"))
            .map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?
            .to_vec();

        upload = Some(match (content_type, file_name) {
            (Some(ct), Some(name)) => UploadRequest::new(bytes, ct).with_file_name(name),
            (Some(ct), None) => UploadRequest::new(bytes, ct),
            (None, Some(name)) => UploadRequest::from_file_name(bytes, &name),
            (None, None) => UploadRequest::new(bytes, "application/octet-stream"),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".into()))?;
    if upload.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    Ok(Json(ctx.core.submit_prescription(upload).await?))
}
