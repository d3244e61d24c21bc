// src/handlers/upload.rs

use axum::extract::multipart::{Field, MultipartError};

use crate::{common::error::AppError, services::document_service::UploadedFile};

pub fn upload_error(e: MultipartError) -> AppError {
    AppError::Upload(format!("Upload error: {}", e.body_text()))
}

/// Buffers one file part. Type and size checks happen in the document service.
pub async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(upload_error)?;

    Ok(UploadedFile { file_name, content_type, bytes })
}

pub async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(upload_error)
}
