use crate::error::{api_success, ApiError, ApiResponse, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use claims_service::{ClaimImporter, DetailImporter, FileFormat, ImportReport};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Reports for whichever files were uploaded
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub claims: Option<ImportReport>,
    pub details: Option<ImportReport>,
    pub messages: Vec<String>,
}

/// One uploaded file held in memory until the form is fully read
struct UploadedFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Write the upload to a temporary file whose suffix carries the format,
    /// so the importer can detect it the same way as for local files
    fn spool(&self, declared: Option<FileFormat>) -> std::io::Result<NamedTempFile> {
        let extension = declared.map(|format| format.to_string()).or_else(|| {
            self.file_name
                .as_deref()
                .and_then(|name| Path::new(name).extension())
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        });
        let suffix = extension.map(|ext| format!(".{}", ext)).unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("claimtrack-upload")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        Ok(file)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Import an uploaded claims file and/or claim details file.
///
/// Multipart fields: `claims_file`, `details_file`, `file_format` (json|csv,
/// otherwise taken from the file name) and `clear_existing`. Claims are
/// imported before details so details can reference freshly loaded claims.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<UploadResponse>>> {
    let mut claims_file = None;
    let mut details_file = None;
    let mut file_format = None;
    let mut clear_existing = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "claims_file" | "details_file" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                let upload = UploadedFile { file_name, bytes };
                if name == "claims_file" {
                    claims_file = Some(upload);
                } else {
                    details_file = Some(upload);
                }
            }
            "file_format" => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    let format = value.parse::<FileFormat>().map_err(ApiError::validation)?;
                    file_format = Some(format);
                }
            }
            "clear_existing" => {
                clear_existing = parse_flag(&field.text().await?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload field");
            }
        }
    }

    if claims_file.is_none() && details_file.is_none() {
        return Err(ApiError::bad_request("No files were uploaded"));
    }

    let mode = state.config.import.coercion;
    let mut response = UploadResponse {
        claims: None,
        details: None,
        messages: Vec::new(),
    };

    if let Some(upload) = claims_file {
        let spooled = upload.spool(file_format)?;
        info!(bytes = upload.bytes.len(), clear_existing, "Importing uploaded claims file");
        let report = ClaimImporter::new(state.store.clone(), mode)
            .import_file(spooled.path(), file_format, clear_existing)
            .await?;
        response.messages.push(report.summary());
        response.claims = Some(report);
    }

    if let Some(upload) = details_file {
        let spooled = upload.spool(file_format)?;
        info!(bytes = upload.bytes.len(), clear_existing, "Importing uploaded claim details file");
        let report = DetailImporter::new(state.store.clone(), mode)
            .import_file(spooled.path(), file_format, clear_existing)
            .await?;
        response.messages.push(report.summary());
        response.details = Some(report);
    }

    Ok(Json(api_success(response)))
}
