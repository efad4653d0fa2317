use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::resume::extractor::ExtractionSource;
use crate::resume::text::extract_text;
use crate::state::AppState;

const DEFAULT_FILENAME: &str = "resume.bin";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub employee_id: Option<String>,
}

#[derive(Debug)]
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    employee_id: Option<String>,
    name: Option<String>,
    role: Option<String>,
}

/// Whose record the upload feeds.
enum UploadTarget {
    Existing(Candidate),
    New { name: String },
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_key: String,
    pub extraction_source: ExtractionSource,
    pub employee: Candidate,
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Drops any client-side directory components from the uploaded name.
fn safe_filename(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        base.to_string()
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Malformed multipart body: {e}"))
    };

    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" | "resume" if form.file.is_none() => {
                let filename = safe_filename(field.file_name().unwrap_or(DEFAULT_FILENAME));
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "employee_id" => form.employee_id = non_blank(field.text().await.map_err(malformed)?),
            "name" => form.name = non_blank(field.text().await.map_err(malformed)?),
            "role" => form.role = non_blank(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }
    Ok(form)
}

/// POST /resume/upload
///
/// Stores the resume, extracts canonical fields from it and either refreshes
/// the referenced employee or creates a new one.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut form = read_form(multipart).await?;
    let file = form
        .file
        .take()
        .ok_or_else(|| AppError::Validation("No file. Expect 'file' (or 'resume').".to_string()))?;

    let employee_id = form.employee_id.take().or(query.employee_id.and_then(non_blank));
    let target = match employee_id {
        Some(raw) => {
            let id = Uuid::parse_str(&raw)
                .map_err(|_| AppError::Validation(format!("Invalid employee_id '{raw}'")))?;
            let existing = state
                .candidates
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))?;
            UploadTarget::Existing(existing)
        }
        None => match form.name.take() {
            Some(name) => UploadTarget::New { name },
            None => {
                return Err(AppError::Validation(
                    "Missing 'employee_id' (update) or 'name' (create).".to_string(),
                ))
            }
        },
    };

    let file_key = format!("resumes/{}/{}", Uuid::new_v4(), file.filename);
    state
        .blobs
        .put(&file_key, file.bytes.clone(), &file.content_type)
        .await?;

    let text = extract_text(file.bytes, &file.filename, &file.content_type).await;
    let (fields, extraction_source) = state.extractor.extract(&text).await;
    let extracted_availability = fields.availability.clone();

    let employee = match target {
        UploadTarget::Existing(mut employee) => {
            employee.apply_extraction(fields);
            if employee.role.is_none() {
                employee.role = form.role;
            }
            employee.cv_file_key = Some(file_key.clone());
            state.candidates.update(&employee).await?;
            employee
        }
        UploadTarget::New { name } => {
            let mut employee = Candidate::new(name);
            employee.role = form.role;
            employee.apply_extraction(fields);
            employee.availability = extracted_availability;
            employee.cv_file_key = Some(file_key.clone());
            state.candidates.insert(&employee).await?;
            employee
        }
    };

    info!(
        "Resume {} processed for employee {} via {:?} ({} skills)",
        file_key,
        employee.id,
        extraction_source,
        employee.skills.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_key,
            extraction_source,
            employee,
        }),
    ))
}
