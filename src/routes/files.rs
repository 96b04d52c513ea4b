use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};

use crate::{
    dto::{application_dto::UploadedResume, ApiResponse},
    error::{Error, Result},
    models::user::{Actor, Role},
    AppState,
};

const FILE_FIELDS: [&str; 2] = ["cv", "resume"];

#[utoipa::path(
    post,
    path = "/api/files/upload",
    responses(
        (status = 201, description = "Resume stored; use the returned url as resumeUrl"),
        (status = 400, description = "Missing, empty, oversized or disallowed file"),
        (status = 403, description = "Caller is not a talent")
    )
)]
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    actor.require_role(Role::Talent)?;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let data = field.bytes().await?;
        if data.len() > state.config.max_upload_bytes {
            return Err(Error::BadRequest(format!(
                "File exceeds the {} byte limit",
                state.config.max_upload_bytes
            )));
        }

        let stored = state.file_store.save(&original_name, data).await?;
        let uploaded = UploadedResume {
            url: stored.url,
            file_name: stored.file_name,
            original_name,
            size: stored.size,
            content_type: stored.content_type,
        };
        return Ok((
            StatusCode::CREATED,
            ApiResponse::ok("File uploaded successfully", uploaded),
        ));
    }

    Err(Error::BadRequest("CV file is required".to_string()))
}
