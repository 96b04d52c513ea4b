use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationListQuery, ApplicationSummary, CreateApplicationPayload,
            UpdateStatusPayload,
        },
        ApiResponse,
    },
    error::Result,
    models::user::Actor,
    services::application_service::Removal,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationSummary),
        (status = 400, description = "Invalid payload or deadline passed"),
        (status = 404, description = "Job or talent profile not found"),
        (status = 409, description = "An active application already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state.application_service.apply(&actor, payload).await?;
    let summary = ApplicationSummary::new(
        &outcome.application,
        outcome.superseded.as_ref().map(|previous| previous.id),
    );
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Application submitted successfully", summary),
    ))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}/eligibility",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Whether the caller may apply"),
        (status = 403, description = "Caller is not a talent")
    )
)]
#[axum::debug_handler]
pub async fn check_eligibility(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let eligibility = state.application_service.can_apply(&actor, job_id).await?;
    Ok(ApiResponse::ok(eligibility.reason.clone(), eligibility))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with job, company and talent names"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.application_service.get_view(&actor, id).await?;
    Ok(ApiResponse::ok("Application retrieved", view))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 403, description = "Caller may not change this application"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Concurrent modification")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .update_status(&actor, id, payload)
        .await?;
    let message = format!("Application status updated to {}", application.status);
    Ok(ApiResponse::ok(message, application))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Cancelled (talent) or deleted (admin)"),
        (status = 400, description = "Application is already final"),
        (status = 403, description = "Caller may not remove this application"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let response = match state.application_service.remove(&actor, id).await? {
        Removal::Cancelled(application) => {
            ApiResponse::ok("Application cancelled", Some(application))
        }
        Removal::Deleted => ApiResponse::ok("Application deleted", None),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/cv",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Resume file stream"),
        (status = 404, description = "No resume attached or file missing")
    )
)]
#[axum::debug_handler]
pub async fn download_cv(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let download = state.application_service.open_resume(&actor, id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_file_name(&download.file_name)
    );
    let headers = [
        (header::CONTENT_TYPE, download.file.stat.content_type.clone()),
        (header::CONTENT_LENGTH, download.file.stat.size.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(download.file.file));
    Ok((headers, body))
}

fn header_safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"' && *c != '\\')
        .collect();
    if cleaned.trim().is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

#[utoipa::path(
    get,
    path = "/api/applications/me",
    params(
        ("status" = Option<String>, Query, description = "Only this status")
    ),
    responses(
        (status = 200, description = "Talent's applications with statistics"),
        (status = 403, description = "Caller is not a talent")
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let list = state
        .application_service
        .list_for_talent(&actor, query.status.as_deref())
        .await?;
    Ok(ApiResponse::ok("Applications retrieved", list))
}

#[utoipa::path(
    get,
    path = "/api/applications/company",
    params(
        ("status" = Option<String>, Query, description = "Only this status")
    ),
    responses(
        (status = 200, description = "Company's applicants with statistics"),
        (status = 403, description = "Caller is not a company")
    )
)]
#[axum::debug_handler]
pub async fn company_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let list = state
        .application_service
        .list_for_company(&actor, query.status.as_deref())
        .await?;
    Ok(ApiResponse::ok("Applications retrieved", list))
}

#[cfg(test)]
mod tests {
    use super::header_safe_file_name;

    #[test]
    fn strips_quotes_and_non_ascii_from_download_names() {
        assert_eq!(header_safe_file_name("my \"cv\".pdf"), "my cv.pdf");
        assert_eq!(header_safe_file_name("résumé.pdf"), "rsum.pdf");
        assert_eq!(header_safe_file_name("\u{7}"), "resume");
    }
}
