use axum::{extract::State, response::IntoResponse};

use crate::{dto::ApiResponse, error::Result, services::scheduler, AppState};

#[utoipa::path(
    post,
    path = "/api/admin/cleanup/applications",
    responses(
        (status = 200, description = "Cleanup summary"),
        (status = 403, description = "Admin access required")
    )
)]
#[axum::debug_handler]
pub async fn run_cleanup(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summary = scheduler::run_now(&state.cleanup_engine, "admin").await?;
    Ok(ApiResponse::ok(summary.message.clone(), summary))
}

#[utoipa::path(
    post,
    path = "/api/admin/cleanup/run-now",
    responses(
        (status = 200, description = "Cleanup summary from an immediate scheduler run"),
        (status = 403, description = "Admin access required")
    )
)]
#[axum::debug_handler]
pub async fn run_cleanup_now(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summary = scheduler::run_now(&state.cleanup_engine, "manual").await?;
    Ok(ApiResponse::ok(summary.message.clone(), summary))
}

#[utoipa::path(
    get,
    path = "/api/admin/cleanup/preview",
    responses(
        (status = 200, description = "Applications the next run would delete"),
        (status = 403, description = "Admin access required")
    )
)]
#[axum::debug_handler]
pub async fn preview_cleanup(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let preview = state.cleanup_engine.preview().await?;
    let message = format!("{} applications would be deleted", preview.count);
    Ok(ApiResponse::ok(message, preview))
}

#[utoipa::path(
    get,
    path = "/api/admin/cleanup/status",
    responses(
        (status = 200, description = "Retention rules, schedule and current counts"),
        (status = 403, description = "Admin access required")
    )
)]
#[axum::debug_handler]
pub async fn cleanup_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let status = state.cleanup_engine.status().await?;
    Ok(ApiResponse::ok("Cleanup status retrieved", status))
}
