pub mod admin;
pub mod applications;
pub mod chat;
pub mod files;
pub mod health;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};

use crate::middleware::auth::{require_admin, require_auth};
use crate::AppState;

/// Every API route with its auth layers. Transport layers (CORS, tracing,
/// body limits, static uploads) are added by the binary.
pub fn router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/api/admin/cleanup/applications", post(admin::run_cleanup))
        .route("/api/admin/cleanup/run-now", post(admin::run_cleanup_now))
        .route("/api/admin/cleanup/preview", get(admin::preview_cleanup))
        .route("/api/admin/cleanup/status", get(admin::cleanup_status))
        .route_layer(from_fn(require_admin));

    let api = Router::new()
        .route("/api/applications", post(applications::create_application))
        .route("/api/applications/me", get(applications::my_applications))
        .route(
            "/api/applications/company",
            get(applications::company_applications),
        )
        .route(
            "/api/applications/:id",
            get(applications::get_application).delete(applications::delete_application),
        )
        .route(
            "/api/applications/:id/status",
            put(applications::update_status),
        )
        .route("/api/applications/:id/cv", get(applications::download_cv))
        .route(
            "/api/jobs/:job_id/eligibility",
            get(applications::check_eligibility),
        )
        .route("/api/files/upload", post(files::upload_resume))
        .route("/api/chat/:application_id", get(chat::open_chat))
        .route(
            "/api/chat/:application_id/messages",
            post(chat::send_message),
        )
        .route("/api/chat/:application_id/read", patch(chat::mark_read))
        .merge(admin_api)
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
