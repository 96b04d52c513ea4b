use axum::http::header;
use tower_http::cors::{Any, CorsLayer};

/// Browsers need `Content-Disposition` exposed to name CV downloads.
pub fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}
