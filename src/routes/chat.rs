use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{chat_dto::SendMessagePayload, ApiResponse},
    error::Result,
    models::{chat::NewChatMessage, user::Actor},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/chat/{application_id}",
    params(
        ("application_id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Chat with its messages; the caller's unread counter is reset"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn open_chat(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let chat = state.chat_service.open(&actor, application_id).await?;
    Ok(ApiResponse::ok("Chat retrieved", chat))
}

#[utoipa::path(
    post,
    path = "/api/chat/{application_id}/messages",
    params(
        ("application_id" = Uuid, Path, description = "Application ID")
    ),
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Message appended"),
        (status = 400, description = "Empty or oversized message"),
        (status = 403, description = "Not a participant")
    )
)]
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let message = state
        .chat_service
        .send(
            &actor,
            application_id,
            NewChatMessage {
                sender_id: actor.user_id,
                sender_role: actor.role,
                body: payload.message,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Message sent", message)))
}

#[utoipa::path(
    patch,
    path = "/api/chat/{application_id}/read",
    params(
        ("application_id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Unread counter reset"),
        (status = 404, description = "No chat for this application")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.chat_service.mark_read(&actor, application_id).await?;
    Ok(ApiResponse::message("Messages marked as read"))
}
