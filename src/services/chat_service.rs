use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::chat::{Chat, ChatMessage, ChatSide, NewChatMessage};
use crate::models::user::Actor;
use crate::repository::{ApplicationRepository, ChatRepository};
use crate::utils::time::Clock;

#[derive(Clone)]
pub struct ChatService {
    applications: Arc<dyn ApplicationRepository>,
    chats: Arc<dyn ChatRepository>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        chats: Arc<dyn ChatRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            chats,
            clock,
        }
    }

    /// Idempotent: returns the existing thread when there is one.
    pub async fn ensure_chat(&self, application: &Application) -> Result<Chat> {
        let chat = Chat::empty(
            application.id,
            application.talent_id,
            application.company_id,
            self.clock.now(),
        );
        self.chats.create_if_absent(&chat).await
    }

    async fn accessible_application(&self, actor: &Actor, application_id: Uuid) -> Result<Application> {
        let application = self
            .applications
            .find(application_id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        if !application.is_visible_to(actor) {
            return Err(Error::Forbidden(
                "You are not a participant of this chat".to_string(),
            ));
        }
        Ok(application)
    }

    pub async fn open(&self, actor: &Actor, application_id: Uuid) -> Result<Chat> {
        let application = self.accessible_application(actor, application_id).await?;
        let mut chat = self.ensure_chat(&application).await?;

        let side = ChatSide::reader(actor.role);
        if self.chats.reset_unread(application_id, side).await? {
            match side {
                ChatSide::Talent => chat.talent_unread_count = 0,
                ChatSide::Company => chat.company_unread_count = 0,
            }
        }
        Ok(chat)
    }

    pub async fn send(
        &self,
        actor: &Actor,
        application_id: Uuid,
        message: NewChatMessage,
    ) -> Result<ChatMessage> {
        let application = self.accessible_application(actor, application_id).await?;
        let chat = self.ensure_chat(&application).await?;

        let body = message.body.trim().to_string();
        if body.is_empty() {
            return Err(Error::BadRequest("Message cannot be empty".to_string()));
        }

        let entry = ChatMessage {
            id: Uuid::new_v4(),
            chat_id: chat.id,
            sender_id: message.sender_id,
            sender_role: message.sender_role.as_str().to_string(),
            body,
            created_at: self.clock.now(),
        };
        let stored = self
            .chats
            .append_message(application_id, &entry, ChatSide::recipient(message.sender_role))
            .await?;

        tracing::info!(application_id = %application_id, sender = %actor.user_id, "Chat message sent");
        Ok(stored)
    }

    pub async fn mark_read(&self, actor: &Actor, application_id: Uuid) -> Result<()> {
        self.accessible_application(actor, application_id).await?;
        if self
            .chats
            .reset_unread(application_id, ChatSide::reader(actor.role))
            .await?
        {
            Ok(())
        } else {
            Err(Error::NotFound("Chat not found".to_string()))
        }
    }
}
