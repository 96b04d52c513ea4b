use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub application_id: Uuid,
    pub talent_id: Uuid,
    pub company_id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub talent_unread_count: i32,
    pub company_unread_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Empty thread bound to one application; participants come straight from
    /// the application's own references.
    pub fn empty(application_id: Uuid, talent_id: Uuid, company_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            talent_id,
            company_id,
            messages: Vec::new(),
            last_message: String::new(),
            last_message_at: now,
            talent_unread_count: 0,
            company_unread_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub sender_role: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub sender_id: Uuid,
    pub sender_role: Role,
    pub body: String,
}

/// Which participant's unread counter an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSide {
    Talent,
    Company,
}

impl ChatSide {
    /// Side whose counter is reset when `role` reads the thread. Admins read on
    /// behalf of the company.
    pub fn reader(role: Role) -> Self {
        match role {
            Role::Talent => ChatSide::Talent,
            Role::Company | Role::Admin => ChatSide::Company,
        }
    }

    /// Side that gets notified when `role` writes.
    pub fn recipient(role: Role) -> Self {
        match role {
            Role::Talent => ChatSide::Company,
            Role::Company | Role::Admin => ChatSide::Talent,
        }
    }
}
