//! Storage ports for applications, chats, and the job/profile directory.
//!
//! Two adapters implement every port: [`postgres`] for deployments and
//! [`memory`] for tests and database-less local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationScope, ApplicationStatus, ApplicationView,
};
use crate::models::chat::{Chat, ChatMessage, ChatSide};
use crate::models::job::{Job, Talent};

/// Result of a successful insert for a (talent, job) pair.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub application: Application,
    /// Terminal application that was deleted to make room.
    pub superseded: Option<Application>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Application>>;

    async fn find_for_pair(&self, talent_id: Uuid, job_id: Uuid) -> Result<Option<Application>>;

    /// Runs eligibility, deletes a superseded record, inserts `application`
    /// and bumps the job's application counter as one atomic step keyed on
    /// (talent, job). A blocking application yields `Error::Conflict`.
    async fn insert_superseding(&self, application: &Application) -> Result<ApplyOutcome>;

    /// Persists a mutated application. Fails with `Error::Conflict` when the
    /// stored version no longer matches `application.version`.
    async fn update(&self, application: &Application) -> Result<Application>;

    /// Flags the resume as deleted unless it already is. Returns the updated
    /// row, or `None` when the application is gone or was already flagged.
    async fn mark_file_deleted(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        by: Option<Uuid>,
    ) -> Result<Option<Application>>;

    /// Deletes the record and its chat. `Ok(false)` when it was already gone.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list_by_statuses(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>>;

    async fn count_by_status(
        &self,
        scope: ApplicationScope,
    ) -> Result<HashMap<ApplicationStatus, i64>>;

    async fn find_view(&self, id: Uuid) -> Result<Option<ApplicationView>>;

    async fn list_views(
        &self,
        scope: ApplicationScope,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationView>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Chat>>;

    /// Stores `chat` unless one already exists for its application; returns
    /// whichever chat is stored afterwards.
    async fn create_if_absent(&self, chat: &Chat) -> Result<Chat>;

    async fn append_message(
        &self,
        application_id: Uuid,
        message: &ChatMessage,
        notify: ChatSide,
    ) -> Result<ChatMessage>;

    /// `Ok(false)` when no chat exists for the application.
    async fn reset_unread(&self, application_id: Uuid, side: ChatSide) -> Result<bool>;
}

/// Read access to the job and profile records the lifecycle depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;

    async fn find_talent(&self, id: Uuid) -> Result<Option<Talent>>;

    /// Decrements the job's application counter, never below zero.
    async fn release_application_slot(&self, job_id: Uuid) -> Result<()>;
}

/// The set of adapters one process runs with.
#[derive(Clone)]
pub struct Storage {
    pub applications: Arc<dyn ApplicationRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub directory: Arc<dyn JobDirectory>,
}

impl Storage {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let repo = postgres::PgStore::new(pool);
        Self {
            applications: Arc::new(repo.clone()),
            chats: Arc::new(repo.clone()),
            directory: Arc::new(repo),
        }
    }

    pub fn memory(store: memory::MemoryStore) -> Self {
        Self {
            applications: Arc::new(store.clone()),
            chats: Arc::new(store.clone()),
            directory: Arc::new(store),
        }
    }
}
