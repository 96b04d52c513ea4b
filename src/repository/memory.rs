use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ApplicationRepository, ApplyOutcome, ChatRepository, JobDirectory};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationScope, ApplicationStatus, ApplicationView,
};
use crate::models::chat::{Chat, ChatMessage, ChatSide};
use crate::models::job::{Company, Job, Talent};
use crate::services::eligibility;

#[derive(Default)]
struct State {
    applications: HashMap<Uuid, Application>,
    // keyed by application id
    chats: HashMap<Uuid, Chat>,
    jobs: HashMap<Uuid, Job>,
    talents: HashMap<Uuid, Talent>,
    companies: HashMap<Uuid, Company>,
}

impl State {
    fn view(&self, application: &Application) -> ApplicationView {
        ApplicationView {
            application: application.clone(),
            job_title: self.jobs.get(&application.job_id).map(|j| j.title.clone()),
            company_name: self
                .companies
                .get(&application.company_id)
                .map(|c| c.company_name.clone()),
            talent_name: self.talents.get(&application.talent_id).map(|t| t.name.clone()),
        }
    }
}

/// Process-local store implementing every storage port. One lock guards all
/// tables, so each port call is atomic with respect to the others.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_job(&self, job: Job) {
        self.state.lock().await.jobs.insert(job.id, job);
    }

    pub async fn insert_talent(&self, talent: Talent) {
        self.state.lock().await.talents.insert(talent.id, talent);
    }

    pub async fn insert_company(&self, company: Company) {
        self.state.lock().await.companies.insert(company.id, company);
    }

    /// Stores an application as-is, bypassing eligibility and counters.
    pub async fn insert_application(&self, application: Application) {
        self.state
            .lock()
            .await
            .applications
            .insert(application.id, application);
    }

    pub async fn application_count(&self) -> usize {
        self.state.lock().await.applications.len()
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.state.lock().await.applications.get(&id).cloned())
    }

    async fn find_for_pair(&self, talent_id: Uuid, job_id: Uuid) -> Result<Option<Application>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .values()
            .find(|a| a.talent_id == talent_id && a.job_id == job_id)
            .cloned())
    }

    async fn insert_superseding(&self, application: &Application) -> Result<ApplyOutcome> {
        let mut state = self.state.lock().await;

        let existing = state
            .applications
            .values()
            .find(|a| a.talent_id == application.talent_id && a.job_id == application.job_id)
            .cloned();

        let decision = eligibility::resolve(existing.as_ref());
        if !decision.allowed {
            return Err(Error::Conflict(decision.reason));
        }

        let superseded = match existing {
            Some(previous) if decision.supersede => {
                state.applications.remove(&previous.id);
                state.chats.remove(&previous.id);
                Some(previous)
            }
            _ => None,
        };

        state
            .applications
            .insert(application.id, application.clone());
        if !superseded.as_ref().is_some_and(|p| p.status.holds_job_slot()) {
            if let Some(job) = state.jobs.get_mut(&application.job_id) {
                job.application_count += 1;
            }
        }

        Ok(ApplyOutcome {
            application: application.clone(),
            superseded,
        })
    }

    async fn update(&self, application: &Application) -> Result<Application> {
        let mut state = self.state.lock().await;
        let stored = state
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        if stored.version != application.version {
            return Err(Error::Conflict(
                "Application was modified concurrently, reload and retry".to_string(),
            ));
        }

        *stored = application.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn mark_file_deleted(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        by: Option<Uuid>,
    ) -> Result<Option<Application>> {
        let mut state = self.state.lock().await;
        match state.applications.get_mut(&id) {
            Some(app) if !app.file_deleted => {
                app.file_deleted = true;
                app.file_deleted_at = Some(at);
                app.file_deleted_by = by;
                app.updated_at = at;
                app.version += 1;
                Ok(Some(app.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.chats.remove(&id);
        Ok(state.applications.remove(&id).is_some())
    }

    async fn list_by_statuses(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>> {
        let state = self.state.lock().await;
        let mut found: Vec<Application> = state
            .applications
            .values()
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.created_at);
        Ok(found)
    }

    async fn count_by_status(
        &self,
        scope: ApplicationScope,
    ) -> Result<HashMap<ApplicationStatus, i64>> {
        let state = self.state.lock().await;
        let mut counts = HashMap::new();
        for app in state.applications.values().filter(|a| scope.contains(a)) {
            *counts.entry(app.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<ApplicationView>> {
        let state = self.state.lock().await;
        Ok(state.applications.get(&id).map(|a| state.view(a)))
    }

    async fn list_views(
        &self,
        scope: ApplicationScope,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationView>> {
        let state = self.state.lock().await;
        let mut views: Vec<ApplicationView> = state
            .applications
            .values()
            .filter(|a| scope.contains(a))
            .filter(|a| status.map_or(true, |s| a.status == s))
            .map(|a| state.view(a))
            .collect();
        views.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(views)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Chat>> {
        Ok(self.state.lock().await.chats.get(&application_id).cloned())
    }

    async fn create_if_absent(&self, chat: &Chat) -> Result<Chat> {
        let mut state = self.state.lock().await;
        let stored = state
            .chats
            .entry(chat.application_id)
            .or_insert_with(|| chat.clone());
        Ok(stored.clone())
    }

    async fn append_message(
        &self,
        application_id: Uuid,
        message: &ChatMessage,
        notify: ChatSide,
    ) -> Result<ChatMessage> {
        let mut state = self.state.lock().await;
        let chat = state
            .chats
            .get_mut(&application_id)
            .ok_or_else(|| Error::NotFound("Chat not found".to_string()))?;

        let mut stored = message.clone();
        stored.chat_id = chat.id;
        chat.messages.push(stored.clone());
        chat.last_message = stored.body.clone();
        chat.last_message_at = stored.created_at;
        chat.updated_at = stored.created_at;
        match notify {
            ChatSide::Talent => chat.talent_unread_count += 1,
            ChatSide::Company => chat.company_unread_count += 1,
        }
        Ok(stored)
    }

    async fn reset_unread(&self, application_id: Uuid, side: ChatSide) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.chats.get_mut(&application_id) {
            Some(chat) => {
                match side {
                    ChatSide::Talent => chat.talent_unread_count = 0,
                    ChatSide::Company => chat.company_unread_count = 0,
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl JobDirectory for MemoryStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.state.lock().await.jobs.get(&id).cloned())
    }

    async fn find_talent(&self, id: Uuid) -> Result<Option<Talent>> {
        Ok(self.state.lock().await.talents.get(&id).cloned())
    }

    async fn release_application_slot(&self, job_id: Uuid) -> Result<()> {
        if let Some(job) = self.state.lock().await.jobs.get_mut(&job_id) {
            job.application_count = (job.application_count - 1).max(0);
        }
        Ok(())
    }
}
