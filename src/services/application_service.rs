use std::sync::Arc;
use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicationListResponse, CreateApplicationPayload, StatusStatistics, UpdateStatusPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{
    ApplicantSnapshot, Application, ApplicationScope, ApplicationStatus, ApplicationView,
    NewApplication, ResumeAttachment,
};
use crate::models::user::{Actor, Role};
use crate::repository::{ApplicationRepository, ApplyOutcome, JobDirectory, Storage};
use crate::services::chat_service::ChatService;
use crate::services::eligibility::{self, Eligibility};
use crate::services::file_store::{file_name_from_url, FileStore, OpenedFile};
use crate::services::status_machine::{self, TransitionRequest};
use crate::utils::time::Clock;

/// What `DELETE /applications/:id` ended up doing.
#[derive(Debug, Clone)]
pub enum Removal {
    Cancelled(Application),
    Deleted,
}

pub struct ResumeDownload {
    pub file: OpenedFile,
    pub file_name: String,
}

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    directory: Arc<dyn JobDirectory>,
    files: Arc<dyn FileStore>,
    chats: ChatService,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    pub fn new(
        storage: &Storage,
        files: Arc<dyn FileStore>,
        chats: ChatService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications: storage.applications.clone(),
            directory: storage.directory.clone(),
            files,
            chats,
            clock,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Application> {
        self.applications
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    fn talent_profile(actor: &Actor) -> Result<Uuid> {
        actor.require_role(Role::Talent)?;
        actor.require_profile()
    }

    pub async fn can_apply(&self, actor: &Actor, job_id: Uuid) -> Result<Eligibility> {
        let talent_id = Self::talent_profile(actor)?;
        let existing = self.applications.find_for_pair(talent_id, job_id).await?;
        Ok(eligibility::resolve(existing.as_ref()))
    }

    async fn resolve_resume(
        &self,
        payload_url: Option<&str>,
        payload_name: Option<String>,
        profile_url: Option<&str>,
    ) -> Result<Option<ResumeAttachment>> {
        let attach = |url: &str, name: Option<String>, size, content_type| ResumeAttachment {
            url: url.to_string(),
            file_name: name.or_else(|| file_name_from_url(url).map(str::to_string)),
            file_size: Some(size),
            file_type: Some(content_type),
        };

        if let Some(url) = payload_url.filter(|u| !u.trim().is_empty()) {
            let stat = self
                .files
                .stat(url)
                .await?
                .ok_or_else(|| Error::BadRequest("Uploaded resume file was not found".to_string()))?;
            return Ok(Some(attach(url, payload_name, stat.size, stat.content_type)));
        }

        if let Some(url) = profile_url.filter(|u| !u.trim().is_empty()) {
            match self.files.stat(url).await? {
                Some(stat) => return Ok(Some(attach(url, None, stat.size, stat.content_type))),
                None => tracing::warn!(resume_url = %url, "Profile resume is missing, applying without it"),
            }
        }

        Ok(None)
    }

    pub async fn apply(&self, actor: &Actor, payload: CreateApplicationPayload) -> Result<ApplyOutcome> {
        let talent_id = Self::talent_profile(actor)?;
        let now = self.clock.now();

        let job = self
            .directory
            .find_job(payload.job_id)
            .await?
            .filter(|job| job.is_active)
            .ok_or_else(|| Error::NotFound("Job not found or no longer active".to_string()))?;
        if !job.accepts_applications_at(now) {
            return Err(Error::BadRequest(
                "The application deadline for this job has passed".to_string(),
            ));
        }

        let talent = self
            .directory
            .find_talent(talent_id)
            .await?
            .ok_or_else(|| Error::NotFound("Talent profile not found".to_string()))?;

        let resume = self
            .resolve_resume(
                payload.resume_url.as_deref(),
                payload.resume_file_name,
                talent.resume_url.as_deref(),
            )
            .await?;

        let application = Application::new(
            NewApplication {
                talent_id,
                job_id: job.id,
                company_id: job.company_id,
                submitted_by: actor.user_id,
                cover_letter: payload.cover_letter.filter(|c| !c.trim().is_empty()),
                applicant: ApplicantSnapshot {
                    full_name: payload.full_name.trim().to_string(),
                    email: payload.email.trim().to_string(),
                    phone: payload.phone.trim().to_string(),
                    experience_years: payload.experience_years,
                    skills: payload.skills,
                },
                resume,
            },
            now,
        );

        let outcome = self.applications.insert_superseding(&application).await?;

        if let Some(previous) = &outcome.superseded {
            tracing::info!(
                application_id = %previous.id,
                status = %previous.status,
                "Replaced earlier application"
            );
            if let Some(url) = previous.live_resume() {
                if outcome.application.resume_url.as_deref() != Some(url) {
                    if let Err(e) = self.files.delete(url).await {
                        tracing::warn!(application_id = %previous.id, error = %e, "Failed to delete superseded resume");
                    }
                }
            }
        }

        if let Err(e) = self.chats.ensure_chat(&outcome.application).await {
            tracing::warn!(application_id = %outcome.application.id, error = %e, "Failed to create application chat");
        }

        tracing::info!(
            application_id = %outcome.application.id,
            job_id = %job.id,
            talent_id = %talent_id,
            has_resume = outcome.application.has_resume(),
            "Application submitted"
        );
        Ok(outcome)
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateStatusPayload,
    ) -> Result<Application> {
        let mut application = self.load(id).await?;
        let request = TransitionRequest {
            status: payload.status,
            notes: payload.notes,
            feedback: payload.feedback,
            interview_scheduled_at: payload.interview_scheduled_at,
        };
        let transition =
            status_machine::transition(&mut application, request, actor, self.clock.now())?;

        let saved = self.applications.update(&application).await?;
        tracing::info!(
            application_id = %id,
            from = %transition.from,
            to = %transition.to,
            actor = %actor.user_id,
            "Application status changed"
        );

        if transition.to == ApplicationStatus::Cancelled {
            self.release_slot(saved.job_id).await;
        }

        match transition.release_resume {
            Some(url) => Ok(self.release_resume(saved, &url, Some(actor.user_id)).await),
            None => Ok(saved),
        }
    }

    /// Deletes the resume after a terminal outcome. A failed delete leaves the
    /// record untouched so a later sweep can retry.
    async fn release_resume(&self, application: Application, url: &str, by: Option<Uuid>) -> Application {
        if let Err(e) = self.files.delete(url).await {
            tracing::warn!(application_id = %application.id, error = %e, "Failed to delete resume file");
            return application;
        }
        match self
            .applications
            .mark_file_deleted(application.id, self.clock.now(), by)
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => application,
            Err(e) => {
                tracing::warn!(application_id = %application.id, error = %e, "Failed to record resume deletion");
                application
            }
        }
    }

    async fn release_slot(&self, job_id: Uuid) {
        if let Err(e) = self.directory.release_application_slot(job_id).await {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to decrement application count");
        }
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Application> {
        self.update_status(
            actor,
            id,
            UpdateStatusPayload {
                status: ApplicationStatus::Cancelled.as_str().to_string(),
                notes: None,
                feedback: None,
                interview_scheduled_at: None,
            },
        )
        .await
    }

    pub async fn remove(&self, actor: &Actor, id: Uuid) -> Result<Removal> {
        let application = self.load(id).await?;

        if actor.is_talent(application.talent_id) {
            return self.cancel(actor, id).await.map(Removal::Cancelled);
        }
        if !actor.is_admin() {
            return Err(Error::Forbidden(
                "Only the applicant or an admin can remove an application".to_string(),
            ));
        }

        if let Some(url) = application.live_resume() {
            if let Err(e) = self.files.delete(url).await {
                tracing::warn!(application_id = %id, error = %e, "Failed to delete resume file");
            }
        }
        if !self.applications.delete(id).await? {
            return Err(Error::NotFound("Application not found".to_string()));
        }
        if application.status.holds_job_slot() {
            self.release_slot(application.job_id).await;
        }

        tracing::info!(application_id = %id, admin = %actor.user_id, "Application deleted");
        Ok(Removal::Deleted)
    }

    pub async fn get_view(&self, actor: &Actor, id: Uuid) -> Result<ApplicationView> {
        let view = self
            .applications
            .find_view(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        if !view.application.is_visible_to(actor) {
            return Err(Error::Forbidden(
                "You do not have access to this application".to_string(),
            ));
        }
        Ok(view)
    }

    async fn list(&self, scope: ApplicationScope, status: Option<&str>) -> Result<ApplicationListResponse> {
        let status = status
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::parse::<ApplicationStatus>)
            .transpose()?;
        let applications = self.applications.list_views(scope, status).await?;
        let counts = self.applications.count_by_status(scope).await?;
        Ok(ApplicationListResponse {
            applications,
            statistics: StatusStatistics::from(&counts),
        })
    }

    pub async fn list_for_talent(&self, actor: &Actor, status: Option<&str>) -> Result<ApplicationListResponse> {
        let talent_id = Self::talent_profile(actor)?;
        self.list(ApplicationScope::Talent(talent_id), status).await
    }

    pub async fn list_for_company(&self, actor: &Actor, status: Option<&str>) -> Result<ApplicationListResponse> {
        actor.require_role(Role::Company)?;
        let company_id = actor.require_profile()?;
        self.list(ApplicationScope::Company(company_id), status).await
    }

    pub async fn open_resume(&self, actor: &Actor, id: Uuid) -> Result<ResumeDownload> {
        let application = self.load(id).await?;
        if !application.is_visible_to(actor) {
            return Err(Error::Forbidden(
                "You do not have access to this application".to_string(),
            ));
        }
        let url = application
            .live_resume()
            .ok_or_else(|| Error::NotFound("No CV attached to this application".to_string()))?;
        let file = self
            .files
            .open(url)
            .await?
            .ok_or_else(|| Error::NotFound("CV file not found".to_string()))?;

        let file_name = application
            .resume_file_name
            .clone()
            .or_else(|| file_name_from_url(url).map(str::to_string))
            .unwrap_or_else(|| "resume".to_string());
        Ok(ResumeDownload { file, file_name })
    }
}
