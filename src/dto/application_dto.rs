use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus, ApplicationView};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    pub job_id: Uuid,
    #[validate(
        length(min = 1, max = 100),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 30), custom(function = "crate::utils::validation::not_blank"))]
    pub phone: String,
    #[validate(length(max = 1000))]
    pub cover_letter: Option<String>,
    #[validate(length(max = 50))]
    pub experience_years: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20), custom(function = "crate::utils::validation::skill_list"))]
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
    #[validate(length(max = 255))]
    pub resume_file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(max = 1000))]
    pub feedback: Option<String>,
    pub interview_scheduled_at: Option<DateTime<Utc>>,
}

/// Compact projection returned right after an apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub talent_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub has_resume: bool,
    pub resume_url: Option<String>,
    pub resume_file_name: Option<String>,
    pub applied_at: DateTime<Utc>,
    /// Set when an earlier rejected or cancelled application was replaced.
    pub replaced_application_id: Option<Uuid>,
}

impl ApplicationSummary {
    pub fn new(application: &Application, replaced: Option<Uuid>) -> Self {
        Self {
            id: application.id,
            job_id: application.job_id,
            talent_id: application.talent_id,
            company_id: application.company_id,
            status: application.status,
            has_resume: application.has_resume(),
            resume_url: application.resume_url.clone(),
            resume_file_name: application.resume_file_name.clone(),
            applied_at: application.applied_at,
            replaced_application_id: replaced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedResume {
    pub url: String,
    pub file_name: String,
    pub original_name: String,
    pub size: i64,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusStatistics {
    pub total: i64,
    pub pending: i64,
    pub reviewed: i64,
    pub interview: i64,
    pub hired: i64,
    pub rejected: i64,
    pub cancelled: i64,
}

impl From<&HashMap<ApplicationStatus, i64>> for StatusStatistics {
    fn from(counts: &HashMap<ApplicationStatus, i64>) -> Self {
        let get = |status| counts.get(&status).copied().unwrap_or(0);
        Self {
            total: counts.values().sum(),
            pending: get(ApplicationStatus::Pending),
            reviewed: get(ApplicationStatus::Reviewed),
            interview: get(ApplicationStatus::Interview),
            hired: get(ApplicationStatus::Hired),
            rejected: get(ApplicationStatus::Rejected),
            cancelled: get(ApplicationStatus::Cancelled),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationView>,
    pub statistics: StatusStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
}
