use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::application_dto::StatusStatistics;
use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub candidates: usize,
    pub deleted_applications: usize,
    pub deleted_files: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCandidate {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub job_title: Option<String>,
    pub talent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub review_age_days: Option<i64>,
    pub has_resume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupPreview {
    pub count: usize,
    pub applications: Vec<CleanupCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatus {
    pub description: String,
    pub statuses: Vec<ApplicationStatus>,
    pub after_hours: i64,
    /// Applications currently in one of `statuses`.
    pub matching: usize,
    /// Of those, the ones already past the threshold.
    pub due: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    pub enabled: bool,
    pub daily: String,
    pub frequent: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatus {
    pub statistics: StatusStatistics,
    pub reviewed_rule: RuleStatus,
    pub open_rule: RuleStatus,
    pub total_to_clean: usize,
    pub schedule: ScheduleInfo,
    pub checked_at: DateTime<Utc>,
}
