use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::user::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Hired,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interview,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Cancelled
        )
    }

    /// Terminal outcomes that a fresh application is allowed to replace.
    pub fn is_supersedable(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Cancelled)
    }

    /// Outcomes whose resume file is removed as soon as they are reached.
    pub fn releases_resume(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// Counted in the job's `application_count`. Cancelling gives the slot back.
    pub fn holds_job_slot(&self) -> bool {
        !matches!(self, ApplicationStatus::Cancelled)
    }

    pub fn allowed_next(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewed, Interview, Rejected, Hired, Cancelled],
            Reviewed => &[Interview, Hired, Rejected, Cancelled],
            Interview => &[Hired, Rejected, Cancelled],
            Hired | Rejected | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<Uuid>,
    #[serde(default)]
    pub notes: String,
}

/// Contact details captured from the apply form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSnapshot {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub experience_years: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeAttachment {
    pub url: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub talent_id: Uuid,
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub cover_letter: Option<String>,
    pub applicant: ApplicantSnapshot,
    pub resume_url: Option<String>,
    pub resume_file_name: Option<String>,
    pub resume_file_size: Option<i64>,
    pub resume_file_type: Option<String>,
    pub file_deleted: bool,
    pub file_deleted_at: Option<DateTime<Utc>>,
    pub file_deleted_by: Option<Uuid>,
    pub applied_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub interview_scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub feedback: Option<String>,
    pub version: i32,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub talent_id: Uuid,
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub submitted_by: Uuid,
    pub cover_letter: Option<String>,
    pub applicant: ApplicantSnapshot,
    pub resume: Option<ResumeAttachment>,
}

impl Application {
    pub fn new(new: NewApplication, now: DateTime<Utc>) -> Self {
        let resume = new.resume.unwrap_or_default();
        let resume_url = Some(resume.url).filter(|url| !url.is_empty());

        Self {
            id: Uuid::new_v4(),
            talent_id: new.talent_id,
            job_id: new.job_id,
            company_id: new.company_id,
            status: ApplicationStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: ApplicationStatus::Pending,
                changed_at: now,
                changed_by: Some(new.submitted_by),
                notes: "Application submitted".to_string(),
            }],
            cover_letter: new.cover_letter,
            applicant: new.applicant,
            resume_file_name: resume_url.as_ref().and(resume.file_name),
            resume_file_size: resume_url.as_ref().and(resume.file_size),
            resume_file_type: resume_url.as_ref().and(resume.file_type),
            resume_url,
            file_deleted: false,
            file_deleted_at: None,
            file_deleted_by: None,
            applied_at: now,
            created_at: now,
            updated_at: now,
            reviewed_at: None,
            interview_scheduled_at: None,
            notes: None,
            feedback: None,
            version: 0,
        }
    }

    /// Resume that still exists in the file store, as far as this record knows.
    pub fn live_resume(&self) -> Option<&str> {
        if self.file_deleted {
            return None;
        }
        self.resume_url.as_deref()
    }

    /// Owning talent, owning company, or an admin.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.is_admin() || actor.is_talent(self.talent_id) || actor.is_company(self.company_id)
    }

    pub fn has_resume(&self) -> bool {
        self.live_resume().is_some()
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        whole_days_between(self.created_at, now)
    }

    pub fn review_age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.reviewed_at.map(|at| whole_days_between(at, now))
    }
}

/// Application hydrated with the names a client needs to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub talent_name: Option<String>,
}

/// Which slice of the application table a read-side query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    All,
    Talent(Uuid),
    Company(Uuid),
}

impl ApplicationScope {
    pub fn talent_id(&self) -> Option<Uuid> {
        match self {
            ApplicationScope::Talent(id) => Some(*id),
            _ => None,
        }
    }

    pub fn company_id(&self) -> Option<Uuid> {
        match self {
            ApplicationScope::Company(id) => Some(*id),
            _ => None,
        }
    }

    pub fn contains(&self, application: &Application) -> bool {
        match self {
            ApplicationScope::All => true,
            ApplicationScope::Talent(id) => application.talent_id == *id,
            ApplicationScope::Company(id) => application.company_id == *id,
        }
    }
}

fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}
