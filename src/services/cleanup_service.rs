use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::config::CleanupConfig;
use crate::dto::application_dto::StatusStatistics;
use crate::dto::cleanup_dto::{
    CleanupCandidate, CleanupPreview, CleanupStatus, CleanupSummary, RuleStatus, ScheduleInfo,
};
use crate::error::Result;
use crate::models::application::{Application, ApplicationScope, ApplicationStatus};
use crate::repository::ApplicationRepository;
use crate::services::file_store::FileStore;
use crate::utils::time::Clock;

/// Which timestamp a rule measures age from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBasis {
    ReviewedAt,
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionRule {
    pub statuses: Vec<ApplicationStatus>,
    pub max_age: Duration,
    pub basis: AgeBasis,
}

impl RetentionRule {
    /// An application whose basis timestamp is missing never matches.
    pub fn matches(&self, application: &Application, now: DateTime<Utc>) -> bool {
        if !self.statuses.contains(&application.status) {
            return false;
        }
        let since = match self.basis {
            AgeBasis::ReviewedAt => application.reviewed_at,
            AgeBasis::CreatedAt => Some(application.created_at),
        };
        since.map_or(false, |at| at <= now - self.max_age)
    }

    fn describe(&self) -> String {
        let statuses = self
            .statuses
            .iter()
            .map(ApplicationStatus::as_str)
            .collect::<Vec<_>>()
            .join("/");
        let basis = match self.basis {
            AgeBasis::ReviewedAt => "after review",
            AgeBasis::CreatedAt => "after submission",
        };
        format!(
            "{} applications are deleted {} hours {}",
            statuses,
            self.max_age.num_hours(),
            basis
        )
    }

    fn status(&self, applications: &[Application], now: DateTime<Utc>) -> RuleStatus {
        let matching: Vec<&Application> = applications
            .iter()
            .filter(|a| self.statuses.contains(&a.status))
            .collect();
        RuleStatus {
            description: self.describe(),
            statuses: self.statuses.clone(),
            after_hours: self.max_age.num_hours(),
            matching: matching.len(),
            due: matching.iter().filter(|a| self.matches(a, now)).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub reviewed: RetentionRule,
    pub open: RetentionRule,
}

impl RetentionPolicy {
    pub fn from_config(config: &CleanupConfig) -> Self {
        Self {
            reviewed: RetentionRule {
                statuses: config.reviewed_statuses.clone(),
                max_age: Duration::hours(config.reviewed_after_hours),
                basis: AgeBasis::ReviewedAt,
            },
            open: RetentionRule {
                statuses: config.open_statuses.clone(),
                max_age: Duration::hours(config.open_after_hours),
                basis: AgeBasis::CreatedAt,
            },
        }
    }

    pub fn is_candidate(&self, application: &Application, now: DateTime<Utc>) -> bool {
        self.reviewed.matches(application, now) || self.open.matches(application, now)
    }

    /// Every status either rule can match.
    pub fn statuses(&self) -> Vec<ApplicationStatus> {
        let mut all = self.reviewed.statuses.clone();
        for status in &self.open.statuses {
            if !all.contains(status) {
                all.push(*status);
            }
        }
        all
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&CleanupConfig::default())
    }
}

pub fn select_candidates<'a>(
    applications: &'a [Application],
    now: DateTime<Utc>,
    policy: &RetentionPolicy,
) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|a| policy.is_candidate(a, now))
        .collect()
}

/// Periodic janitor for stale applications and their resume files.
pub struct CleanupEngine {
    applications: Arc<dyn ApplicationRepository>,
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
    policy: RetentionPolicy,
    schedule: ScheduleInfo,
}

impl CleanupEngine {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
        config: &CleanupConfig,
    ) -> Self {
        Self {
            applications,
            files,
            clock,
            policy: RetentionPolicy::from_config(config),
            schedule: ScheduleInfo {
                enabled: config.enabled,
                daily: config.daily_cron.clone(),
                frequent: config.frequent_cron.clone(),
                timezone: format!("UTC{:+03}:00", config.utc_offset_hours),
            },
        }
    }

    async fn candidates(&self, now: DateTime<Utc>) -> Result<Vec<Application>> {
        let pool = self
            .applications
            .list_by_statuses(&self.policy.statuses())
            .await?;
        Ok(select_candidates(&pool, now, &self.policy)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Deletes every current candidate. One failing candidate never stops the
    /// sweep; it is logged and left for the next run.
    pub async fn run(&self) -> Result<CleanupSummary> {
        let now = self.clock.now();
        let candidates = self.candidates(now).await?;
        tracing::info!(count = candidates.len(), "Starting application cleanup");

        let mut summary = CleanupSummary {
            candidates: candidates.len(),
            ..CleanupSummary::default()
        };

        for application in &candidates {
            if let Some(url) = application.live_resume() {
                match self.files.delete(url).await {
                    Ok(true) => summary.deleted_files += 1,
                    Ok(false) => {}
                    Err(e) => tracing::warn!(
                        application_id = %application.id,
                        error = %e,
                        "Failed to delete resume during cleanup"
                    ),
                }
            }

            match self.applications.delete(application.id).await {
                Ok(true) => {
                    summary.deleted_applications += 1;
                    tracing::info!(
                        application_id = %application.id,
                        status = %application.status,
                        age_days = application.age_days(now),
                        "Deleted stale application"
                    );
                }
                Ok(false) => {}
                Err(e) => tracing::error!(
                    application_id = %application.id,
                    error = %e,
                    "Failed to delete application during cleanup"
                ),
            }
        }

        summary.message = format!(
            "Cleanup completed. Deleted {} applications and {} CV files",
            summary.deleted_applications, summary.deleted_files
        );
        tracing::info!(
            deleted_applications = summary.deleted_applications,
            deleted_files = summary.deleted_files,
            "Application cleanup finished"
        );
        Ok(summary)
    }

    pub async fn preview(&self) -> Result<CleanupPreview> {
        let now = self.clock.now();
        let mut applications = Vec::new();

        for candidate in self.candidates(now).await? {
            let view = self.applications.find_view(candidate.id).await?;
            let (job_title, talent_name) = view
                .map(|v| (v.job_title, v.talent_name))
                .unwrap_or_default();
            applications.push(CleanupCandidate {
                id: candidate.id,
                status: candidate.status,
                job_title,
                talent_name,
                created_at: candidate.created_at,
                reviewed_at: candidate.reviewed_at,
                age_days: candidate.age_days(now),
                review_age_days: candidate.review_age_days(now),
                has_resume: candidate.has_resume(),
            });
        }

        Ok(CleanupPreview {
            count: applications.len(),
            applications,
        })
    }

    pub async fn status(&self) -> Result<CleanupStatus> {
        let now = self.clock.now();
        let counts = self.applications.count_by_status(ApplicationScope::All).await?;
        let pool = self
            .applications
            .list_by_statuses(&self.policy.statuses())
            .await?;

        Ok(CleanupStatus {
            statistics: StatusStatistics::from(&counts),
            reviewed_rule: self.policy.reviewed.status(&pool, now),
            open_rule: self.policy.open.status(&pool, now),
            total_to_clean: select_candidates(&pool, now, &self.policy).len(),
            schedule: self.schedule.clone(),
            checked_at: now,
        })
    }
}
