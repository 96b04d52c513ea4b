use serde::Serialize;

use crate::models::application::{Application, ApplicationStatus};

/// Whether a talent may submit an application for a job, given whatever
/// application already exists for that pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub allowed: bool,
    pub reason: String,
    /// The existing record must be hard-deleted before the new one is stored.
    pub supersede: bool,
    pub blocking_status: Option<ApplicationStatus>,
}

pub fn resolve(existing: Option<&Application>) -> Eligibility {
    match existing {
        None => Eligibility {
            allowed: true,
            reason: "No previous application for this job".to_string(),
            supersede: false,
            blocking_status: None,
        },
        Some(previous) if previous.status.is_supersedable() => Eligibility {
            allowed: true,
            reason: format!(
                "Previous application was {} and will be replaced",
                previous.status
            ),
            supersede: true,
            blocking_status: None,
        },
        Some(previous) => Eligibility {
            allowed: false,
            reason: format!(
                "You already have an application for this job with status {}",
                previous.status
            ),
            supersede: false,
            blocking_status: Some(previous.status),
        },
    }
}
