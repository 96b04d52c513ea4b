use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, StatusHistoryEntry};
use crate::models::user::Actor;

#[derive(Debug, Clone, Default)]
pub struct TransitionRequest {
    pub status: String,
    pub notes: Option<String>,
    pub feedback: Option<String>,
    pub interview_scheduled_at: Option<DateTime<Utc>>,
}

impl TransitionRequest {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    /// Resume that must be removed once the new status is persisted.
    pub release_resume: Option<String>,
}

fn invalid(from: ApplicationStatus, to: ApplicationStatus) -> Error {
    Error::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Checks that `actor` may move `application` to `target`.
pub fn authorize(application: &Application, actor: &Actor, target: ApplicationStatus) -> Result<()> {
    if actor.is_talent(application.talent_id) {
        if target != ApplicationStatus::Cancelled {
            return Err(Error::Forbidden(
                "Talents can only cancel their own applications".to_string(),
            ));
        }
        if application.status.is_terminal() {
            return Err(invalid(application.status, target));
        }
        return Ok(());
    }

    if actor.is_admin() || actor.is_company(application.company_id) {
        return Ok(());
    }

    Err(Error::Forbidden(
        "You are not allowed to update this application".to_string(),
    ))
}

/// Validates and applies a status change in memory. The caller persists the
/// result and then performs the returned resume release.
pub fn transition(
    application: &mut Application,
    request: TransitionRequest,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Transition> {
    let target: ApplicationStatus = request.status.trim().parse()?;
    authorize(application, actor, target)?;

    let from = application.status;
    if !from.can_transition_to(target) {
        return Err(invalid(from, target));
    }

    if target == ApplicationStatus::Interview {
        if let Some(at) = request.interview_scheduled_at {
            if at <= now {
                return Err(Error::BadRequest(
                    "Interview must be scheduled in the future".to_string(),
                ));
            }
        }
    }

    let note = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Status changed from {} to {}", from, target));

    application.status = target;
    application.status_history.push(StatusHistoryEntry {
        status: target,
        changed_at: now,
        changed_by: Some(actor.user_id),
        notes: note,
    });
    application.updated_at = now;

    if from == ApplicationStatus::Pending && application.reviewed_at.is_none() {
        application.reviewed_at = Some(now);
    }
    if target == ApplicationStatus::Interview {
        application.interview_scheduled_at = Some(request.interview_scheduled_at.unwrap_or(now));
    }
    if request.notes.is_some() {
        application.notes = request.notes;
    }
    if request.feedback.is_some() {
        application.feedback = request.feedback;
    }

    let release_resume = if target.releases_resume() {
        application.live_resume().map(str::to_string)
    } else {
        None
    };

    Ok(Transition {
        from,
        to: target,
        release_resume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{ApplicantSnapshot, NewApplication, ResumeAttachment};
    use crate::models::user::Role;
    use chrono::Duration;
    use uuid::Uuid;

    fn application() -> Application {
        Application::new(
            NewApplication {
                talent_id: Uuid::new_v4(),
                job_id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                submitted_by: Uuid::new_v4(),
                cover_letter: None,
                applicant: ApplicantSnapshot::default(),
                resume: Some(ResumeAttachment {
                    url: "/uploads/applications/cv.pdf".into(),
                    ..Default::default()
                }),
            },
            Utc::now() - Duration::hours(1),
        )
    }

    fn actor(role: Role, profile_id: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
            profile_id,
        }
    }

    #[test]
    fn company_review_records_history_and_reviewed_at() {
        let mut app = application();
        let company = actor(Role::Company, Some(app.company_id));
        let now = Utc::now();

        let t = transition(&mut app, TransitionRequest::to(ApplicationStatus::Reviewed), &company, now)
            .unwrap();

        assert_eq!(t.from, ApplicationStatus::Pending);
        assert!(t.release_resume.is_none());
        assert_eq!(app.status_history.len(), 2);
        assert_eq!(app.status_history[1].notes, "Status changed from pending to reviewed");
        assert_eq!(app.status_history[1].changed_by, Some(company.user_id));
        assert_eq!(app.reviewed_at, Some(now));
        assert_eq!(app.updated_at, now);
    }

    #[test]
    fn reviewed_at_is_only_set_once() {
        let mut app = application();
        let admin = actor(Role::Admin, None);
        let first = Utc::now();
        transition(&mut app, TransitionRequest::to(ApplicationStatus::Reviewed), &admin, first).unwrap();
        transition(
            &mut app,
            TransitionRequest::to(ApplicationStatus::Interview),
            &admin,
            first + Duration::hours(2),
        )
        .unwrap();
        assert_eq!(app.reviewed_at, Some(first));
    }

    #[test]
    fn hired_releases_live_resume() {
        let mut app = application();
        let admin = actor(Role::Admin, None);
        let t = transition(&mut app, TransitionRequest::to(ApplicationStatus::Hired), &admin, Utc::now())
            .unwrap();
        assert_eq!(t.release_resume.as_deref(), Some("/uploads/applications/cv.pdf"));
    }

    #[test]
    fn talent_can_only_cancel() {
        let mut app = application();
        let talent = actor(Role::Talent, Some(app.talent_id));

        let err = transition(&mut app, TransitionRequest::to(ApplicationStatus::Hired), &talent, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        transition(&mut app, TransitionRequest::to(ApplicationStatus::Cancelled), &talent, Utc::now())
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Cancelled);
    }

    #[test]
    fn cancel_on_terminal_is_invalid_and_leaves_record_untouched() {
        let mut app = application();
        app.status = ApplicationStatus::Hired;
        let before = app.clone();
        let talent = actor(Role::Talent, Some(app.talent_id));

        let err = transition(&mut app, TransitionRequest::to(ApplicationStatus::Cancelled), &talent, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(app, before);
    }

    #[test]
    fn strangers_and_unknown_statuses_are_rejected() {
        let mut app = application();
        let stranger = actor(Role::Company, Some(Uuid::new_v4()));
        let err = transition(&mut app, TransitionRequest::to(ApplicationStatus::Reviewed), &stranger, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let admin = actor(Role::Admin, None);
        let request = TransitionRequest {
            status: "archived".into(),
            ..Default::default()
        };
        let err = transition(&mut app, request, &admin, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidStatus(_)));
    }

    #[test]
    fn self_transition_is_rejected() {
        let mut app = application();
        let admin = actor(Role::Admin, None);
        let err = transition(&mut app, TransitionRequest::to(ApplicationStatus::Pending), &admin, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(app.status_history.len(), 1);
    }

    #[test]
    fn interview_time_must_be_in_future() {
        let mut app = application();
        let admin = actor(Role::Admin, None);
        let now = Utc::now();

        let past = TransitionRequest {
            status: "interview".into(),
            interview_scheduled_at: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        assert!(matches!(
            transition(&mut app, past, &admin, now),
            Err(Error::BadRequest(_))
        ));

        let future_at = now + Duration::days(2);
        let future = TransitionRequest {
            status: "interview".into(),
            interview_scheduled_at: Some(future_at),
            notes: Some("Bring portfolio".into()),
            ..Default::default()
        };
        transition(&mut app, future, &admin, now).unwrap();
        assert_eq!(app.interview_scheduled_at, Some(future_at));
        assert_eq!(app.notes.as_deref(), Some("Bring portfolio"));
        assert_eq!(app.status_history[1].notes, "Bring portfolio");
    }
}
