use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::{ApplicationRepository, ApplyOutcome, ChatRepository, JobDirectory};
use crate::error::{Error, Result};
use crate::models::application::{
    ApplicantSnapshot, Application, ApplicationScope, ApplicationStatus, ApplicationView,
    StatusHistoryEntry,
};
use crate::models::chat::{Chat, ChatMessage, ChatSide};
use crate::models::job::{Job, Talent};
use crate::services::eligibility;

const APPLICATION_VIEW_SELECT: &str = r#"
    SELECT a.*,
           j.title AS job_title,
           c.company_name AS company_name,
           t.name AS talent_name
    FROM applications a
    LEFT JOIN jobs j ON j.id = a.job_id
    LEFT JOIN companies c ON c.id = a.company_id
    LEFT JOIN talents t ON t.id = a.talent_id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_messages(&self, chat_id: Uuid) -> Result<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM chat_messages
            WHERE chat_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    talent_id: Uuid,
    job_id: Uuid,
    company_id: Uuid,
    status: String,
    status_history: Json<Vec<StatusHistoryEntry>>,
    cover_letter: Option<String>,
    applicant: Json<ApplicantSnapshot>,
    resume_url: Option<String>,
    resume_file_name: Option<String>,
    resume_file_size: Option<i64>,
    resume_file_type: Option<String>,
    file_deleted: bool,
    file_deleted_at: Option<DateTime<Utc>>,
    file_deleted_by: Option<Uuid>,
    applied_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    interview_scheduled_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    feedback: Option<String>,
    version: i32,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Application {
            id: row.id,
            talent_id: row.talent_id,
            job_id: row.job_id,
            company_id: row.company_id,
            status: row.status.parse()?,
            status_history: row.status_history.0,
            cover_letter: row.cover_letter,
            applicant: row.applicant.0,
            resume_url: row.resume_url,
            resume_file_name: row.resume_file_name,
            resume_file_size: row.resume_file_size,
            resume_file_type: row.resume_file_type,
            file_deleted: row.file_deleted,
            file_deleted_at: row.file_deleted_at,
            file_deleted_by: row.file_deleted_by,
            applied_at: row.applied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            reviewed_at: row.reviewed_at,
            interview_scheduled_at: row.interview_scheduled_at,
            notes: row.notes,
            feedback: row.feedback,
            version: row.version,
        })
    }
}

#[derive(Debug, FromRow)]
struct ApplicationViewRow {
    #[sqlx(flatten)]
    application: ApplicationRow,
    job_title: Option<String>,
    company_name: Option<String>,
    talent_name: Option<String>,
}

impl TryFrom<ApplicationViewRow> for ApplicationView {
    type Error = Error;

    fn try_from(row: ApplicationViewRow) -> Result<Self> {
        Ok(ApplicationView {
            application: row.application.try_into()?,
            job_title: row.job_title,
            company_name: row.company_name,
            talent_name: row.talent_name,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChatRow {
    id: Uuid,
    application_id: Uuid,
    talent_id: Uuid,
    company_id: Uuid,
    last_message: String,
    last_message_at: DateTime<Utc>,
    talent_unread_count: i32,
    company_unread_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChatRow {
    fn into_chat(self, messages: Vec<ChatMessage>) -> Chat {
        Chat {
            id: self.id,
            application_id: self.application_id,
            talent_id: self.talent_id,
            company_id: self.company_id,
            messages,
            last_message: self.last_message,
            last_message_at: self.last_message_at,
            talent_unread_count: self.talent_unread_count,
            company_unread_count: self.company_unread_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn unread_column(side: ChatSide) -> &'static str {
    match side {
        ChatSide::Talent => "talent_unread_count",
        ChatSide::Company => "company_unread_count",
    }
}

fn status_names(statuses: &[ApplicationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Application::try_from).transpose()
    }

    async fn find_for_pair(&self, talent_id: Uuid, job_id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE talent_id = $1 AND job_id = $2",
        )
        .bind(talent_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Application::try_from).transpose()
    }

    async fn insert_superseding(&self, application: &Application) -> Result<ApplyOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent applies for the same pair until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{}:{}", application.talent_id, application.job_id))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE talent_id = $1 AND job_id = $2
            FOR UPDATE
            "#,
        )
        .bind(application.talent_id)
        .bind(application.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Application::try_from)
        .transpose()?;

        let decision = eligibility::resolve(existing.as_ref());
        if !decision.allowed {
            return Err(Error::Conflict(decision.reason));
        }

        let superseded = match existing {
            Some(previous) if decision.supersede => {
                sqlx::query("DELETE FROM applications WHERE id = $1")
                    .bind(previous.id)
                    .execute(&mut *tx)
                    .await?;
                Some(previous)
            }
            _ => None,
        };

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (
                id, talent_id, job_id, company_id, status, status_history,
                cover_letter, applicant, resume_url, resume_file_name,
                resume_file_size, resume_file_type, file_deleted,
                applied_at, created_at, updated_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, FALSE, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.talent_id)
        .bind(application.job_id)
        .bind(application.company_id)
        .bind(application.status.as_str())
        .bind(Json(&application.status_history))
        .bind(&application.cover_letter)
        .bind(Json(&application.applicant))
        .bind(&application.resume_url)
        .bind(&application.resume_file_name)
        .bind(application.resume_file_size)
        .bind(&application.resume_file_type)
        .bind(application.applied_at)
        .bind(application.created_at)
        .bind(application.updated_at)
        .bind(application.version)
        .fetch_one(&mut *tx)
        .await?;

        // a superseded rejection already holds the slot
        if !superseded.as_ref().is_some_and(|p| p.status.holds_job_slot()) {
            sqlx::query("UPDATE jobs SET application_count = application_count + 1 WHERE id = $1")
                .bind(application.job_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(ApplyOutcome {
            application: row.try_into()?,
            superseded,
        })
    }

    async fn update(&self, application: &Application) -> Result<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET status = $3,
                status_history = $4,
                reviewed_at = $5,
                interview_scheduled_at = $6,
                notes = $7,
                feedback = $8,
                file_deleted = $9,
                file_deleted_at = $10,
                file_deleted_by = $11,
                updated_at = $12,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.version)
        .bind(application.status.as_str())
        .bind(Json(&application.status_history))
        .bind(application.reviewed_at)
        .bind(application.interview_scheduled_at)
        .bind(&application.notes)
        .bind(&application.feedback)
        .bind(application.file_deleted)
        .bind(application.file_deleted_at)
        .bind(application.file_deleted_by)
        .bind(application.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None if self.find(application.id).await?.is_some() => Err(Error::Conflict(
                "Application was modified concurrently, reload and retry".to_string(),
            )),
            None => Err(Error::NotFound("Application not found".to_string())),
        }
    }

    async fn mark_file_deleted(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        by: Option<Uuid>,
    ) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET file_deleted = TRUE,
                file_deleted_at = $2,
                file_deleted_by = $3,
                updated_at = $2,
                version = version + 1
            WHERE id = $1 AND file_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(by)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Application::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_statuses(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE status = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Application::try_from).collect()
    }

    async fn count_by_status(
        &self,
        scope: ApplicationScope,
    ) -> Result<HashMap<ApplicationStatus, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM applications
            WHERE ($1::uuid IS NULL OR talent_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
            GROUP BY status
            "#,
        )
        .bind(scope.talent_id())
        .bind(scope.company_id())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::new();
        for (status, count) in rows {
            counts.insert(status.parse()?, count);
        }
        Ok(counts)
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<ApplicationView>> {
        let query = format!("{} WHERE a.id = $1", APPLICATION_VIEW_SELECT);
        let row = sqlx::query_as::<_, ApplicationViewRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApplicationView::try_from).transpose()
    }

    async fn list_views(
        &self,
        scope: ApplicationScope,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationView>> {
        let query = format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR a.talent_id = $1)
              AND ($2::uuid IS NULL OR a.company_id = $2)
              AND ($3::text IS NULL OR a.status = $3)
            ORDER BY a.created_at DESC
            "#,
            APPLICATION_VIEW_SELECT
        );
        let rows = sqlx::query_as::<_, ApplicationViewRow>(&query)
            .bind(scope.talent_id())
            .bind(scope.company_id())
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ApplicationView::try_from).collect()
    }
}

#[async_trait]
impl ChatRepository for PgStore {
    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Chat>> {
        let row = sqlx::query_as::<_, ChatRow>("SELECT * FROM chats WHERE application_id = $1")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let messages = self.load_messages(row.id).await?;
                Ok(Some(row.into_chat(messages)))
            }
            None => Ok(None),
        }
    }

    async fn create_if_absent(&self, chat: &Chat) -> Result<Chat> {
        sqlx::query(
            r#"
            INSERT INTO chats (
                id, application_id, talent_id, company_id, last_message,
                last_message_at, talent_unread_count, company_unread_count,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (application_id) DO NOTHING
            "#,
        )
        .bind(chat.id)
        .bind(chat.application_id)
        .bind(chat.talent_id)
        .bind(chat.company_id)
        .bind(&chat.last_message)
        .bind(chat.last_message_at)
        .bind(chat.talent_unread_count)
        .bind(chat.company_unread_count)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_application(chat.application_id)
            .await?
            .ok_or_else(|| Error::Internal("Chat vanished right after creation".to_string()))
    }

    async fn append_message(
        &self,
        application_id: Uuid,
        message: &ChatMessage,
        notify: ChatSide,
    ) -> Result<ChatMessage> {
        let column = unread_column(notify);
        let mut tx = self.pool.begin().await?;

        let chat_id: Option<(Uuid,)> = sqlx::query_as(&format!(
            r#"
            UPDATE chats
            SET {column} = {column} + 1,
                last_message = $2,
                last_message_at = $3,
                updated_at = $3
            WHERE application_id = $1
            RETURNING id
            "#
        ))
        .bind(application_id)
        .bind(&message.body)
        .bind(message.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let (chat_id,) =
            chat_id.ok_or_else(|| Error::NotFound("Chat not found".to_string()))?;

        let stored = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (id, chat_id, sender_id, sender_role, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(message.id)
        .bind(chat_id)
        .bind(message.sender_id)
        .bind(&message.sender_role)
        .bind(&message.body)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn reset_unread(&self, application_id: Uuid, side: ChatSide) -> Result<bool> {
        let column = unread_column(side);
        let result = sqlx::query(&format!(
            "UPDATE chats SET {column} = 0 WHERE application_id = $1"
        ))
        .bind(application_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobDirectory for PgStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, company_id, title, is_active, application_deadline, application_count
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn find_talent(&self, id: Uuid) -> Result<Option<Talent>> {
        let talent = sqlx::query_as::<_, Talent>(
            "SELECT id, user_id, name, resume_url FROM talents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(talent)
    }

    async fn release_application_slot(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET application_count = GREATEST(application_count - 1, 0) WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
