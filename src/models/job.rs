use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub application_deadline: Option<DateTime<Utc>>,
    pub application_count: i32,
}

impl Job {
    pub fn accepts_applications_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.application_deadline.map_or(true, |deadline| now <= deadline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Talent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
}
