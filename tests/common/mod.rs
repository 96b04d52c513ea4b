#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value as JsonValue;
use talent_board_backend::{
    config::{CleanupConfig, Config},
    middleware::auth::Claims,
    models::{
        job::{Company, Job, Talent},
        user::Role,
    },
    repository::{memory::MemoryStore, JobDirectory, Storage},
    routes,
    services::file_store::LocalFileStore,
    utils::time::FixedClock,
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "test_secret_key";

pub struct TestUser {
    pub user_id: Uuid,
    pub profile_id: Option<Uuid>,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub clock: FixedClock,
    pub uploads: TempDir,
    pub talent: TestUser,
    pub other_talent: TestUser,
    pub company: TestUser,
    pub admin: TestUser,
    pub job_id: Uuid,
}

pub fn start_time() -> DateTime<Utc> {
    "2026-03-10T12:00:00Z".parse().unwrap()
}

pub fn token_for(user_id: Uuid, role: Role, profile_id: Option<Uuid>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        profile_id,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn user(role: Role, profile_id: Option<Uuid>) -> TestUser {
    let user_id = Uuid::new_v4();
    TestUser {
        user_id,
        profile_id,
        token: token_for(user_id, role, profile_id),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = Arc::new(Config {
            server_address: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: SECRET.to_string(),
            uploads_dir: uploads.path().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            cleanup: CleanupConfig::default(),
        });

        let store = MemoryStore::new();
        let clock = FixedClock::new(start_time());
        let state = AppState::new(
            config.clone(),
            Storage::memory(store.clone()),
            Arc::new(LocalFileStore::new(uploads.path())),
            Arc::new(clock.clone()),
        );

        let talent = user(Role::Talent, Some(Uuid::new_v4()));
        let other_talent = user(Role::Talent, Some(Uuid::new_v4()));
        let company = user(Role::Company, Some(Uuid::new_v4()));
        let admin = user(Role::Admin, None);
        let job_id = Uuid::new_v4();

        for t in [&talent, &other_talent] {
            store
                .insert_talent(Talent {
                    id: t.profile_id.unwrap(),
                    user_id: t.user_id,
                    name: "Ada Lovelace".into(),
                    resume_url: None,
                })
                .await;
        }
        let company_id = company.profile_id.unwrap();
        store
            .insert_company(Company {
                id: company_id,
                user_id: company.user_id,
                company_name: "Analytical Engines".into(),
            })
            .await;
        store
            .insert_job(Job {
                id: job_id,
                company_id,
                title: "Backend Engineer".into(),
                is_active: true,
                application_deadline: None,
                application_count: 0,
            })
            .await;

        Self {
            router: routes::router(state.clone()),
            state,
            store,
            clock,
            uploads,
            talent,
            other_talent,
            company,
            admin,
            job_id,
        }
    }

    pub async fn job_application_count(&self) -> i32 {
        self.store
            .find_job(self.job_id)
            .await
            .unwrap()
            .unwrap()
            .application_count
    }

    pub fn resume_dir(&self) -> PathBuf {
        self.uploads.path().join("applications")
    }

    pub fn resume_path(&self, url: &str) -> PathBuf {
        let name = url.rsplit('/').next().unwrap();
        self.resume_dir().join(name)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    pub async fn raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    /// Uploads `content` as a multipart `cv` field and returns the stored URL.
    pub async fn upload(&self, token: &str, file_name: &str, content: &[u8]) -> (StatusCode, JsonValue) {
        let boundary = "----talentboardboundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"cv\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/files/upload")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = self.raw(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
    }

    pub fn apply_body(&self, resume_url: Option<&str>) -> JsonValue {
        let mut body = serde_json::json!({
            "jobId": self.job_id,
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+62 811 1234",
            "coverLetter": "I like engines.",
            "skills": ["rust", "postgres"],
        });
        if let Some(url) = resume_url {
            body["resumeUrl"] = JsonValue::String(url.to_string());
        }
        body
    }

    pub async fn apply(&self, token: &str, resume_url: Option<&str>) -> (StatusCode, JsonValue) {
        self.request(
            Method::POST,
            "/api/applications",
            Some(token),
            Some(self.apply_body(resume_url)),
        )
        .await
    }

    pub async fn set_status(&self, token: &str, id: &str, status: &str) -> (StatusCode, JsonValue) {
        self.request(
            Method::PUT,
            &format!("/api/applications/{}/status", id),
            Some(token),
            Some(serde_json::json!({ "status": status })),
        )
        .await
    }
}
