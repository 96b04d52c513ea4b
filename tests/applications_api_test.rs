mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;
use serde_json::json;

const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF";

async fn upload_pdf(app: &TestApp) -> String {
    let (status, body) = app.upload(&app.talent.token, "ada-cv.pdf", PDF).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["url"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn apply_creates_pending_application_with_single_history_entry() {
    let app = TestApp::new().await;

    let (status, body) = app.apply(&app.talent.token, None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["hasResume"], false);

    let id = body["data"]["id"].as_str().unwrap();
    let (status, view) = app
        .request(Method::GET, &format!("/api/applications/{}", id), Some(&app.company.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["data"]["statusHistory"].as_array().unwrap().len(), 1);
    assert_eq!(view["data"]["jobTitle"], "Backend Engineer");
    assert_eq!(view["data"]["companyName"], "Analytical Engines");

    assert_eq!(app.job_application_count().await, 1);
}

#[tokio::test]
async fn duplicate_active_application_conflicts() {
    let app = TestApp::new().await;
    let (status, _) = app.apply(&app.talent.token, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.apply(&app.talent.token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("pending"));
}

#[tokio::test]
async fn concurrent_applies_for_same_pair_admit_exactly_one() {
    let app = TestApp::new().await;

    let (first, second) = tokio::join!(
        app.apply(&app.talent.token, None),
        app.apply(&app.talent.token, None)
    );
    let mut statuses = vec![first.0.as_u16(), second.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);
    assert_eq!(app.store.application_count().await, 1);
}

#[tokio::test]
async fn reapplying_after_rejection_replaces_the_old_record() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let old_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.set_status(&app.company.token, &old_id, "rejected").await;
    assert_eq!(status, StatusCode::OK);

    let (status, eligibility) = app
        .request(
            Method::GET,
            &format!("/api/jobs/{}/eligibility", app.job_id),
            Some(&app.talent.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligibility["data"]["allowed"], true);
    assert_eq!(eligibility["data"]["supersede"], true);

    let (status, body) = app.apply(&app.talent.token, None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let new_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_ne!(new_id, old_id);
    assert_eq!(body["data"]["replacedApplicationId"], old_id.as_str());
    assert_eq!(app.job_application_count().await, 1);

    let (status, _) = app
        .request(Method::GET, &format!("/api/applications/{}", old_id), Some(&app.admin.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = app
        .request(Method::GET, &format!("/api/applications/{}", new_id), Some(&app.admin.token), None)
        .await;
    assert_eq!(view["data"]["statusHistory"].as_array().unwrap().len(), 1);
    assert_eq!(app.store.application_count().await, 1);
}

#[tokio::test]
async fn hiring_deletes_the_resume_file() {
    let app = TestApp::new().await;
    let url = upload_pdf(&app).await;
    let path = app.resume_path(&url);
    assert!(path.exists());

    let (status, body) = app.apply(&app.talent.token, Some(&url)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["hasResume"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri(format!("/api/applications/{}/cv", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.company.token))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.raw(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PDF);

    let (status, body) = app.set_status(&app.company.token, &id, "hired").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "hired");
    assert_eq!(body["data"]["fileDeleted"], true);
    assert_eq!(body["data"]["fileDeletedBy"], app.company.user_id.to_string());
    assert_eq!(body["data"]["statusHistory"].as_array().unwrap().len(), 2);
    assert!(!path.exists());

    let (status, _) = app
        .request(Method::GET, &format!("/api/applications/{}/cv", id), Some(&app.company.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn interview_and_review_keep_the_resume() {
    let app = TestApp::new().await;
    let url = upload_pdf(&app).await;
    let (_, body) = app.apply(&app.talent.token, Some(&url)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.set_status(&app.company.token, &id, "reviewed").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["reviewedAt"].is_string());

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/applications/{}/status", id),
            Some(&app.company.token),
            Some(json!({
                "status": "interview",
                "interviewScheduledAt": "2026-03-20T09:00:00Z",
                "notes": "Panel interview"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["fileDeleted"], false);
    assert_eq!(body["data"]["notes"], "Panel interview");
    assert!(app.resume_path(&url).exists());
}

#[tokio::test]
async fn cancel_via_delete_then_again_is_rejected() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.talent.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(app.job_application_count().await, 0);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.talent.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn cancel_on_hired_fails_and_leaves_it_hired() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    app.set_status(&app.company.token, &id, "hired").await;

    let (status, _) = app.set_status(&app.talent.token, &id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, view) = app
        .request(Method::GET, &format!("/api/applications/{}", id), Some(&app.talent.token), None)
        .await;
    assert_eq!(view["data"]["status"], "hired");
    assert_eq!(view["data"]["statusHistory"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn status_guards() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.set_status(&app.talent.token, &id, "reviewed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.set_status(&app.other_talent.token, &id, "cancelled").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.set_status(&app.company.token, &id, "archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("archived"));

    let (status, _) = app.set_status(&app.company.token, &id, "pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.company.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_delete_removes_record_file_and_count() {
    let app = TestApp::new().await;
    let url = upload_pdf(&app).await;
    let (_, body) = app.apply(&app.talent.token, Some(&url)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.resume_path(&url).exists());
    assert_eq!(app.store.application_count().await, 0);
    assert_eq!(app.job_application_count().await, 0);
}

#[tokio::test]
async fn listing_includes_statistics() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    app.set_status(&app.company.token, &id, "reviewed").await;
    app.apply(&app.other_talent.token, None).await;

    let (status, mine) = app
        .request(Method::GET, "/api/applications/me", Some(&app.talent.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"]["applications"].as_array().unwrap().len(), 1);
    assert_eq!(mine["data"]["statistics"]["reviewed"], 1);

    let (status, theirs) = app
        .request(
            Method::GET,
            "/api/applications/company?status=pending",
            Some(&app.company.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(theirs["data"]["applications"].as_array().unwrap().len(), 1);
    assert_eq!(theirs["data"]["statistics"]["total"], 2);
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::POST, "/api/applications", None, Some(app.apply_body(None)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request(Method::GET, "/api/applications/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forged_pdf_upload_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.upload(&app.talent.token, "cv.pdf", b"plain text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app.upload(&app.company.token, "cv.pdf", PDF).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_resume_url_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, _) = app
        .apply(&app.talent.token, Some("/uploads/applications/nope.pdf"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.application_count().await, 0);
}

#[tokio::test]
async fn cancelling_through_status_update_frees_the_job_slot() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(app.job_application_count().await, 1);

    let (status, body) = app.set_status(&app.talent.token, &id, "cancelled").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(app.job_application_count().await, 0);

    let (status, body) = app.apply(&app.talent.token, None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.job_application_count().await, 1);
}

#[tokio::test]
async fn company_cancel_then_admin_delete_counts_once() {
    let app = TestApp::new().await;
    let (_, body) = app.apply(&app.talent.token, None).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.set_status(&app.company.token, &id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.job_application_count().await, 0);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.job_application_count().await, 0);
}

#[tokio::test]
async fn reapplying_with_a_new_resume_deletes_the_old_one() {
    let app = TestApp::new().await;
    let first = upload_pdf(&app).await;
    let (_, body) = app.apply(&app.talent.token, Some(&first)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.talent.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.resume_path(&first).exists());

    let second = upload_pdf(&app).await;
    assert_ne!(first, second);
    let (status, body) = app.apply(&app.talent.token, Some(&second)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["replacedApplicationId"], id.as_str());

    assert!(!app.resume_path(&first).exists());
    assert!(app.resume_path(&second).exists());
}

#[tokio::test]
async fn reapplying_with_the_same_resume_keeps_the_file() {
    let app = TestApp::new().await;
    let url = upload_pdf(&app).await;
    let (_, body) = app.apply(&app.talent.token, Some(&url)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/applications/{}", id), Some(&app.talent.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.apply(&app.talent.token, Some(&url)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["hasResume"], true);
    assert!(app.resume_path(&url).exists());
}

#[tokio::test]
async fn rejecting_deletes_the_resume_file() {
    let app = TestApp::new().await;
    let url = upload_pdf(&app).await;
    let (_, body) = app.apply(&app.talent.token, Some(&url)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.set_status(&app.company.token, &id, "rejected").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["fileDeleted"], true);
    assert!(body["data"]["fileDeletedAt"].is_string());
    assert!(!app.resume_path(&url).exists());
}
