//! Integration tests for bulk uploads.

mod helpers;

use axum::http::StatusCode;
use uuid::Uuid;

use campushub_database::MemberStore;
use campushub_entity::member::AccountStatus;
use campushub_entity::user::UserRole;

const STUDENTS: &str = "\
Full Name,Email,Roll Number,Degree,Branch,Year
Asha Rao,asha@college.edu,21CS001,B.Tech,Computer Science,2
Ravi Kumar,not-an-email,21CS002,B.Tech,Computer Science,2
Meera Nair,meera@college.edu,21CS003,B.Tech,Electronics,3
Asha Duplicate,asha@college.edu,21CS004,B.Tech,Computer Science,2
";

#[tokio::test]
async fn test_upload_students_mixed_rows() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();

    let response = app.upload("students", "students.csv", STUDENTS, &token).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = response.data();
    assert_eq!(data["status"], "COMPLETED");
    assert_eq!(data["file_name"], "students.csv");
    assert_eq!(data["target_kind"], "STUDENT");
    assert_eq!(data["total_rows"], 4);
    assert_eq!(data["succeeded_rows"], 2);
    assert_eq!(data["failed_rows"], 2);

    let errors = data["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["row_number"], 2);
    assert_eq!(errors[0]["outcome"], "FAILED");
    assert_eq!(errors[1]["row_number"], 4);
    assert!(
        errors[1]["message"]
            .as_str()
            .unwrap()
            .contains("already used in row 1")
    );

    let asha = app
        .store
        .find_member_by_email("asha@college.edu")
        .await
        .unwrap()
        .expect("Asha was provisioned");
    assert_eq!(asha.tenant_id, app.tenant_id);
    assert_eq!(asha.full_name, "Asha Rao");
    assert_eq!(asha.account_status, AccountStatus::PendingSetup);
    assert!(asha.must_change_password);
    assert_eq!(app.store.member_count().await, 2);
}

#[tokio::test]
async fn test_upload_queues_invitations_for_created_accounts() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();

    app.upload("students", "students.csv", STUDENTS, &token).await;
    let delivered = app.deliver_invitations().await;

    assert_eq!(delivered, 2);
    let sent = app.outbox.sent();
    let recipients: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
    assert_eq!(recipients, vec!["asha@college.edu", "meera@college.edu"]);
    assert!(sent[0].body.contains("https://campus.test/setup?token="));

    let asha = app
        .store
        .find_member_by_email("asha@college.edu")
        .await
        .unwrap()
        .unwrap();
    assert!(asha.invitation_sent_at.is_some());
    assert!(asha.setup_token_hash.is_some());
}

#[tokio::test]
async fn test_upload_same_file_twice_rejects_every_row() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    let csv = "Full Name,Email,Department\nVikram Iyer,vikram@college.edu,CSE\n";

    let first = app.upload("trainers", "trainers.csv", csv, &token).await;
    let second = app.upload("trainers", "trainers.csv", csv, &token).await;

    assert_eq!(first.data()["succeeded_rows"], 1);
    assert_eq!(second.data()["status"], "COMPLETED");
    assert_eq!(second.data()["succeeded_rows"], 0);
    assert_eq!(
        second.data()["errors"][0]["message"],
        "Email 'vikram@college.edu' is already registered"
    );
    assert_eq!(app.store.member_count().await, 1);
}

#[tokio::test]
async fn test_upload_missing_required_column_fails_job() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    let csv = "Full Name,Email\nAsha Rao,asha@college.edu\n";

    let response = app.upload("students", "students.csv", csv, &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "FAILED");
    assert_eq!(response.data()["total_rows"], 0);
    assert!(
        response.data()["error_report"]
            .as_str()
            .unwrap()
            .contains("Roll Number")
    );
    assert_eq!(app.store.member_count().await, 0);
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = helpers::TestApp::new().await;

    let response = app.request("POST", "/api/uploads/students", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_forbidden_for_students() {
    let app = helpers::TestApp::new().await;
    let token = app.token_for(app.tenant_id, UserRole::Student);

    let response = app.upload("students", "students.csv", STUDENTS, &token).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.member_count().await, 0);
}

#[tokio::test]
async fn test_upload_unknown_kind() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();

    let response = app.upload("alumni", "alumni.csv", STUDENTS, &token).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_download_template() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();

    let response = app
        .request("GET", "/api/uploads/templates/students", Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type.starts_with("text/csv"));
    assert_eq!(
        response.text.lines().next(),
        Some("Full Name,Email,Roll Number,Degree,Branch,Year")
    );
}

#[tokio::test]
async fn test_job_detail_lists_every_row() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    let summary = app.upload("students", "students.csv", STUDENTS, &token).await;
    let job_id = summary.data()["job_id"].as_str().unwrap().to_string();

    let response = app
        .request("GET", &format!("/api/uploads/{job_id}"), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["job"]["status"], "COMPLETED");
    let results = response.data()["results"].as_array().unwrap();
    let outcomes: Vec<&str> = results
        .iter()
        .map(|r| r["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(outcomes, vec!["SUCCESS", "FAILED", "SUCCESS", "FAILED"]);
    assert_eq!(results[1]["raw_data"]["Email"], "not-an-email");
}

#[tokio::test]
async fn test_job_hidden_from_other_tenants() {
    let app = helpers::TestApp::new().await;
    let summary = app
        .upload("students", "students.csv", STUDENTS, &app.admin_token())
        .await;
    let job_id = summary.data()["job_id"].as_str().unwrap().to_string();

    let outsider = app.token_for(Uuid::new_v4(), UserRole::Admin);
    let response = app
        .request("GET", &format!("/api/uploads/{job_id}"), Some(&outsider))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let listed = app.request("GET", "/api/uploads", Some(&outsider)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data()["total"], 0);

    let operator = app.token_for(Uuid::new_v4(), UserRole::SuperAdmin);
    let response = app
        .request("GET", &format!("/api/uploads/{job_id}"), Some(&operator))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_jobs_paginates() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    for i in 0..3 {
        let csv = format!("Full Name,Email\nTrainer {i},t{i}@college.edu\n");
        app.upload("trainers", "trainers.csv", &csv, &token).await;
    }

    let response = app
        .request("GET", "/api/uploads?page=1&per_page=2", Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total"], 3);
    assert_eq!(response.data()["items"].as_array().unwrap().len(), 2);
    assert_eq!(response.data()["total_pages"], 2);
}

#[tokio::test]
async fn test_reprocess_failed_rows() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    let summary = app.upload("students", "students.csv", STUDENTS, &token).await;
    let job_id = summary.data()["job_id"].as_str().unwrap().to_string();

    let response = app
        .request("POST", &format!("/api/uploads/{job_id}/reprocess"), Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = response.data();
    assert_ne!(data["job_id"].as_str().unwrap(), job_id);
    assert_eq!(data["file_name"], "students-reprocess.csv");
    assert_eq!(data["total_rows"], 2);
    assert_eq!(data["succeeded_rows"], 0);
}

#[tokio::test]
async fn test_delete_job() {
    let app = helpers::TestApp::new().await;
    let token = app.admin_token();
    let summary = app.upload("students", "students.csv", STUDENTS, &token).await;
    let path = format!("/api/uploads/{}", summary.data()["job_id"].as_str().unwrap());

    let deleted = app.request("DELETE", &path, Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let fetched = app.request("GET", &path, Some(&token)).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.member_count().await, 2);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "memory");
}
