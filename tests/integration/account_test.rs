//! Integration tests for account invitations and lifecycle events.

mod helpers;

use axum::http::StatusCode;
use uuid::Uuid;

use campushub_database::MemberStore;
use campushub_entity::user::UserRole;

/// Provision one student and return the new account id.
async fn provision_student(app: &helpers::TestApp) -> String {
    let csv = "Full Name,Email,Roll Number\nAsha Rao,asha@college.edu,21CS001\n";
    let response = app
        .upload("students", "students.csv", csv, &app.admin_token())
        .await;
    assert_eq!(response.data()["succeeded_rows"], 1);

    app.store
        .find_member_by_email("asha@college.edu")
        .await
        .unwrap()
        .unwrap()
        .id
        .to_string()
}

#[tokio::test]
async fn test_lifecycle_pending_to_active() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    let service = app.service_token();

    let response = app
        .request("POST", &format!("/api/accounts/{id}/first-login"), Some(&service))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["account_status"], "INCOMPLETE");
    assert!(response.data()["first_login_at"].is_string());

    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{id}/profile-completion"),
            Some(&service),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["account_status"], "ACTIVE");
    assert_eq!(response.data()["profile_completed"], true);
}

#[tokio::test]
async fn test_repeated_first_login_keeps_timestamp() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    let service = app.service_token();
    let path = format!("/api/accounts/{id}/first-login");

    let first = app.request("POST", &path, Some(&service)).await;
    let second = app.request("POST", &path, Some(&service)).await;

    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(
        first.data()["first_login_at"],
        second.data()["first_login_at"]
    );
}

#[tokio::test]
async fn test_lifecycle_events_require_service_role() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{id}/first-login"),
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_suspend_and_reinstate() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    let admin = app.admin_token();

    let response = app
        .request("POST", &format!("/api/accounts/{id}/suspend"), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["account_status"], "SUSPENDED");

    // Facts are still recorded while suspended.
    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{id}/first-login"),
            Some(&app.service_token()),
        )
        .await;
    assert_eq!(response.data()["account_status"], "SUSPENDED");

    let response = app
        .request("POST", &format!("/api/accounts/{id}/reinstate"), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["account_status"], "INCOMPLETE");
}

#[tokio::test]
async fn test_reinstate_active_account_conflicts() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{id}/reinstate"),
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_resend_invitation() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    app.deliver_invitations().await;

    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{id}/invitation"),
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.data()["invitation_sent_at"].is_string());
    let sent = app.outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].body, sent[1].body, "each invitation carries a new token");
}

#[tokio::test]
async fn test_resend_invitation_to_suspended_account_conflicts() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    let admin = app.admin_token();
    app.request("POST", &format!("/api/accounts/{id}/suspend"), Some(&admin))
        .await;

    let response = app
        .request("POST", &format!("/api/accounts/{id}/invitation"), Some(&admin))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(app.outbox.sent().is_empty());
}

#[tokio::test]
async fn test_account_hidden_from_other_tenants() {
    let app = helpers::TestApp::new().await;
    let id = provision_student(&app).await;
    let outsider = app.token_for(Uuid::new_v4(), UserRole::Admin);

    let response = app
        .request("POST", &format!("/api/accounts/{id}/suspend"), Some(&outsider))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_account() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            &format!("/api/accounts/{}/invitation", Uuid::new_v4()),
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
