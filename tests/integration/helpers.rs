//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tower::ServiceExt;
use uuid::Uuid;

use campushub_auth::JwtEncoder;
use campushub_core::config::{AppConfig, DatabaseBackend};
use campushub_core::result::AppResult;
use campushub_core::traits::mailer::{Mailer, OutgoingMail};
use campushub_database::MemoryStore;
use campushub_entity::user::UserRole;
use campushub_service::{InvitationDispatcher, InvitationReceiver};

const BOUNDARY: &str = "campushub-test-boundary";

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for Outbox {
    fn transport(&self) -> &str {
        "outbox"
    }

    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        self.sent.lock().expect("outbox poisoned").push(mail);
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store shared by every service
    pub store: Arc<MemoryStore>,
    /// Captured invitation mail
    pub outbox: Arc<Outbox>,
    /// Tenant the default admin belongs to
    pub tenant_id: Uuid,
    /// Application config
    pub config: AppConfig,
    dispatcher: Arc<InvitationDispatcher>,
    invitations: AsyncMutex<InvitationReceiver>,
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a new test application over the in-memory store
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.database.backend = DatabaseBackend::Memory;
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.auth.argon2_memory_kib = 8;
        config.auth.argon2_iterations = 1;
        config.auth.argon2_parallelism = 1;
        config.ingest.retry_base_delay_ms = 1;
        config.invitation.setup_url_base = "https://campus.test/setup".to_string();

        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(Outbox::default());

        let wiring = campushub_api::wire(
            config.clone(),
            store.clone(),
            store.clone(),
            outbox.clone(),
        )
        .expect("Failed to wire application");

        Self {
            router: campushub_api::build_app(wiring.state),
            store,
            outbox,
            tenant_id: Uuid::new_v4(),
            encoder: JwtEncoder::new(&config.auth),
            config,
            dispatcher: wiring.dispatcher,
            invitations: AsyncMutex::new(wiring.invitations),
        }
    }

    /// Token for a caller in the given tenant.
    pub fn token_for(&self, tenant_id: Uuid, role: UserRole) -> String {
        self.encoder
            .issue(Uuid::new_v4(), tenant_id, role, chrono::Duration::hours(1))
            .expect("Failed to issue token")
    }

    /// Token for an administrator of the default tenant.
    pub fn admin_token(&self) -> String {
        self.token_for(self.tenant_id, UserRole::Admin)
    }

    /// Token for the internal authentication/profile collaborator.
    pub fn service_token(&self) -> String {
        self.token_for(Uuid::new_v4(), UserRole::Service)
    }

    /// Send every queued invitation, as the worker would.
    pub async fn deliver_invitations(&self) -> usize {
        let mut queue = self.invitations.lock().await;
        let mut delivered = 0;
        while let Ok(account_id) = queue.try_recv() {
            self.dispatcher
                .send_invitation(account_id)
                .await
                .expect("Invitation failed");
            delivered += 1;
        }
        delivered
    }

    /// Upload a CSV file through the multipart endpoint.
    pub async fn upload(&self, kind: &str, file_name: &str, csv: &str, token: &str) -> TestResponse {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );

        let req = Request::builder()
            .method("POST")
            .uri(format!("/api/uploads/{kind}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let req = req.body(Body::empty()).expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body_bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header, empty when absent
    pub content_type: String,
    /// Raw body text
    pub text: String,
    /// Parsed JSON body, `Null` for non-JSON bodies
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}
