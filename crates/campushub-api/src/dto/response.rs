//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campushub_core::types::PageResponse;
use campushub_entity::member::{AccountStatus, MemberKind, TenantMember};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Total item count.
    pub total: u64,
    /// Current page.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total pages.
    pub total_pages: u64,
}

impl<T: Serialize> From<PageResponse<T>> for PaginatedResponse<T> {
    fn from(page: PageResponse<T>) -> Self {
        Self {
            items: page.items,
            total: page.total_items,
            page: page.page,
            per_page: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// A provisioned account as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: MemberKind,
    pub email: String,
    pub full_name: String,
    pub account_status: AccountStatus,
    pub must_change_password: bool,
    pub invitation_sent_at: Option<DateTime<Utc>>,
    pub first_login_at: Option<DateTime<Utc>>,
    pub profile_completed: bool,
}

impl From<TenantMember> for AccountResponse {
    fn from(m: TenantMember) -> Self {
        Self {
            id: m.id,
            tenant_id: m.tenant_id,
            kind: m.kind,
            email: m.email,
            full_name: m.full_name,
            account_status: m.account_status,
            must_change_password: m.must_change_password,
            invitation_sent_at: m.invitation_sent_at,
            first_login_at: m.first_login_at,
            profile_completed: m.profile_completed,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Storage backend in use.
    pub database: String,
}
