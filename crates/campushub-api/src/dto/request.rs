//! Request DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filters for `GET /api/uploads`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListFilter {
    /// Restrict to one tenant. Honoured for cross-tenant callers only.
    pub tenant_id: Option<Uuid>,
}
