//! Request context carrying the authenticated caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Extracted from the bearer token and passed into service methods so that
/// every operation knows who is acting and for which tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The caller's user id.
    pub user_id: Uuid,
    /// The caller's tenant.
    pub tenant_id: Uuid,
    /// The caller's role.
    pub role: UserRole,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, tenant_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id,
            tenant_id,
            role,
        }
    }

    /// Fails unless the caller administers uploads and accounts.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator role required"))
        }
    }

    /// Fails unless the caller may report lifecycle events.
    pub fn require_lifecycle_reporter(&self) -> Result<(), AppError> {
        if self.role.is_lifecycle_reporter() {
            Ok(())
        } else {
            Err(AppError::forbidden("Lifecycle events are reported by internal services only"))
        }
    }

    /// Whether resources of `tenant_id` are visible to the caller.
    pub fn can_access_tenant(&self, tenant_id: Uuid) -> bool {
        self.role.is_cross_tenant() || self.tenant_id == tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scoping() {
        let tenant = Uuid::new_v4();
        let admin = RequestContext::new(Uuid::new_v4(), tenant, UserRole::Admin);
        assert!(admin.can_access_tenant(tenant));
        assert!(!admin.can_access_tenant(Uuid::new_v4()));

        let root = RequestContext::new(Uuid::new_v4(), tenant, UserRole::SuperAdmin);
        assert!(root.can_access_tenant(Uuid::new_v4()));
    }

    #[test]
    fn test_role_gates() {
        let student = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Student);
        assert!(student.require_admin().is_err());
        assert!(student.require_lifecycle_reporter().is_err());

        let service = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Service);
        assert!(service.require_lifecycle_reporter().is_ok());
        assert!(service.require_admin().is_err());
    }
}
