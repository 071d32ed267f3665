//! Caller role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles carried in the caller's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform operator; not bound to one tenant.
    SuperAdmin,
    /// College administrator.
    Admin,
    /// Trainer account.
    Trainer,
    /// Student account.
    Student,
    /// Internal collaborator (authentication or profile subsystem).
    Service,
}

impl UserRole {
    /// Whether this role may manage uploads and accounts.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }

    /// Whether this role may see every tenant.
    pub fn is_cross_tenant(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Service)
    }

    /// Whether this role may report lifecycle events.
    pub fn is_lifecycle_reporter(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Service)
    }

    /// Return the role as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Trainer => "trainer",
            Self::Student => "student",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = campushub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "trainer" => Ok(Self::Trainer),
            "student" => Ok(Self::Student),
            "service" => Ok(Self::Service),
            _ => Err(campushub_core::AppError::validation(format!(
                "Invalid user role: '{s}'"
            ))),
        }
    }
}
