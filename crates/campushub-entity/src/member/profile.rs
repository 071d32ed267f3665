//! Student and trainer domain profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::MemberKind;

/// Student profile row, keyed by the owning member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentProfile {
    /// Owning member.
    pub member_id: Uuid,
    /// Tenant, duplicated from the member for the roll-number constraint.
    pub tenant_id: Uuid,
    /// Roll number, unique within the tenant.
    pub roll_number: String,
    /// Degree programme.
    pub degree: Option<String>,
    /// Branch or specialisation.
    pub branch: Option<String>,
    /// Year of study.
    pub year: Option<i32>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Trainer profile row, keyed by the owning member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerProfile {
    /// Owning member.
    pub member_id: Uuid,
    /// Tenant.
    pub tenant_id: Uuid,
    /// Department.
    pub department: Option<String>,
    /// Area of specialisation.
    pub specialization: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Profile data supplied at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewProfile {
    /// Student profile fields.
    Student {
        /// Roll number.
        roll_number: String,
        /// Degree programme.
        degree: Option<String>,
        /// Branch.
        branch: Option<String>,
        /// Year of study.
        year: Option<i32>,
    },
    /// Trainer profile fields.
    Trainer {
        /// Department.
        department: Option<String>,
        /// Specialisation.
        specialization: Option<String>,
    },
}

impl NewProfile {
    /// The member kind this profile belongs to.
    pub fn kind(&self) -> MemberKind {
        match self {
            Self::Student { .. } => MemberKind::Student,
            Self::Trainer { .. } => MemberKind::Trainer,
        }
    }

    /// Roll number for student profiles.
    pub fn roll_number(&self) -> Option<&str> {
        match self {
            Self::Student { roll_number, .. } => Some(roll_number),
            Self::Trainer { .. } => None,
        }
    }
}
