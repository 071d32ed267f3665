//! Member kind and account status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The domain profile attached to a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberKind {
    /// Student with a roll number.
    Student,
    /// Trainer with a department.
    Trainer,
}

impl MemberKind {
    /// Return the kind as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Trainer => "TRAINER",
        }
    }

    /// Plural lowercase form used in URLs and file names.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Trainer => "trainers",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberKind {
    type Err = campushub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" | "students" => Ok(Self::Student),
            "trainer" | "trainers" => Ok(Self::Trainer),
            _ => Err(campushub_core::AppError::validation(format!(
                "Invalid member kind: '{s}'. Expected one of: students, trainers"
            ))),
        }
    }
}

/// Account status of a provisioned member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Provisioned, never logged in.
    PendingSetup,
    /// Logged in with a completed profile.
    Active,
    /// Logged in, profile still incomplete.
    Incomplete,
    /// Disabled by an administrator.
    Suspended,
}

impl AccountStatus {
    /// Return the status as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingSetup => "PENDING_SETUP",
            Self::Active => "ACTIVE",
            Self::Incomplete => "INCOMPLETE",
            Self::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_kind_from_str() {
        assert_eq!("students".parse::<MemberKind>().unwrap(), MemberKind::Student);
        assert_eq!("Trainer".parse::<MemberKind>().unwrap(), MemberKind::Trainer);
        assert!("batches".parse::<MemberKind>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&AccountStatus::PendingSetup).unwrap();
        assert_eq!(json, "\"PENDING_SETUP\"");
    }
}
