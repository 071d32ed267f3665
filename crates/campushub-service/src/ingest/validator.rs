//! Row validator: domain checks that decide whether a row may be provisioned.
//!
//! Checks run in a fixed order and stop at the first failure:
//! required fields, email syntax, year, email uniqueness, roll number
//! uniqueness. Uniqueness is checked against earlier rows of the same file
//! before the store is consulted. A row's email and roll number are claimed
//! for the file only once the row passes every check.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidateEmail;

use campushub_core::result::AppResult;
use campushub_database::store::MemberStore;
use campushub_entity::member::{MemberKind, NewProfile};

use super::decoder::RawRow;
use super::retry::RetryPolicy;
use super::schema::{
    BRANCH, DEGREE, DEPARTMENT, EMAIL, FULL_NAME, ROLL_NUMBER, RecordSchema, SPECIALIZATION, YEAR,
};

/// Why a row was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// A required cell is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// The email is not syntactically valid.
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    /// Year is not a positive integer.
    #[error("Year must be a positive integer, got '{0}'")]
    InvalidYear(String),
    /// An earlier row of the file uses the same email.
    #[error("Duplicate within file: email '{email}' already used in row {first_row}")]
    DuplicateEmailInFile {
        /// Normalised email.
        email: String,
        /// Row that claimed it first.
        first_row: u32,
    },
    /// Some account already uses the email.
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),
    /// An earlier row of the file uses the same roll number.
    #[error("Duplicate within file: roll number '{roll_number}' already used in row {first_row}")]
    DuplicateRollNumberInFile {
        /// Roll number.
        roll_number: String,
        /// Row that claimed it first.
        first_row: u32,
    },
    /// A student in the tenant already holds the roll number.
    #[error("Roll number '{0}' is already registered in this tenant")]
    RollNumberTaken(String),
}

/// A row that passed validation, ready for provisioning.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedRow {
    /// 1-based row position.
    pub row_number: u32,
    /// Lower-cased, trimmed email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Profile fields.
    pub profile: NewProfile,
    /// Raw row snapshot.
    pub snapshot: Value,
}

/// Validates the rows of one upload in order.
#[derive(Debug)]
pub struct RowValidator {
    store: Arc<dyn MemberStore>,
    retry: RetryPolicy,
    tenant_id: Uuid,
    schema: &'static RecordSchema,
    seen_emails: HashMap<String, u32>,
    seen_roll_numbers: HashMap<String, u32>,
}

impl RowValidator {
    /// Validator for one file destined for `tenant_id`.
    pub fn new(
        store: Arc<dyn MemberStore>,
        retry: RetryPolicy,
        tenant_id: Uuid,
        kind: MemberKind,
    ) -> Self {
        Self {
            store,
            retry,
            tenant_id,
            schema: RecordSchema::for_kind(kind),
            seen_emails: HashMap::new(),
            seen_roll_numbers: HashMap::new(),
        }
    }

    /// Validate one row.
    ///
    /// The outer error is a store failure during a uniqueness lookup; the
    /// inner one is a rejection of the row's data.
    pub async fn validate(&mut self, row: &RawRow) -> AppResult<Result<AdmittedRow, RejectReason>> {
        if let Some(missing) = self.schema.required().find(|name| row.get(name).is_none()) {
            return Ok(Err(RejectReason::MissingField(missing)));
        }

        let full_name = row.get(FULL_NAME).unwrap_or_default().to_string();
        let email = row.get(EMAIL).unwrap_or_default().to_lowercase();
        if !email.validate_email() {
            return Ok(Err(RejectReason::InvalidEmail(email)));
        }

        let profile = match self.schema.kind {
            MemberKind::Student => {
                let year = match row.get(YEAR) {
                    None => None,
                    Some(raw) => match raw.parse::<i32>() {
                        Ok(year) if year > 0 => Some(year),
                        _ => return Ok(Err(RejectReason::InvalidYear(raw.to_string()))),
                    },
                };
                NewProfile::Student {
                    roll_number: row.get(ROLL_NUMBER).unwrap_or_default().to_string(),
                    degree: row.get(DEGREE).map(str::to_string),
                    branch: row.get(BRANCH).map(str::to_string),
                    year,
                }
            }
            MemberKind::Trainer => NewProfile::Trainer {
                department: row.get(DEPARTMENT).map(str::to_string),
                specialization: row.get(SPECIALIZATION).map(str::to_string),
            },
        };

        if let Some(&first_row) = self.seen_emails.get(&email) {
            return Ok(Err(RejectReason::DuplicateEmailInFile { email, first_row }));
        }
        let store = &self.store;
        let lookup = email.as_str();
        if self
            .retry
            .run("Email lookup", move || store.email_exists(lookup))
            .await?
        {
            return Ok(Err(RejectReason::EmailTaken(email)));
        }

        if let Some(roll_number) = profile.roll_number() {
            if let Some(&first_row) = self.seen_roll_numbers.get(roll_number) {
                return Ok(Err(RejectReason::DuplicateRollNumberInFile {
                    roll_number: roll_number.to_string(),
                    first_row,
                }));
            }
            let tenant_id = self.tenant_id;
            if self
                .retry
                .run("Roll number lookup", move || {
                    store.roll_number_exists(tenant_id, roll_number)
                })
                .await?
            {
                return Ok(Err(RejectReason::RollNumberTaken(roll_number.to_string())));
            }
            self.seen_roll_numbers
                .insert(roll_number.to_string(), row.row_number);
        }
        self.seen_emails.insert(email.clone(), row.row_number);

        Ok(Ok(AdmittedRow {
            row_number: row.row_number,
            email,
            full_name,
            profile,
            snapshot: row.snapshot(),
        }))
    }
}
