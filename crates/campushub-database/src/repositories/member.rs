//! Member repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_entity::member::{AccountLifecycle, NewMember, NewProfile, TenantMember};

use crate::error::map_sqlx;
use crate::store::MemberStore;

const EMAIL_KEY: &str = "members_email_key";
const ROLL_NUMBER_KEY: &str = "student_profiles_tenant_roll_number_key";

/// Repository for member credentials and profiles.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    /// Create a new member repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_provision_error(e: sqlx::Error, member: &NewMember) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(EMAIL_KEY) => {
            AppError::conflict(format!("Email '{}' is already registered", member.email))
        }
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(ROLL_NUMBER_KEY) => {
            AppError::conflict(format!(
                "Roll number '{}' is already registered in this tenant",
                member.profile.roll_number().unwrap_or_default()
            ))
        }
        _ => map_sqlx(e, "Failed to provision member"),
    }
}

#[async_trait]
impl MemberStore for MemberRepository {
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM members WHERE email = LOWER($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "Failed to check email"))
    }

    async fn roll_number_exists(&self, tenant_id: Uuid, roll_number: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM student_profiles \
             WHERE tenant_id = $1 AND roll_number = $2)",
        )
        .bind(tenant_id)
        .bind(roll_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to check roll number"))
    }

    async fn provision(&self, member: &NewMember) -> AppResult<TenantMember> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx(e, "Failed to begin provisioning transaction"))?;

        let created = sqlx::query_as::<_, TenantMember>(
            "INSERT INTO members (tenant_id, kind, email, full_name, password_hash, \
                                  must_change_password, account_status, created_by) \
             VALUES ($1, $2, LOWER($3), $4, $5, TRUE, 'PENDING_SETUP', $6) \
             RETURNING *",
        )
        .bind(member.tenant_id)
        .bind(member.kind())
        .bind(&member.email)
        .bind(&member.full_name)
        .bind(&member.password_hash)
        .bind(member.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_provision_error(e, member))?;

        match &member.profile {
            NewProfile::Student {
                roll_number,
                degree,
                branch,
                year,
            } => {
                sqlx::query(
                    "INSERT INTO student_profiles \
                     (member_id, tenant_id, roll_number, degree, branch, year) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(created.id)
                .bind(member.tenant_id)
                .bind(roll_number)
                .bind(degree)
                .bind(branch)
                .bind(year)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_provision_error(e, member))?;
            }
            NewProfile::Trainer {
                department,
                specialization,
            } => {
                sqlx::query(
                    "INSERT INTO trainer_profiles \
                     (member_id, tenant_id, department, specialization) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(created.id)
                .bind(member.tenant_id)
                .bind(department)
                .bind(specialization)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_provision_error(e, member))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx(e, "Failed to commit provisioning transaction"))?;
        Ok(created)
    }

    async fn find_member(&self, id: Uuid) -> AppResult<Option<TenantMember>> {
        sqlx::query_as::<_, TenantMember>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "Failed to find member"))
    }

    async fn find_member_by_email(&self, email: &str) -> AppResult<Option<TenantMember>> {
        sqlx::query_as::<_, TenantMember>("SELECT * FROM members WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "Failed to find member by email"))
    }

    async fn record_invitation(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<TenantMember>> {
        sqlx::query_as::<_, TenantMember>(
            "UPDATE members SET invitation_sent_at = $2, setup_token_hash = $3, \
                                setup_token_expires_at = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(sent_at)
        .bind(token_hash)
        .bind(token_expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to record invitation"))
    }

    async fn save_lifecycle(
        &self,
        id: Uuid,
        expected_version: i32,
        lifecycle: &AccountLifecycle,
    ) -> AppResult<Option<TenantMember>> {
        sqlx::query_as::<_, TenantMember>(
            "UPDATE members SET account_status = $3, first_login_at = $4, \
                                profile_completed = $5, \
                                lifecycle_version = lifecycle_version + 1, \
                                updated_at = NOW() \
             WHERE id = $1 AND lifecycle_version = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_version)
        .bind(lifecycle.status)
        .bind(lifecycle.first_login_at)
        .bind(lifecycle.profile_completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to save account lifecycle"))
    }
}
