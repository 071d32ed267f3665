//! In-memory implementation of both store traits.
//!
//! All state sits behind one async mutex, so each trait call is atomic:
//! `provision` checks and claims the email and roll number in the same
//! critical section, which gives the same uniqueness arbitration as the
//! database constraints.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{PageRequest, PageResponse};
use campushub_entity::member::{
    AccountLifecycle, AccountStatus, NewMember, NewProfile, StudentProfile, TenantMember,
    TrainerProfile,
};
use campushub_entity::upload::{
    CreateUploadJob, NewRowResult, RowOutcome, UploadJob, UploadRowResult, UploadStatus,
};

use crate::store::{LedgerStore, MemberStore};

#[derive(Debug, Default)]
struct State {
    members: HashMap<Uuid, TenantMember>,
    emails: HashMap<String, Uuid>,
    roll_numbers: HashMap<(Uuid, String), Uuid>,
    students: HashMap<Uuid, StudentProfile>,
    trainers: HashMap<Uuid, TrainerProfile>,
    jobs: HashMap<Uuid, UploadJob>,
    job_order: Vec<Uuid>,
    results: HashMap<Uuid, Vec<UploadRowResult>>,
    recorded_rows: HashMap<Uuid, HashSet<i32>>,
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provisioned members.
    pub async fn member_count(&self) -> usize {
        self.state.lock().await.members.len()
    }

    /// Student profile of a member, if any.
    pub async fn student_profile(&self, member_id: Uuid) -> Option<StudentProfile> {
        self.state.lock().await.students.get(&member_id).cloned()
    }

    /// Trainer profile of a member, if any.
    pub async fn trainer_profile(&self, member_id: Uuid) -> Option<TrainerProfile> {
        self.state.lock().await.trainers.get(&member_id).cloned()
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.emails.contains_key(&email.to_lowercase()))
    }

    async fn roll_number_exists(&self, tenant_id: Uuid, roll_number: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .roll_numbers
            .contains_key(&(tenant_id, roll_number.to_string())))
    }

    async fn provision(&self, member: &NewMember) -> AppResult<TenantMember> {
        let mut state = self.state.lock().await;
        let email = member.email.to_lowercase();

        if state.emails.contains_key(&email) {
            return Err(AppError::conflict(format!(
                "Email '{email}' is already registered"
            )));
        }
        let roll_key = member
            .profile
            .roll_number()
            .map(|roll| (member.tenant_id, roll.to_string()));
        if let Some(key) = &roll_key {
            if state.roll_numbers.contains_key(key) {
                return Err(AppError::conflict(format!(
                    "Roll number '{}' is already registered in this tenant",
                    key.1
                )));
            }
        }

        let now = Utc::now();
        let created = TenantMember {
            id: Uuid::now_v7(),
            tenant_id: member.tenant_id,
            kind: member.kind(),
            email: email.clone(),
            full_name: member.full_name.clone(),
            password_hash: member.password_hash.clone(),
            must_change_password: true,
            account_status: AccountStatus::PendingSetup,
            invitation_sent_at: None,
            setup_token_hash: None,
            setup_token_expires_at: None,
            first_login_at: None,
            profile_completed: false,
            lifecycle_version: 0,
            created_by: member.created_by,
            created_at: now,
            updated_at: now,
        };

        match &member.profile {
            NewProfile::Student {
                roll_number,
                degree,
                branch,
                year,
            } => {
                state.students.insert(
                    created.id,
                    StudentProfile {
                        member_id: created.id,
                        tenant_id: member.tenant_id,
                        roll_number: roll_number.clone(),
                        degree: degree.clone(),
                        branch: branch.clone(),
                        year: *year,
                        created_at: now,
                    },
                );
            }
            NewProfile::Trainer {
                department,
                specialization,
            } => {
                state.trainers.insert(
                    created.id,
                    TrainerProfile {
                        member_id: created.id,
                        tenant_id: member.tenant_id,
                        department: department.clone(),
                        specialization: specialization.clone(),
                        created_at: now,
                    },
                );
            }
        }

        state.emails.insert(email, created.id);
        if let Some(key) = roll_key {
            state.roll_numbers.insert(key, created.id);
        }
        state.members.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_member(&self, id: Uuid) -> AppResult<Option<TenantMember>> {
        Ok(self.state.lock().await.members.get(&id).cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> AppResult<Option<TenantMember>> {
        let state = self.state.lock().await;
        Ok(state
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| state.members.get(id))
            .cloned())
    }

    async fn record_invitation(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<TenantMember>> {
        let mut state = self.state.lock().await;
        Ok(state.members.get_mut(&id).map(|member| {
            member.invitation_sent_at = Some(sent_at);
            member.setup_token_hash = Some(token_hash.to_string());
            member.setup_token_expires_at = Some(token_expires_at);
            member.updated_at = Utc::now();
            member.clone()
        }))
    }

    async fn save_lifecycle(
        &self,
        id: Uuid,
        expected_version: i32,
        lifecycle: &AccountLifecycle,
    ) -> AppResult<Option<TenantMember>> {
        let mut state = self.state.lock().await;
        Ok(state
            .members
            .get_mut(&id)
            .filter(|member| member.lifecycle_version == expected_version)
            .map(|member| {
                member.account_status = lifecycle.status;
                member.first_login_at = lifecycle.first_login_at;
                member.profile_completed = lifecycle.profile_completed;
                member.lifecycle_version += 1;
                member.updated_at = Utc::now();
                member.clone()
            }))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create_job(&self, job: &CreateUploadJob) -> AppResult<UploadJob> {
        let mut state = self.state.lock().await;
        let created = UploadJob {
            id: Uuid::now_v7(),
            tenant_id: job.tenant_id,
            uploaded_by: job.uploaded_by,
            target_kind: job.target_kind,
            file_name: job.file_name.clone(),
            total_rows: 0,
            succeeded_rows: 0,
            failed_rows: 0,
            status: UploadStatus::Processing,
            error_report: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        state.jobs.insert(created.id, created.clone());
        state.job_order.push(created.id);
        state.results.insert(created.id, Vec::new());
        Ok(created)
    }

    async fn append_result(
        &self,
        job_id: Uuid,
        result: &NewRowResult,
    ) -> AppResult<UploadRowResult> {
        let mut state = self.state.lock().await;
        match state.jobs.get(&job_id) {
            Some(job) if job.status == UploadStatus::Processing => {}
            Some(_) => {
                return Err(AppError::conflict(format!(
                    "Upload job {job_id} is not accepting results"
                )));
            }
            None => {
                return Err(AppError::not_found(format!("Upload job {job_id} not found")));
            }
        }

        if !state
            .recorded_rows
            .entry(job_id)
            .or_default()
            .insert(result.row_number)
        {
            return Err(AppError::conflict(format!(
                "Row {} already recorded for job {job_id}",
                result.row_number
            )));
        }

        let stored = UploadRowResult {
            id: Uuid::now_v7(),
            job_id,
            row_number: result.row_number,
            outcome: result.outcome,
            entity_id: result.entity_id,
            error_message: result.error_message.clone(),
            raw_data: result.raw_data.clone(),
            created_at: Utc::now(),
        };
        state.results.entry(job_id).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: UploadStatus,
        error_report: Option<&str>,
    ) -> AppResult<UploadJob> {
        if !status.is_terminal() {
            return Err(AppError::validation(format!(
                "Cannot finalize upload job with status {status}"
            )));
        }

        let mut state = self.state.lock().await;
        let (total, succeeded) = state
            .results
            .get(&job_id)
            .map(|results| {
                let succeeded = results
                    .iter()
                    .filter(|r| r.outcome == RowOutcome::Success)
                    .count();
                (results.len(), succeeded)
            })
            .unwrap_or((0, 0));

        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::not_found(format!("Upload job {job_id} not found")))?;
        if job.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Upload job {job_id} is already {}",
                job.status
            )));
        }

        job.status = status;
        job.error_report = error_report.map(str::to_string);
        job.completed_at = Some(Utc::now());
        job.total_rows = total as i32;
        job.succeeded_rows = succeeded as i32;
        job.failed_rows = (total - succeeded) as i32;
        Ok(job.clone())
    }

    async fn find_job(&self, id: Uuid) -> AppResult<Option<UploadJob>> {
        Ok(self.state.lock().await.jobs.get(&id).cloned())
    }

    async fn list_jobs(
        &self,
        tenant_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UploadJob>> {
        let state = self.state.lock().await;
        let matching: Vec<&UploadJob> = state
            .job_order
            .iter()
            .rev()
            .filter_map(|id| state.jobs.get(id))
            .filter(|job| tenant_id.is_none_or(|t| job.tenant_id == t))
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<UploadRowResult>> {
        let state = self.state.lock().await;
        let mut results = state.results.get(&job_id).cloned().unwrap_or_default();
        results.sort_by_key(|r| r.row_number);
        Ok(results)
    }

    async fn delete_job(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.jobs.remove(&id).is_some();
        state.results.remove(&id);
        state.recorded_rows.remove(&id);
        state.job_order.retain(|j| *j != id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campushub_core::ErrorKind;
    use campushub_entity::member::MemberKind;

    fn student(tenant_id: Uuid, email: &str, roll: &str) -> NewMember {
        NewMember {
            tenant_id,
            email: email.to_string(),
            full_name: "Asha Rao".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_by: None,
            profile: NewProfile::Student {
                roll_number: roll.to_string(),
                degree: Some("B.Tech".to_string()),
                branch: None,
                year: Some(2),
            },
        }
    }

    fn new_job(tenant_id: Uuid) -> CreateUploadJob {
        CreateUploadJob {
            tenant_id,
            uploaded_by: Uuid::new_v4(),
            target_kind: MemberKind::Student,
            file_name: "students.csv".to_string(),
        }
    }

    #[tokio::test]
    async fn test_provision_creates_member_and_profile() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let member = store
            .provision(&student(tenant, "Asha@College.edu", "CS-01"))
            .await
            .unwrap();

        assert_eq!(member.email, "asha@college.edu");
        assert_eq!(member.account_status, AccountStatus::PendingSetup);
        assert!(member.must_change_password);
        assert!(store.email_exists("ASHA@college.edu").await.unwrap());
        assert!(store.roll_number_exists(tenant, "CS-01").await.unwrap());
        assert_eq!(
            store.student_profile(member.id).await.unwrap().roll_number,
            "CS-01"
        );
    }

    #[tokio::test]
    async fn test_email_unique_across_tenants() {
        let store = MemoryStore::new();
        store
            .provision(&student(Uuid::new_v4(), "a@x.edu", "1"))
            .await
            .unwrap();
        let err = store
            .provision(&student(Uuid::new_v4(), "a@x.edu", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_roll_number_unique_within_tenant_only() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.provision(&student(tenant, "a@x.edu", "R1")).await.unwrap();

        let err = store
            .provision(&student(tenant, "b@x.edu", "R1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(!store.email_exists("b@x.edu").await.unwrap());

        store
            .provision(&student(Uuid::new_v4(), "c@x.edu", "R1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_save_lifecycle_rejects_stale_version() {
        let store = MemoryStore::new();
        let member = store
            .provision(&student(Uuid::new_v4(), "a@x.edu", "1"))
            .await
            .unwrap();
        let next = AccountLifecycle {
            status: AccountStatus::Suspended,
            ..member.lifecycle()
        };

        let saved = store.save_lifecycle(member.id, 0, &next).await.unwrap();
        assert_eq!(saved.unwrap().lifecycle_version, 1);
        assert!(store.save_lifecycle(member.id, 0, &next).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finalize_recomputes_counts() {
        let store = MemoryStore::new();
        let job = store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        let raw = serde_json::json!({});
        store
            .append_result(job.id, &NewRowResult::success(1, Uuid::new_v4(), raw.clone()))
            .await
            .unwrap();
        store
            .append_result(job.id, &NewRowResult::failed(2, "bad email", raw.clone()))
            .await
            .unwrap();
        store
            .append_result(job.id, &NewRowResult::skipped(3, "blank row", raw))
            .await
            .unwrap();

        let done = store
            .finalize_job(job.id, UploadStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(done.total_rows, 3);
        assert_eq!(done.succeeded_rows, 1);
        assert_eq!(done.failed_rows, 2);
        assert!(done.counts_consistent());
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_finalized_job_is_immutable() {
        let store = MemoryStore::new();
        let job = store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        store
            .finalize_job(job.id, UploadStatus::Failed, Some("missing header"))
            .await
            .unwrap();

        let err = store
            .append_result(job.id, &NewRowResult::failed(1, "x", serde_json::json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err = store
            .finalize_job(job.id, UploadStatus::Completed, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_row_number_rejected() {
        let store = MemoryStore::new();
        let job = store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        for n in 1..=2_000 {
            let row = NewRowResult::failed(n, "x", serde_json::json!({}));
            store.append_result(job.id, &row).await.unwrap();
        }

        let row = NewRowResult::failed(1_000, "again", serde_json::json!({}));
        let err = store.append_result(job.id, &row).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let results = store.list_results(job.id).await.unwrap();
        assert_eq!(results.len(), 2_000);
        assert_eq!(results[999].error_message.as_deref(), Some("x"));

        let other = store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        store.append_result(other.id, &row).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_jobs_most_recent_first_and_scoped() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let first = store.create_job(&new_job(tenant)).await.unwrap();
        store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        let third = store.create_job(&new_job(tenant)).await.unwrap();

        let page = store
            .list_jobs(Some(tenant), &PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(page.total_items, 2);

        let all = store.list_jobs(None, &PageRequest::default()).await.unwrap();
        assert_eq!(all.total_items, 3);
    }

    #[tokio::test]
    async fn test_delete_job_removes_results() {
        let store = MemoryStore::new();
        let job = store.create_job(&new_job(Uuid::new_v4())).await.unwrap();
        store
            .append_result(job.id, &NewRowResult::failed(1, "x", serde_json::json!({})))
            .await
            .unwrap();

        assert!(store.delete_job(job.id).await.unwrap());
        assert!(store.find_job(job.id).await.unwrap().is_none());
        assert!(store.list_results(job.id).await.unwrap().is_empty());
        assert!(!store.delete_job(job.id).await.unwrap());
    }
}
