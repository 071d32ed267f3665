//! Account handlers: invitation resend and lifecycle events.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::dto::response::{AccountResponse, ApiResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

type AccountResult = Result<Json<ApiResponse<AccountResponse>>, ApiError>;

fn respond(member: campushub_entity::member::TenantMember) -> AccountResult {
    Ok(Json(ApiResponse::ok(member.into())))
}

/// POST /api/accounts/{id}/invitation
pub async fn resend_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AccountResult {
    respond(state.account_service.resend_invitation(&auth, id).await?)
}

/// POST /api/accounts/{id}/suspend
pub async fn suspend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AccountResult {
    respond(state.account_service.suspend(&auth, id).await?)
}

/// POST /api/accounts/{id}/reinstate
pub async fn reinstate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AccountResult {
    respond(state.account_service.reinstate(&auth, id).await?)
}

/// POST /api/accounts/{id}/first-login
pub async fn first_login(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AccountResult {
    respond(state.account_service.record_first_login(&auth, id).await?)
}

/// POST /api/accounts/{id}/profile-completion
pub async fn profile_completion(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AccountResult {
    respond(
        state
            .account_service
            .record_profile_completion(&auth, id)
            .await?,
    )
}
