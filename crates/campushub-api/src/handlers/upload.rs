//! Upload handlers: submit, template, list, detail, reprocess, delete.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use bytes::Bytes;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_entity::member::MemberKind;
use campushub_entity::upload::UploadJob;
use campushub_service::{UploadJobDetail, UploadSummary};

use crate::dto::request::JobListFilter;
use crate::dto::response::{ApiResponse, MessageResponse, PaginatedResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/uploads/{kind}
///
/// Always answers 200 with a job summary once the file is accepted; row
/// failures are part of the summary.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadSummary>>, ApiError> {
    let kind: MemberKind = kind.parse()?;

    let mut file_name: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(String::from);
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
            );
        }
    }

    let data = data.ok_or_else(|| AppError::validation("Multipart field 'file' is required"))?;
    let file_name = file_name.unwrap_or_else(|| format!("{}.csv", kind.plural()));

    let summary = state
        .upload_service
        .submit(&auth, kind, &file_name, &data)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/uploads/templates/{kind}
pub async fn template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let kind: MemberKind = kind.parse()?;
    let body = state.upload_service.template(kind)?;
    let disposition = format!("attachment; filename=\"{}-template.csv\"", kind.plural());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /api/uploads
pub async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<JobListFilter>,
) -> Result<Json<ApiResponse<PaginatedResponse<UploadJob>>>, ApiError> {
    let page = params.into_page_request();
    let jobs = state
        .upload_ledger
        .list_jobs(&auth, filter.tenant_id, &page)
        .await?;
    Ok(Json(ApiResponse::ok(jobs.into())))
}

/// GET /api/uploads/{id}
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UploadJobDetail>>, ApiError> {
    let detail = state.upload_ledger.job_detail(&auth, id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/uploads/{id}/reprocess
pub async fn reprocess(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UploadSummary>>, ApiError> {
    let summary = state.upload_service.reprocess_failed(&auth, id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// DELETE /api/uploads/{id}
pub async fn delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.upload_ledger.delete_job(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Upload job {id} deleted"),
    })))
}
