//! Queue administration handlers.
//!
//! Every endpoint requires a privileged caller ([`RequirePrivileged`]).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use raidsim_core::error::CoreError;
use raidsim_core::types::DbId;
use raidsim_db::models::sim_job::{SimJob, SimJobListQuery};
use raidsim_db::models::status::SimJobStatus;
use raidsim_db::repositories::{RosterRepo, SimJobRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reason recorded when a caller fails a job without giving one.
pub const DEFAULT_FAIL_REASON: &str = "Marked failed manually";

/// Request body for `POST /sim-jobs/{id}/fail`.
#[derive(Debug, Default, Deserialize)]
pub struct FailSimJob {
    pub reason: Option<String>,
}

/// Response body for `DELETE /sim-jobs`.
#[derive(Debug, Serialize)]
pub struct PurgeResult {
    pub deleted: u64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_job(pool: &sqlx::PgPool, job_id: DbId) -> AppResult<SimJob> {
    SimJobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SimJob",
            id: job_id,
        }))
}

/// Reject when the roster member already has a pending or running job.
async fn ensure_no_active_job(pool: &sqlx::PgPool, member_id: DbId) -> AppResult<()> {
    if SimJobRepo::has_active_for_subject(pool, member_id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Roster member {member_id} already has a queued or running simulation"
        ))));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/roster/{id}/sim
///
/// Queue a simulation for a roster member. 404 for an unknown member, 409
/// when one is already pending or running.
pub async fn enqueue_sim(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    Path(member_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    RosterRepo::find_by_id(&state.pool, member_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RosterMember",
            id: member_id,
        }))?;
    ensure_no_active_job(&state.pool, member_id).await?;

    let job = SimJobRepo::enqueue(&state.pool, member_id).await?;

    tracing::info!(
        job_id = job.id,
        subject_id = member_id,
        user_id = user.user_id,
        "Sim job queued",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

/// GET /api/v1/sim-jobs
///
/// Supports `status_id`, `roster_member_id`, `limit` and `offset`.
pub async fn list_sim_jobs(
    _: RequirePrivileged,
    State(state): State<AppState>,
    Query(params): Query<SimJobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = SimJobRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/sim-jobs/{id}
pub async fn get_sim_job(
    _: RequirePrivileged,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_job(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Purge / delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/sim-jobs
///
/// Remove every job that is not running.
pub async fn purge_sim_jobs(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let deleted = SimJobRepo::purge_all_except_running(&state.pool).await?;

    tracing::info!(deleted, user_id = user.user_id, "Sim queue purged");

    Ok(Json(DataResponse {
        data: PurgeResult { deleted },
    }))
}

/// DELETE /api/v1/sim-jobs/{id}
///
/// 204 on success, 409 while the job is running.
pub async fn delete_sim_job(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !SimJobRepo::delete(&state.pool, job_id).await? {
        // Either missing (404) or running (409).
        find_job(&state.pool, job_id).await?;
        return Err(AppError::Core(CoreError::Conflict(
            "Running jobs cannot be deleted".into(),
        )));
    }

    tracing::info!(job_id, user_id = user.user_id, "Sim job deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Retry / fail
// ---------------------------------------------------------------------------

/// POST /api/v1/sim-jobs/{id}/retry
///
/// Queue a new job for the member of a failed job. The new job's
/// `retry_of_job_id` points at the original. There is no automatic retry.
pub async fn retry_sim_job(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let original = find_job(&state.pool, job_id).await?;

    if original.status() != Some(SimJobStatus::Failed) {
        return Err(AppError::BadRequest("Only failed jobs can be retried".into()));
    }
    ensure_no_active_job(&state.pool, original.roster_member_id).await?;

    let new_job = SimJobRepo::retry(&state.pool, job_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Job changed state before it could be retried".into(),
        ))
    })?;

    tracing::info!(
        original_job_id = job_id,
        new_job_id = new_job.id,
        user_id = user.user_id,
        "Sim job retried",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: new_job })))
}

/// POST /api/v1/sim-jobs/{id}/fail
///
/// Mark a running job failed, e.g. after the worker died mid-run. 409 when
/// the job is not running.
pub async fn fail_sim_job(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<FailSimJob>,
) -> AppResult<impl IntoResponse> {
    let reason = input
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_FAIL_REASON);

    let Some(job) = SimJobRepo::fail(&state.pool, job_id, reason).await? else {
        find_job(&state.pool, job_id).await?;
        return Err(AppError::Core(CoreError::Conflict(
            "Only running jobs can be marked failed".into(),
        )));
    };

    tracing::info!(job_id, user_id = user.user_id, reason, "Sim job failed manually");

    Ok(Json(DataResponse { data: job }))
}
