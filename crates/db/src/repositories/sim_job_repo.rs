//! Repository for the `sim_jobs` table.
//!
//! Every status change is a single conditional UPDATE whose WHERE clause
//! encodes the allowed source statuses, so a transition the state machine
//! does not permit simply matches no row.

use raidsim_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::sim_job::{SimJob, SimJobListQuery};
use crate::models::status::{SimJobStatus, COMPLETABLE_STATUSES};

/// Column list for `sim_jobs` queries.
const COLUMNS: &str = "\
    id, roster_member_id, status_id, result_url, error_message, \
    extraction_note, retry_of_job_id, claimed_at, completed_at, \
    created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides queue operations for simulation jobs.
pub struct SimJobRepo;

impl SimJobRepo {
    /// Create a new pending job for a roster member.
    ///
    /// Does not deduplicate; callers check [`Self::has_active_for_subject`]
    /// first when they need the one-active-job-per-subject guarantee.
    pub async fn enqueue(pool: &PgPool, roster_member_id: DbId) -> Result<SimJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO sim_jobs (roster_member_id, status_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SimJob>(&query)
            .bind(roster_member_id)
            .bind(SimJobStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job and mark it running.
    ///
    /// `FOR UPDATE SKIP LOCKED` keeps two concurrent claims from returning
    /// the same row. There is no lease: a worker that dies leaves its job
    /// in `running` until an operator intervenes.
    pub async fn claim_oldest_pending(pool: &PgPool) -> Result<Option<SimJob>, sqlx::Error> {
        let query = format!(
            "UPDATE sim_jobs \
             SET status_id = $1, claimed_at = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM sim_jobs \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SimJob>(&query)
            .bind(SimJobStatus::Running.id())
            .bind(SimJobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job completed with its report URL.
    ///
    /// Allowed from any status: re-completion is the idempotent gateway
    /// path (last write wins), and a failed job may be completed once its
    /// run was finished by hand. Clears `error_message`. Returns `None` when
    /// the job does not exist.
    pub async fn complete<'e, E: PgExecutor<'e>>(
        executor: E,
        job_id: DbId,
        result_url: &str,
        extraction_note: Option<&str>,
    ) -> Result<Option<SimJob>, sqlx::Error> {
        let query = format!(
            "UPDATE sim_jobs \
             SET status_id = $2, result_url = $3, extraction_note = $4, \
                 error_message = NULL, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = ANY($5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SimJob>(&query)
            .bind(job_id)
            .bind(SimJobStatus::Completed.id())
            .bind(result_url)
            .bind(extraction_note)
            .bind(&COMPLETABLE_STATUSES[..])
            .fetch_optional(executor)
            .await
    }

    /// Mark a running job failed with a human-readable reason.
    ///
    /// No automatic retry is performed; see [`Self::retry`]. Returns `None`
    /// when the job does not exist or is not running.
    pub async fn fail(
        pool: &PgPool,
        job_id: DbId,
        reason: &str,
    ) -> Result<Option<SimJob>, sqlx::Error> {
        let query = format!(
            "UPDATE sim_jobs \
             SET status_id = $2, error_message = $3, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SimJob>(&query)
            .bind(job_id)
            .bind(SimJobStatus::Failed.id())
            .bind(reason)
            .bind(SimJobStatus::Running.id())
            .fetch_optional(pool)
            .await
    }

    /// Delete every job that is not running. Returns the number removed.
    ///
    /// Running jobs are kept so an in-flight browser session is never
    /// orphaned.
    pub async fn purge_all_except_running(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sim_jobs WHERE status_id <> $1")
            .bind(SimJobStatus::Running.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a single job unless it is running.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sim_jobs WHERE id = $1 AND status_id <> $2")
            .bind(job_id)
            .bind(SimJobStatus::Running.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Re-enqueue the subject of a failed job as a new pending job.
    ///
    /// The new job has `retry_of_job_id` pointing to the original. Returns
    /// `None` when the original does not exist or is not failed.
    pub async fn retry(pool: &PgPool, job_id: DbId) -> Result<Option<SimJob>, sqlx::Error> {
        let query = format!(
            "INSERT INTO sim_jobs (roster_member_id, status_id, retry_of_job_id) \
             SELECT roster_member_id, $2, id FROM sim_jobs \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SimJob>(&query)
            .bind(job_id)
            .bind(SimJobStatus::Pending.id())
            .bind(SimJobStatus::Failed.id())
            .fetch_optional(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SimJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sim_jobs WHERE id = $1");
        sqlx::query_as::<_, SimJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the roster member already has a pending or running job.
    pub async fn has_active_for_subject(
        pool: &PgPool,
        roster_member_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM sim_jobs \
                 WHERE roster_member_id = $1 AND status_id IN ($2, $3) \
             )",
        )
        .bind(roster_member_id)
        .bind(SimJobStatus::Pending.id())
        .bind(SimJobStatus::Running.id())
        .fetch_one(pool)
        .await
    }

    /// List jobs newest first with optional filters and pagination.
    pub async fn list(pool: &PgPool, params: &SimJobListQuery) -> Result<Vec<SimJob>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        if params.roster_member_id.is_some() {
            conditions.push(format!("roster_member_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM sim_jobs \
             {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, SimJob>(&query);

        if let Some(sid) = params.status_id {
            q = q.bind(sid);
        }
        if let Some(rid) = params.roster_member_id {
            q = q.bind(rid);
        }

        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }
}
