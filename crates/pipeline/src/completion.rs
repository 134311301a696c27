//! Completion bookkeeping for a job whose finished-report URL is known.
//!
//! Used both by the worker after a successful automation run and by the
//! Completion Gateway for out-of-band results. Completing an already
//! completed or failed job is allowed and re-runs extraction; a newer job's numbers
//! are never overwritten by an older one.

use raidsim_core::types::DbId;
use raidsim_db::models::roster::SimStats;
use raidsim_db::models::sim_job::SimJob;
use raidsim_db::models::status::SimJobStatus;
use raidsim_db::repositories::{RosterRepo, SimJobRepo};
use raidsim_simbot::extractor::ResultExtractor;
use raidsim_simbot::report::ExtractedResult;
use sqlx::PgPool;

use crate::error::PipelineError;

/// What [`finalize`] did.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The job as stored after completion.
    pub job: SimJob,
    /// Extracted numbers, if the report was readable in time.
    pub result: Option<ExtractedResult>,
    /// Extraction diagnostic, e.g. `DPS Found: 1250000`.
    pub message: String,
    /// Whether the roster member's cached stats were written. `false` when
    /// a newer job had already recorded its result.
    pub subject_updated: bool,
}

/// Extract the result behind `result_url`, then mark the job completed and
/// write the roster member's cached stats in one transaction.
///
/// Extraction failure is not an error: the job still completes, the link
/// is still recorded, and the previous numbers are kept.
pub async fn finalize(
    pool: &PgPool,
    extractor: &dyn ResultExtractor,
    job_id: DbId,
    result_url: &str,
) -> Result<CompletionOutcome, PipelineError> {
    let job = SimJobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(PipelineError::JobNotFound(job_id))?;
    ensure_completable(&job)?;

    let extraction = extractor.extract(result_url).await;
    let stats = extraction.result.map(|r| SimStats {
        dps: r.mean_throughput.round(),
        item_level: r.gear_score,
    });

    let mut tx = pool.begin().await?;

    // The job may have been deleted while extraction ran.
    let note = Some(extraction.diagnostic.as_str());
    let Some(completed) = SimJobRepo::complete(&mut *tx, job_id, result_url, note).await? else {
        tx.rollback().await?;
        return match SimJobRepo::find_by_id(pool, job_id).await? {
            Some(current) => Err(invalid_transition(&current)),
            None => Err(PipelineError::JobNotFound(job_id)),
        };
    };

    let subject_updated = RosterRepo::record_simulation(
        &mut *tx,
        completed.roster_member_id,
        job_id,
        result_url,
        stats,
    )
    .await?;

    tx.commit().await?;

    if !subject_updated {
        tracing::info!(
            job_id,
            subject_id = completed.roster_member_id,
            "Newer result already recorded, roster stats left unchanged",
        );
    }

    tracing::info!(
        job_id,
        subject_id = completed.roster_member_id,
        attempts = extraction.attempts,
        message = %extraction.diagnostic,
        "Sim job completed",
    );

    Ok(CompletionOutcome {
        job: completed,
        result: extraction.result,
        message: extraction.diagnostic,
        subject_updated,
    })
}

fn ensure_completable(job: &SimJob) -> Result<(), PipelineError> {
    match job.status() {
        Some(status) if status.can_transition_to(SimJobStatus::Completed) => Ok(()),
        _ => Err(invalid_transition(job)),
    }
}

fn invalid_transition(job: &SimJob) -> PipelineError {
    PipelineError::InvalidTransition {
        job_id: job.id,
        status: job.status().map_or("unknown", SimJobStatus::as_str),
    }
}
