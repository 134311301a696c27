//! The single-consumer worker loop.
//!
//! Claims the oldest pending job, drives the automation target, and hands
//! the finished-report URL to [`finalize`]. Jobs are processed strictly one
//! at a time; an empty queue sleeps for `poll_interval`. A failing job is
//! recorded as failed and the loop moves on.

use std::sync::Arc;
use std::time::Duration;

use raidsim_core::types::DbId;
use raidsim_db::models::sim_job::SimJob;
use raidsim_db::repositories::{RosterRepo, SimJobRepo};
use raidsim_simbot::driver::{AutomationDriver, SimRequest};
use raidsim_simbot::extractor::ResultExtractor;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::completion::finalize;
use crate::error::PipelineError;

/// Default sleep when the queue is empty.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What happened to a claimed job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed {
        job_id: DbId,
        result_url: String,
        message: String,
    },
    Failed {
        job_id: DbId,
        reason: String,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> DbId {
        match self {
            JobOutcome::Completed { job_id, .. } | JobOutcome::Failed { job_id, .. } => *job_id,
        }
    }
}

pub struct WorkerLoop {
    pool: PgPool,
    driver: Arc<dyn AutomationDriver>,
    extractor: Arc<dyn ResultExtractor>,
    poll_interval: Duration,
}

impl WorkerLoop {
    pub fn new(
        pool: PgPool,
        driver: Arc<dyn AutomationDriver>,
        extractor: Arc<dyn ResultExtractor>,
    ) -> Self {
        Self {
            pool,
            driver,
            extractor,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Process jobs until `cancel` fires.
    ///
    /// Cancellation is observed only between jobs; a job in progress runs
    /// to completion.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Sim worker started",
        );

        while !cancel.is_cancelled() {
            let idle = match self.run_once().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    tracing::error!(error = %e, "Worker cycle failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        tracing::info!("Sim worker shutting down");
    }

    /// Claim and process at most one job. Returns `None` when the queue is
    /// empty.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>, PipelineError> {
        let Some(job) = SimJobRepo::claim_oldest_pending(&self.pool).await? else {
            return Ok(None);
        };

        tracing::info!(
            job_id = job.id,
            subject_id = job.roster_member_id,
            "Sim job claimed",
        );

        let outcome = match self.process(&job).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(&job, &e.to_string()).await?,
        };
        Ok(Some(outcome))
    }

    async fn process(&self, job: &SimJob) -> Result<JobOutcome, PipelineError> {
        let identity = RosterRepo::find_identity(&self.pool, job.roster_member_id)
            .await?
            .ok_or(PipelineError::SubjectNotFound(job.roster_member_id))?;

        let request = SimRequest {
            name: identity.name,
            realm: identity.realm,
            region: identity.region,
        };

        let result_url = match self.driver.run(&request).await {
            Ok(url) => url,
            Err(e) => return self.fail(job, &e.to_string()).await,
        };

        let completion = finalize(&self.pool, self.extractor.as_ref(), job.id, &result_url).await?;

        Ok(JobOutcome::Completed {
            job_id: job.id,
            result_url,
            message: completion.message,
        })
    }

    async fn fail(&self, job: &SimJob, reason: &str) -> Result<JobOutcome, PipelineError> {
        tracing::warn!(job_id = job.id, reason, "Sim job failed");
        if SimJobRepo::fail(&self.pool, job.id, reason).await?.is_none() {
            tracing::warn!(
                job_id = job.id,
                "Sim job was no longer running when marking it failed",
            );
        }
        Ok(JobOutcome::Failed {
            job_id: job.id,
            reason: reason.to_string(),
        })
    }
}
