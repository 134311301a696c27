use raidsim_core::types::DbId;

/// Errors raised while completing or processing a job.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Sim job with id {0} not found")]
    JobNotFound(DbId),

    #[error("Roster member with id {0} not found")]
    SubjectNotFound(DbId),

    /// The job's current status does not allow the requested transition.
    #[error("Sim job {job_id} is {status} and cannot be completed")]
    InvalidTransition { job_id: DbId, status: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
