//! Simulation job entity and query DTOs.

use raidsim_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{SimJobStatus, StatusId};

/// A row from the `sim_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SimJob {
    pub id: DbId,
    pub roster_member_id: DbId,
    pub status_id: StatusId,
    pub result_url: Option<String>,
    /// Set only when the job failed.
    pub error_message: Option<String>,
    /// Last diagnostic observed while extracting the numeric result.
    pub extraction_note: Option<String>,
    pub retry_of_job_id: Option<DbId>,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SimJob {
    pub fn status(&self) -> Option<SimJobStatus> {
        SimJobStatus::from_id(self.status_id)
    }
}

/// Query parameters for listing jobs.
#[derive(Debug, Default, Deserialize)]
pub struct SimJobListQuery {
    /// Filter by status ID (1 = pending, 4 = failed).
    pub status_id: Option<StatusId>,
    /// Filter by roster member.
    pub roster_member_id: Option<DbId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
