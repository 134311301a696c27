//! Roster member entity. The pipeline reads identity fields and writes back
//! the cached simulation stats.

use raidsim_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `roster_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RosterMember {
    pub id: DbId,
    pub name: String,
    pub realm: String,
    pub region: String,
    pub last_dps: Option<f64>,
    pub last_item_level: Option<f64>,
    pub last_sim_link: Option<String>,
    pub last_sim_at: Option<Timestamp>,
    pub last_sim_job_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a roster member.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRosterMember {
    pub name: String,
    pub realm: String,
    /// Defaults to `us` if omitted.
    pub region: Option<String>,
}

/// The identity needed to build an automation request.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub name: String,
    pub realm: String,
    pub region: String,
}

/// Derived numbers written back after a successful extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimStats {
    pub dps: f64,
    pub item_level: Option<f64>,
}
