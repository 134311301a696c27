//! Repository for the `roster_members` table.
//!
//! Only the operations the simulation pipeline needs: identity reads and the
//! single-statement stats write-back. Creation exists for seeding and tests.

use raidsim_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::roster::{CreateRosterMember, RosterMember, SimStats, SubjectIdentity};

/// Column list for `roster_members` queries.
const COLUMNS: &str = "\
    id, name, realm, region, last_dps, last_item_level, last_sim_link, \
    last_sim_at, last_sim_job_id, created_at, updated_at";

/// Region used when none is supplied.
const DEFAULT_REGION: &str = "us";

pub struct RosterRepo;

impl RosterRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateRosterMember,
    ) -> Result<RosterMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO roster_members (name, realm, region) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RosterMember>(&query)
            .bind(&input.name)
            .bind(&input.realm)
            .bind(input.region.as_deref().unwrap_or(DEFAULT_REGION))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RosterMember>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roster_members WHERE id = $1");
        sqlx::query_as::<_, RosterMember>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read the `{name, realm, region}` needed to drive a simulation.
    pub async fn find_identity(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubjectIdentity>, sqlx::Error> {
        sqlx::query_as::<_, SubjectIdentity>(
            "SELECT name, realm, region FROM roster_members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Write back the outcome of a finished simulation in one statement.
    ///
    /// Link, timestamp and source job always move together. Throughput and
    /// gear score are replaced only when `stats` is present; otherwise the
    /// previous numbers stay. The row is skipped when a later job has
    /// already written its result (`last_sim_job_id > job_id`), so a stale
    /// completion cannot overwrite a newer one. Re-applying the same job is
    /// allowed and leaves the numbers unchanged.
    ///
    /// Returns `true` if the row was updated.
    pub async fn record_simulation<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        job_id: DbId,
        result_url: &str,
        stats: Option<SimStats>,
    ) -> Result<bool, sqlx::Error> {
        let (dps, item_level, has_stats) = match stats {
            Some(s) => (Some(s.dps), s.item_level, true),
            None => (None, None, false),
        };

        let result = sqlx::query(
            "UPDATE roster_members \
             SET last_sim_link = $3, last_sim_at = NOW(), last_sim_job_id = $2, \
                 last_dps = CASE WHEN $6 THEN $4 ELSE last_dps END, \
                 last_item_level = CASE WHEN $6 THEN $5 ELSE last_item_level END, \
                 updated_at = NOW() \
             WHERE id = $1 AND (last_sim_job_id IS NULL OR last_sim_job_id <= $2)",
        )
        .bind(id)
        .bind(job_id)
        .bind(result_url)
        .bind(dps)
        .bind(item_level)
        .bind(has_stats)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
