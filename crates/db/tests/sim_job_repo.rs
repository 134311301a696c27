//! Integration tests for the simulation job store.
//!
//! Exercises the queue contract against a real database: enqueue, the
//! atomic oldest-first claim, terminal transitions, purge and retry.

use raidsim_db::models::roster::CreateRosterMember;
use raidsim_db::models::sim_job::SimJobListQuery;
use raidsim_db::models::status::SimJobStatus;
use raidsim_db::repositories::{RosterRepo, SimJobRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_member(pool: &PgPool, name: &str) -> i64 {
    let input = CreateRosterMember {
        name: name.to_string(),
        realm: "Mal'Ganis".to_string(),
        region: None,
    };
    RosterRepo::create(pool, &input)
        .await
        .expect("roster member creation should succeed")
        .id
}

// ---------------------------------------------------------------------------
// Enqueue / claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_creates_pending_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;

    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();

    assert_eq!(job.roster_member_id, member);
    assert_eq!(job.status(), Some(SimJobStatus::Pending));
    assert!(job.result_url.is_none());
    assert!(job.error_message.is_none());
    assert!(job.claimed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_returns_oldest_pending_first(pool: PgPool) {
    let a = new_member(&pool, "Alpha").await;
    let b = new_member(&pool, "Bravo").await;
    let first = SimJobRepo::enqueue(&pool, a).await.unwrap();
    let second = SimJobRepo::enqueue(&pool, b).await.unwrap();

    let claimed = SimJobRepo::claim_oldest_pending(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, first.id);
    assert_eq!(claimed.status(), Some(SimJobStatus::Running));
    assert!(claimed.claimed_at.is_some());
    assert!(claimed.updated_at >= first.updated_at);

    let next = SimJobRepo::claim_oldest_pending(&pool).await.unwrap().unwrap();
    assert_eq!(next.id, second.id);

    assert!(SimJobRepo::claim_oldest_pending(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn running_job_is_never_claimed_twice(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    SimJobRepo::enqueue(&pool, member).await.unwrap();

    let (a, b) = tokio::join!(
        SimJobRepo::claim_oldest_pending(&pool),
        SimJobRepo::claim_oldest_pending(&pool),
    );
    let claimed: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();
    assert_eq!(claimed.len(), 1, "exactly one claim may win");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_on_empty_queue_returns_none(pool: PgPool) {
    assert!(SimJobRepo::claim_oldest_pending(&pool).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Terminal transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_running_job_stores_url(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();

    let url = "https://www.raidbots.com/simbot/report/abc123";
    let done = SimJobRepo::complete(&pool, job.id, url, Some("DPS Found: 1250000"))
        .await
        .unwrap()
        .expect("running job should complete");

    assert_eq!(done.status(), Some(SimJobStatus::Completed));
    assert_eq!(done.result_url.as_deref(), Some(url));
    assert_eq!(done.extraction_note.as_deref(), Some("DPS Found: 1250000"));
    assert!(done.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_is_idempotent(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    let url = "https://www.raidbots.com/simbot/report/abc123";

    let first = SimJobRepo::complete(&pool, job.id, url, None).await.unwrap().unwrap();
    let second = SimJobRepo::complete(&pool, job.id, url, None).await.unwrap().unwrap();

    assert_eq!(first.status(), Some(SimJobStatus::Completed));
    assert_eq!(second.status(), Some(SimJobStatus::Completed));
    assert_eq!(first.result_url, second.result_url);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_job_can_be_completed_by_hand(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    SimJobRepo::fail(&pool, job.id, "Run button not found").await.unwrap();

    let done = SimJobRepo::complete(&pool, job.id, "https://x/simbot/report/a", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(done.status(), Some(SimJobStatus::Completed));
    assert_eq!(done.result_url.as_deref(), Some("https://x/simbot/report/a"));
    assert!(done.error_message.is_none());
    assert!(done.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fail_records_reason_only_for_running_jobs(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();

    // Pending jobs cannot fail directly.
    assert!(SimJobRepo::fail(&pool, job.id, "nope").await.unwrap().is_none());

    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let failed = SimJobRepo::fail(&pool, job.id, "Timed out after 300s")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status(), Some(SimJobStatus::Failed));
    assert_eq!(failed.error_message.as_deref(), Some("Timed out after 300s"));

    // Terminal: a second fail matches nothing.
    assert!(SimJobRepo::fail(&pool, job.id, "again").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Purge / delete / retry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_keeps_running_jobs(pool: PgPool) {
    let a = new_member(&pool, "Alpha").await;
    let b = new_member(&pool, "Bravo").await;
    let c = new_member(&pool, "Charlie").await;

    let running = SimJobRepo::enqueue(&pool, a).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    SimJobRepo::enqueue(&pool, b).await.unwrap();
    let done = SimJobRepo::enqueue(&pool, c).await.unwrap();
    SimJobRepo::complete(&pool, done.id, "https://x/simbot/report/z", None)
        .await
        .unwrap();

    let removed = SimJobRepo::purge_all_except_running(&pool).await.unwrap();
    assert_eq!(removed, 2);

    let remaining = SimJobRepo::list(&pool, &SimJobListQuery::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, running.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_refuses_running_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();

    assert!(!SimJobRepo::delete(&pool, job.id).await.unwrap());
    assert!(SimJobRepo::find_by_id(&pool, job.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_only_applies_to_failed_jobs(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();

    assert!(SimJobRepo::retry(&pool, job.id).await.unwrap().is_none());

    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    SimJobRepo::fail(&pool, job.id, "Run button not found").await.unwrap();

    let retried = SimJobRepo::retry(&pool, job.id).await.unwrap().unwrap();
    assert_ne!(retried.id, job.id);
    assert_eq!(retried.roster_member_id, member);
    assert_eq!(retried.retry_of_job_id, Some(job.id));
    assert_eq!(retried.status(), Some(SimJobStatus::Pending));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn active_job_detection(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    assert!(!SimJobRepo::has_active_for_subject(&pool, member).await.unwrap());

    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    assert!(SimJobRepo::has_active_for_subject(&pool, member).await.unwrap());

    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    assert!(SimJobRepo::has_active_for_subject(&pool, member).await.unwrap());

    SimJobRepo::fail(&pool, job.id, "boom").await.unwrap();
    assert!(!SimJobRepo::has_active_for_subject(&pool, member).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let a = new_member(&pool, "Alpha").await;
    let b = new_member(&pool, "Bravo").await;
    SimJobRepo::enqueue(&pool, a).await.unwrap();
    SimJobRepo::enqueue(&pool, b).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();

    let pending = SimJobRepo::list(
        &pool,
        &SimJobListQuery {
            status_id: Some(SimJobStatus::Pending.id()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].roster_member_id, b);
}
