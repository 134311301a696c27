//! Integration tests for queue administration endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{admin_token, body_json, delete, get, member_token, new_member, post_json, send};
use raidsim_db::models::status::SimJobStatus;
use raidsim_db::repositories::SimJobRepo;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(app, Method::GET, "/api/v1/sim-jobs", None, None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unprivileged_caller_is_forbidden(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        &format!("/api/v1/roster/{member}/sim"),
        &member_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!SimJobRepo::has_active_for_subject(&pool, member).await.unwrap());
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_creates_pending_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/roster/{member}/sim"),
        &admin_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["roster_member_id"], member);
    assert_eq!(json["data"]["status_id"], SimJobStatus::Pending.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_rejects_second_active_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    SimJobRepo::enqueue(&pool, member).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/roster/{member}/sim"),
        &admin_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_unknown_member_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/roster/9999/sim", &admin_token(), json!({})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let a = new_member(&pool, "Alpha").await;
    let b = new_member(&pool, "Bravo").await;
    SimJobRepo::enqueue(&pool, a).await.unwrap();
    SimJobRepo::enqueue(&pool, b).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let app = common::build_test_app(pool);

    let response = get(
        app,
        &format!("/api/v1/sim-jobs?status_id={}", SimJobStatus::Pending.id()),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let jobs = json["data"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["roster_member_id"], b);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_unknown_job_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/sim-jobs/4242", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "SimJob with id 4242 not found");
}

// ---------------------------------------------------------------------------
// Purge / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_keeps_running_job(pool: PgPool) {
    let a = new_member(&pool, "Alpha").await;
    let b = new_member(&pool, "Bravo").await;
    let running = SimJobRepo::enqueue(&pool, a).await.unwrap();
    SimJobRepo::enqueue(&pool, b).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let app = common::build_test_app(pool.clone());

    let response = delete(app, "/api/v1/sim-jobs", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["deleted"], 1);
    assert!(SimJobRepo::find_by_id(&pool, running.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_refuses_running_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let app = common::build_test_app(pool);

    let response = delete(app, &format!("/api/v1/sim-jobs/{}", job.id), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_pending_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    let app = common::build_test_app(pool.clone());

    let response = delete(app, &format!("/api/v1/sim-jobs/{}", job.id), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(SimJobRepo::find_by_id(&pool, job.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_unknown_job_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = delete(app, "/api/v1/sim-jobs/777", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Fail / retry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn fail_marks_running_job_failed(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/sim-jobs/{}/fail", job.id),
        &admin_token(),
        json!({ "reason": "Browser crashed" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status_id"], SimJobStatus::Failed.id());
    assert_eq!(json["data"]["error_message"], "Browser crashed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fail_without_reason_uses_default(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/sim-jobs/{}/fail", job.id),
        &admin_token(),
        json!({}),
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["data"]["error_message"], "Marked failed manually");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fail_pending_job_is_conflict(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/sim-jobs/{}/fail", job.id),
        &admin_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_requeues_failed_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    SimJobRepo::claim_oldest_pending(&pool).await.unwrap();
    SimJobRepo::fail(&pool, job.id, "Run button not found")
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/sim-jobs/{}/retry", job.id),
        &admin_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["retry_of_job_id"], job.id);
    assert_eq!(json["data"]["status_id"], SimJobStatus::Pending.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_rejects_non_failed_job(pool: PgPool) {
    let member = new_member(&pool, "Grom").await;
    let job = SimJobRepo::enqueue(&pool, member).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/sim-jobs/{}/retry", job.id),
        &admin_token(),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
