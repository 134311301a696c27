//! Route definitions for the `/sim-jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{gateway, sim_jobs};
use crate::state::AppState;

/// Routes mounted at `/sim-jobs`.
///
/// ```text
/// GET    /                -> list_sim_jobs
/// DELETE /                -> purge_sim_jobs
/// POST   /messages        -> receive_message
/// GET    /{id}            -> get_sim_job
/// DELETE /{id}            -> delete_sim_job
/// POST   /{id}/retry      -> retry_sim_job
/// POST   /{id}/fail       -> fail_sim_job
/// POST   /{id}/complete   -> complete_sim_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(sim_jobs::list_sim_jobs).delete(sim_jobs::purge_sim_jobs),
        )
        .route("/messages", post(gateway::receive_message))
        .route(
            "/{id}",
            get(sim_jobs::get_sim_job).delete(sim_jobs::delete_sim_job),
        )
        .route("/{id}/retry", post(sim_jobs::retry_sim_job))
        .route("/{id}/fail", post(sim_jobs::fail_sim_job))
        .route("/{id}/complete", post(gateway::complete_sim_job))
}
