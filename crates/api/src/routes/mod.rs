pub mod health;
pub mod roster;
pub mod sim_jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /roster/{id}/sim                                  enqueue (POST)
///
/// /sim-jobs                                         list (GET), purge (DELETE)
/// /sim-jobs/messages                                inbound completion message (POST)
/// /sim-jobs/{id}                                    get (GET), delete (DELETE)
/// /sim-jobs/{id}/retry                              re-enqueue failed job (POST)
/// /sim-jobs/{id}/fail                               mark running job failed (POST)
/// /sim-jobs/{id}/complete                           manual completion (POST)
/// ```
///
/// Every route requires a privileged caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/roster", roster::router())
        .nest("/sim-jobs", sim_jobs::router())
}
