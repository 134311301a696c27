use axum::routing::post;
use axum::Router;

use crate::handlers::sim_jobs;
use crate::state::AppState;

/// Routes mounted at `/roster`.
///
/// ```text
/// POST   /{id}/sim        -> enqueue_sim
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/sim", post(sim_jobs::enqueue_sim))
}
