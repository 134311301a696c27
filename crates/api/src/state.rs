use std::sync::Arc;

use raidsim_core::access::AccessPolicy;
use raidsim_simbot::extractor::ResultExtractor;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub pool: raidsim_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Decides who counts as a privileged caller.
    pub policy: Arc<dyn AccessPolicy>,
    /// Used by the Completion Gateway to read finished reports.
    pub extractor: Arc<dyn ResultExtractor>,
}
