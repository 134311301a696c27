//! Completion Gateway: completes a job from a known finished-report URL
//! without going through the worker.
//!
//! Two entry points share [`raidsim_pipeline::finalize`]: a manual paste by
//! a privileged caller, and a message relayed from the companion browser
//! script, which is only accepted when its `Origin` belongs to the
//! simulation service's domain.

use axum::extract::{Path, State};
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use raidsim_core::error::CoreError;
use raidsim_core::origin::is_trusted_origin;
use raidsim_core::types::DbId;
use raidsim_db::models::sim_job::SimJob;
use raidsim_pipeline::{finalize, CompletionOutcome};
use raidsim_simbot::report::ReportUrl;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /sim-jobs/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteSimJob {
    pub result_url: String,
}

/// A completion message from the companion script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub job_id: DbId,
    pub url: String,
}

/// Result of a completion, successful or not at extracting numbers.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub job: SimJob,
    /// Extraction diagnostic, e.g. `DPS Found: 1250000`.
    pub message: String,
    pub dps: Option<f64>,
    pub item_level: Option<f64>,
}

impl From<CompletionOutcome> for CompletionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            job: outcome.job,
            message: outcome.message,
            dps: outcome.result.map(|r| r.mean_throughput.round()),
            item_level: outcome.result.and_then(|r| r.gear_score),
        }
    }
}

/// Whether an inbound URL is a finished-report link the extractor can read.
fn is_report_link(url: &str) -> bool {
    ReportUrl::parse(url).is_some()
}

async fn complete(
    state: &AppState,
    job_id: DbId,
    result_url: &str,
) -> AppResult<CompletionResponse> {
    let outcome = finalize(&state.pool, state.extractor.as_ref(), job_id, result_url).await?;
    Ok(outcome.into())
}

// ---------------------------------------------------------------------------
// Manual paste
// ---------------------------------------------------------------------------

/// POST /api/v1/sim-jobs/{id}/complete
///
/// Complete a job with a pasted report URL. Idempotent on completed jobs;
/// also accepts failed jobs whose run was finished by hand.
pub async fn complete_sim_job(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<CompleteSimJob>,
) -> AppResult<impl IntoResponse> {
    let result_url = input.result_url.trim();
    if result_url.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "result_url must not be empty".into(),
        )));
    }

    let response = complete(&state, job_id, result_url).await?;

    tracing::info!(
        job_id,
        user_id = user.user_id,
        message = %response.message,
        "Sim job completed via gateway",
    );

    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Inbound message
// ---------------------------------------------------------------------------

/// POST /api/v1/sim-jobs/messages
///
/// Accept `{ "jobId", "url" }` relayed from the companion script. The
/// `Origin` header must be the trusted domain (403 otherwise) and the URL
/// must point at a report (400 otherwise).
pub async fn receive_message(
    RequirePrivileged(user): RequirePrivileged,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<InboundMessage>,
) -> AppResult<impl IntoResponse> {
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !is_trusted_origin(origin, &state.config.trusted_message_domain) {
        tracing::warn!(
            job_id = message.job_id,
            origin,
            "Ignored completion message from untrusted origin",
        );
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Untrusted message origin: '{origin}'"
        ))));
    }

    let url = message.url.trim();
    if !is_report_link(url) {
        return Err(AppError::Core(CoreError::Validation(
            "url is not a simulation report link".into(),
        )));
    }

    let response = complete(&state, message.job_id, url).await?;

    tracing::info!(
        job_id = message.job_id,
        user_id = user.user_id,
        origin,
        message = %response.message,
        "Sim job completed via inbound message",
    );

    Ok(Json(DataResponse { data: response }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_links_accept_both_forms() {
        assert!(is_report_link("https://www.raidbots.com/simbot/report/abc"));
        assert!(is_report_link("https://www.raidbots.com/reports/abc/index.html"));
        assert!(!is_report_link("https://www.raidbots.com/simbot/quick"));
        assert!(!is_report_link("https://www.raidbots.com/report/abc"));
    }

    #[test]
    fn inbound_message_uses_camel_case() {
        let message: InboundMessage =
            serde_json::from_str(r#"{"jobId": 7, "url": "https://x/report/a"}"#).unwrap();
        assert_eq!(message.job_id, 7);
    }
}
