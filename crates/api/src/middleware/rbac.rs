//! Privileged-caller extractor.
//!
//! Wraps [`AuthUser`] and asks the injected access policy whether the caller
//! may operate the simulation queue.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use raidsim_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a caller the access policy considers privileged. Rejects with
/// 401 when unauthenticated and 403 otherwise.
///
/// ```ignore
/// async fn purge(RequirePrivileged(user): RequirePrivileged) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePrivileged(pub AuthUser);

impl FromRequestParts<AppState> for RequirePrivileged {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !state.policy.is_privileged(&user.caller()) {
            tracing::warn!(
                user_id = user.user_id,
                username = %user.username,
                "Unprivileged caller rejected",
            );
            return Err(AppError::Core(CoreError::Forbidden(
                "Privileged access required".into(),
            )));
        }
        Ok(RequirePrivileged(user))
    }
}
