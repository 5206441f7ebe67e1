//! Dashboard snapshot handler with the degrade-to-zero rendering branch.
use chrono::Utc;

use amc_dashboard::{compute_dashboard_snapshot, DashboardSnapshot};

use super::*;

pub(super) fn authorize_dashboard_request(
    state: &Arc<ConsoleServerState>,
    headers: &HeaderMap,
) -> Result<String, ConsoleApiError> {
    let principal = authorize_console_request(state, headers)?;
    enforce_console_rate_limit(state, principal.as_str())?;
    Ok(principal)
}

/// `GET /dashboard/stats`.
///
/// Auth and rate-limit failures surface as error statuses; the snapshot
/// computation itself never does. A failed upstream fetch is logged and the
/// canonical zero snapshot is rendered instead, so the dashboard always
/// loads with a 200.
pub(super) async fn handle_dashboard_stats(
    State(state): State<Arc<ConsoleServerState>>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authorize_dashboard_request(&state, &headers) {
        Ok(principal) => principal,
        Err(error) => return error.into_response(),
    };

    let snapshot = match compute_dashboard_snapshot(state.store.as_ref(), &user_id, Utc::now())
        .await
    {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(
                user_id = user_id.as_str(),
                step = error.step.as_str(),
                error = %error,
                "dashboard aggregation failed; rendering zero snapshot"
            );
            DashboardSnapshot::zero()
        }
    };

    (StatusCode::OK, Json(snapshot)).into_response()
}
