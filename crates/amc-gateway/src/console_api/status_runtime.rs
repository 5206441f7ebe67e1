//! Console self-status report endpoint.
use super::*;

const CONSOLE_STATUS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ConsoleStatusReport {
    schema_version: u32,
    generated_unix_ms: u64,
    started_unix_ms: u64,
    uptime_ms: u64,
    auth: ConsoleAuthStatusReport,
}

/// `GET /console/status`.
pub(super) async fn handle_console_status(
    State(state): State<Arc<ConsoleServerState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = authorize_console_request(&state, &headers) {
        return error.into_response();
    }
    let generated_unix_ms = current_unix_timestamp_ms();
    let report = ConsoleStatusReport {
        schema_version: CONSOLE_STATUS_SCHEMA_VERSION,
        generated_unix_ms,
        started_unix_ms: state.started_unix_ms,
        uptime_ms: generated_unix_ms.saturating_sub(state.started_unix_ms),
        auth: collect_console_auth_status_report(&state),
    };
    (StatusCode::OK, Json(report)).into_response()
}
