//! AuthN and rate-limit runtime helpers for the console API.
use super::*;

#[derive(Debug, Clone, Default)]
pub(super) struct ConsoleAuthRuntimeState {
    pub(super) authorized_requests: u64,
    pub(super) auth_failures: u64,
    pub(super) rate_limited_requests: u64,
    pub(super) rate_limit_buckets: BTreeMap<String, ConsoleRateLimitBucket>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct ConsoleRateLimitBucket {
    pub(super) window_started_unix_ms: u64,
    pub(super) accepted_requests: usize,
    pub(super) rejected_requests: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(super) struct ConsoleAuthStatusReport {
    mode: String,
    authorized_requests: u64,
    auth_failures: u64,
    rate_limited_requests: u64,
    rate_limit_window_seconds: u64,
    rate_limit_max_requests: usize,
}

fn bearer_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?;
    let raw = header.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn note_console_auth_failure(state: &ConsoleServerState) {
    if let Ok(mut auth_state) = state.auth_runtime.lock() {
        auth_state.auth_failures = auth_state.auth_failures.saturating_add(1);
    }
}

/// Resolves the request to the configured operator user id, or rejects it.
pub(super) fn authorize_console_request(
    state: &ConsoleServerState,
    headers: &HeaderMap,
) -> Result<String, ConsoleApiError> {
    match state.config.auth_mode {
        ConsoleAuthMode::LocalhostDev => {
            if let Ok(mut auth_state) = state.auth_runtime.lock() {
                auth_state.authorized_requests = auth_state.authorized_requests.saturating_add(1);
            }
            Ok(state.config.operator_user_id.clone())
        }
        ConsoleAuthMode::Token => {
            let expected = state
                .config
                .auth_token
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    ConsoleApiError::internal("console token auth mode is misconfigured")
                })?;
            let Some(observed) = bearer_token_from_headers(headers) else {
                note_console_auth_failure(state);
                return Err(ConsoleApiError::unauthorized());
            };
            if observed != expected {
                note_console_auth_failure(state);
                return Err(ConsoleApiError::unauthorized());
            }
            if let Ok(mut auth_state) = state.auth_runtime.lock() {
                auth_state.authorized_requests = auth_state.authorized_requests.saturating_add(1);
            }
            Ok(state.config.operator_user_id.clone())
        }
    }
}

pub(super) fn enforce_console_rate_limit(
    state: &ConsoleServerState,
    principal: &str,
) -> Result<(), ConsoleApiError> {
    let window_ms = state
        .config
        .rate_limit_window_seconds
        .saturating_mul(1000)
        .max(1);
    let max_requests = state.config.rate_limit_max_requests.max(1);
    let now_unix_ms = current_unix_timestamp_ms();
    let mut auth_state = state
        .auth_runtime
        .lock()
        .map_err(|_| ConsoleApiError::internal("console auth state lock poisoned"))?;

    let bucket = auth_state
        .rate_limit_buckets
        .entry(principal.to_string())
        .or_default();
    if bucket.window_started_unix_ms == 0
        || now_unix_ms.saturating_sub(bucket.window_started_unix_ms) >= window_ms
    {
        bucket.window_started_unix_ms = now_unix_ms;
        bucket.accepted_requests = 0;
        bucket.rejected_requests = 0;
    }
    if bucket.accepted_requests >= max_requests {
        bucket.rejected_requests = bucket.rejected_requests.saturating_add(1);
        auth_state.rate_limited_requests = auth_state.rate_limited_requests.saturating_add(1);
        return Err(ConsoleApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            format!(
                "console rate limit exceeded: max {} requests per {} seconds",
                max_requests, state.config.rate_limit_window_seconds
            ),
        ));
    }
    bucket.accepted_requests = bucket.accepted_requests.saturating_add(1);
    Ok(())
}

pub(super) fn collect_console_auth_status_report(
    state: &ConsoleServerState,
) -> ConsoleAuthStatusReport {
    let mut authorized_requests = 0u64;
    let mut auth_failures = 0u64;
    let mut rate_limited_requests = 0u64;
    if let Ok(auth_state) = state.auth_runtime.lock() {
        authorized_requests = auth_state.authorized_requests;
        auth_failures = auth_state.auth_failures;
        rate_limited_requests = auth_state.rate_limited_requests;
    }
    ConsoleAuthStatusReport {
        mode: state.config.auth_mode.as_str().to_string(),
        authorized_requests,
        auth_failures,
        rate_limited_requests,
        rate_limit_window_seconds: state.config.rate_limit_window_seconds,
        rate_limit_max_requests: state.config.rate_limit_max_requests,
    }
}
