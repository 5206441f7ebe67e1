//! Console HTTP API: authenticated dashboard and status surfaces.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use amc_core::current_unix_timestamp_ms;
use amc_store::OpsStore;

mod auth_runtime;
mod dashboard_runtime;
mod server_bootstrap;
mod status_runtime;
mod types;

use auth_runtime::{
    authorize_console_request, collect_console_auth_status_report, enforce_console_rate_limit,
    ConsoleAuthRuntimeState, ConsoleAuthStatusReport,
};
use dashboard_runtime::handle_dashboard_stats;
use status_runtime::handle_console_status;
use types::ConsoleApiError;

pub use server_bootstrap::{build_console_router, run_console_server};

const DASHBOARD_STATS_ENDPOINT: &str = "/dashboard/stats";
const CONSOLE_STATUS_ENDPOINT: &str = "/console/status";

/// How inbound requests resolve to an operator identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAuthMode {
    /// No credential check; every request acts as the configured operator.
    /// Only suitable for loopback development servers.
    LocalhostDev,
    /// Requests must carry the configured static bearer token.
    Token,
}

impl ConsoleAuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalhostDev => "localhost-dev",
            Self::Token => "token",
        }
    }

    pub fn parse_flag(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "localhost-dev" => Some(Self::LocalhostDev),
            "token" => Some(Self::Token),
            _ => None,
        }
    }
}

/// Settings handed to the console server at startup.
#[derive(Debug, Clone)]
pub struct ConsoleServerConfig {
    pub bind: String,
    pub auth_mode: ConsoleAuthMode,
    pub auth_token: Option<String>,
    /// The opaque user id dashboard reads are scoped by once a request
    /// authenticates. Identity resolution itself belongs to the external
    /// auth collaborator; the console carries a single configured operator.
    pub operator_user_id: String,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_max_requests: usize,
}

/// Shared per-server state: configuration, the injected store handle, and
/// the auth/rate-limit counters.
pub struct ConsoleServerState {
    pub config: ConsoleServerConfig,
    pub store: Arc<dyn OpsStore>,
    pub(crate) auth_runtime: Mutex<ConsoleAuthRuntimeState>,
    started_unix_ms: u64,
}

impl ConsoleServerState {
    pub fn new(config: ConsoleServerConfig, store: Arc<dyn OpsStore>) -> Self {
        Self {
            config,
            store,
            auth_runtime: Mutex::new(ConsoleAuthRuntimeState::default()),
            started_unix_ms: current_unix_timestamp_ms(),
        }
    }
}
