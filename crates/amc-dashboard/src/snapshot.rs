use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use amc_store::{OpsStore, OpsStoreError};

use crate::activity_feed::{build_activity_feed, ActivityEntry, RECENT_ACTIVITY_LIMIT};
use crate::execution_summary::{summarize_executions, ExecutionSummary};
use crate::schedule_health::{evaluate_schedule_health, ScheduleHealth};
use crate::windows::RollingWindows;

/// The store fetch that failed, for degrade logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    Accounts,
    Instances,
    WorkflowCount,
    Executions,
    Schedules,
    RecentActivity,
}

impl FetchStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Instances => "instances",
            Self::WorkflowCount => "workflow_count",
            Self::Executions => "executions",
            Self::Schedules => "schedules",
            Self::RecentActivity => "recent_activity",
        }
    }
}

impl std::fmt::Display for FetchStep {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A snapshot computation abandoned because one of its fetches failed.
///
/// The caller decides how to render this; the console's dashboard handler
/// substitutes [`DashboardSnapshot::zero`] so the page always loads.
#[derive(Debug, Error)]
#[error("dashboard {step} fetch failed: {source}")]
pub struct DashboardAggregationError {
    pub step: FetchStep,
    #[source]
    pub source: OpsStoreError,
}

/// The aggregated operational-health response for one user.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_instances: u64,
    pub active_instances: u64,
    pub total_workflows: u64,
    pub executions: ExecutionSummary,
    pub schedules: ScheduleHealth,
    pub recent_activity: Vec<ActivityEntry>,
}

impl DashboardSnapshot {
    /// Canonical all-zero snapshot rendered whenever any upstream fetch
    /// fails. Indistinguishable from a brand-new account with no data.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Computes one consistent snapshot for `user_id`, anchored at `now`.
///
/// Accounts resolve first because the instance fetch is keyed by the account
/// id list; the remaining five fetches run concurrently and join before
/// assembly. The first failing fetch abandons the whole computation; no
/// partial snapshot ever escapes.
pub async fn compute_dashboard_snapshot(
    store: &dyn OpsStore,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot, DashboardAggregationError> {
    let windows = RollingWindows::anchored_at(now);

    let accounts = store
        .list_accounts(user_id)
        .await
        .map_err(|source| fetch_failed(FetchStep::Accounts, source))?;
    let account_ids: Vec<String> = accounts.into_iter().map(|account| account.id).collect();

    let (instances, total_workflows, executions, schedules, recent_rows) = tokio::try_join!(
        async {
            store
                .list_instances_for_accounts(&account_ids)
                .await
                .map_err(|source| fetch_failed(FetchStep::Instances, source))
        },
        async {
            store
                .count_workflows(user_id)
                .await
                .map_err(|source| fetch_failed(FetchStep::WorkflowCount, source))
        },
        async {
            store
                .list_executions_started_since(user_id, windows.seven_days_ago)
                .await
                .map_err(|source| fetch_failed(FetchStep::Executions, source))
        },
        async {
            store
                .list_schedules(user_id)
                .await
                .map_err(|source| fetch_failed(FetchStep::Schedules, source))
        },
        async {
            store
                .list_recent_executions(user_id, RECENT_ACTIVITY_LIMIT)
                .await
                .map_err(|source| fetch_failed(FetchStep::RecentActivity, source))
        },
    )?;

    let active_instances = instances
        .iter()
        .filter(|instance| instance.is_active())
        .count() as u64;

    Ok(DashboardSnapshot {
        total_instances: instances.len() as u64,
        active_instances,
        total_workflows,
        executions: summarize_executions(&executions, &windows),
        schedules: evaluate_schedule_health(&schedules, &windows),
        recent_activity: build_activity_feed(&recent_rows),
    })
}

fn fetch_failed(step: FetchStep, source: OpsStoreError) -> DashboardAggregationError {
    DashboardAggregationError { step, source }
}
