use serde::Serialize;

use amc_entity::{ExecutionStatus, WorkflowExecution};

use crate::windows::RollingWindows;

/// Execution counts bucketed by classified status.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub succeeded: u64,
    pub failed: u64,
    pub running: u64,
    pub pending: u64,
}

impl StatusBreakdown {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.running + self.pending
    }
}

/// Rolling-window execution summary for one user.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total_7d: u64,
    pub total_24h: u64,
    pub success_rate: f64,
    pub status_breakdown: StatusBreakdown,
}

/// Summarizes execution rows already filtered upstream to the 7-day window.
///
/// The summarizer only classifies; it never re-filters by the 7-day
/// boundary. The success rate considers finished runs only and is defined
/// as 0 when none have finished.
pub fn summarize_executions(
    executions: &[WorkflowExecution],
    windows: &RollingWindows,
) -> ExecutionSummary {
    let mut breakdown = StatusBreakdown::default();
    let mut total_24h = 0u64;

    for execution in executions {
        match execution.status {
            ExecutionStatus::Completed => breakdown.succeeded += 1,
            ExecutionStatus::Failed => breakdown.failed += 1,
            ExecutionStatus::Running => breakdown.running += 1,
            ExecutionStatus::Pending => breakdown.pending += 1,
        }
        if execution.started_at >= windows.twenty_four_hours_ago {
            total_24h += 1;
        }
    }

    ExecutionSummary {
        total_7d: executions.len() as u64,
        total_24h,
        success_rate: success_rate_percent(breakdown.succeeded, breakdown.failed),
        status_breakdown: breakdown,
    }
}

/// Success percentage over finished runs, rounded to one decimal place.
fn success_rate_percent(succeeded: u64, failed: u64) -> f64 {
    let finished = succeeded + failed;
    if finished == 0 {
        return 0.0;
    }
    ((succeeded as f64 / finished as f64) * 1000.0).round() / 10.0
}
