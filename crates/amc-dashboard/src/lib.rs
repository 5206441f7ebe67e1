//! Dashboard aggregation engine for the AMC operations console.
//!
//! Derives one consistent operational-health snapshot per request from the
//! entity store's pre-scoped row sets: rolling-window execution summaries,
//! schedule health classification, and the recent-activity feed. The engine
//! holds no state of its own; every snapshot is recomputed from scratch.

pub mod activity_feed;
pub mod execution_summary;
pub mod schedule_health;
pub mod snapshot;
pub mod windows;

pub use activity_feed::{build_activity_feed, ActivityEntry, RECENT_ACTIVITY_LIMIT};
pub use execution_summary::{summarize_executions, ExecutionSummary, StatusBreakdown};
pub use schedule_health::{
    evaluate_schedule_health, ScheduleHealth, SCHEDULE_FAILING_THRESHOLD,
};
pub use snapshot::{
    compute_dashboard_snapshot, DashboardAggregationError, DashboardSnapshot, FetchStep,
};
pub use windows::RollingWindows;
