use chrono::{DateTime, Utc};
use serde::Serialize;

use amc_entity::RecentExecutionRow;

/// Maximum number of entries surfaced in the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

const UNKNOWN_NAME: &str = "Unknown";

/// Display projection of one recent execution.
///
/// Names are never null or blank: a missing join target renders as
/// "Unknown" so the feed stays renderable with partially joined data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub execution_id: String,
    pub workflow_name: String,
    pub instance_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Projects the pre-joined recent rows (newest first) into feed entries.
pub fn build_activity_feed(rows: &[RecentExecutionRow]) -> Vec<ActivityEntry> {
    rows.iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|row| ActivityEntry {
            execution_id: row.execution.execution_id.clone(),
            workflow_name: display_name(row.workflow_name.as_deref()),
            instance_name: display_name(row.instance_name.as_deref()),
            status: row.execution.status.as_str().to_ascii_uppercase(),
            started_at: row.execution.started_at,
            completed_at: row.execution.completed_at,
        })
        .collect()
}

fn display_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}
