use serde::Serialize;

use amc_entity::WorkflowSchedule;

use crate::windows::RollingWindows;

/// A schedule counts as failing once it has failed more than this many times
/// in a row, independent of whether it is still active.
pub const SCHEDULE_FAILING_THRESHOLD: u32 = 2;

/// Health indicators derived from a user's schedule rows.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleHealth {
    pub total: u64,
    pub active: u64,
    pub failing: u64,
    pub upcoming_24h: u64,
}

/// Classifies all schedule rows owned by the user (no time filter on input).
///
/// `upcoming_24h` counts active schedules whose next run falls inside
/// `[now, tomorrow]`, both ends inclusive; a schedule whose stored next-run
/// timestamp failed to parse arrives here as `None` and is excluded.
pub fn evaluate_schedule_health(
    schedules: &[WorkflowSchedule],
    windows: &RollingWindows,
) -> ScheduleHealth {
    let mut health = ScheduleHealth {
        total: schedules.len() as u64,
        ..ScheduleHealth::default()
    };

    for schedule in schedules {
        if schedule.is_active {
            health.active += 1;
        }
        if schedule.consecutive_failures > SCHEDULE_FAILING_THRESHOLD {
            health.failing += 1;
        }
        let due_within_24h = schedule
            .next_run_at
            .is_some_and(|next_run| next_run >= windows.now && next_run <= windows.tomorrow);
        if schedule.is_active && due_within_24h {
            health.upcoming_24h += 1;
        }
    }

    health
}
