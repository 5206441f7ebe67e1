use chrono::{DateTime, Duration, Utc};

/// Rolling-window boundaries anchored to one reference instant.
///
/// Every downstream filter and classification uses these three boundaries;
/// no other lookback window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindows {
    pub now: DateTime<Utc>,
    pub seven_days_ago: DateTime<Utc>,
    pub twenty_four_hours_ago: DateTime<Utc>,
    pub tomorrow: DateTime<Utc>,
}

impl RollingWindows {
    /// Computes the boundary set for `now`. Pure and deterministic.
    pub fn anchored_at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            seven_days_ago: now - Duration::days(7),
            twenty_four_hours_ago: now - Duration::hours(24),
            tomorrow: now + Duration::hours(24),
        }
    }
}
