//! Shared data types for the AMC operations console.
//!
//! Rows fetched from the entity store arrive as these explicit records;
//! status classification and timestamp defaulting happen once at the store
//! boundary, never inside the aggregation logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal or in-flight state of a workflow execution.
///
/// Stored status text is classified leniently: matching is case-insensitive
/// and anything absent or unrecognized folds into `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
    Running,
    #[default]
    Pending,
}

impl ExecutionStatus {
    /// Classifies raw stored status text; `None` and unknown values map to
    /// `Pending`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("completed") => Self::Completed,
            Some("failed") => Self::Failed,
            Some("running") => Self::Running,
            _ => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Running => "running",
            Self::Pending => "pending",
        }
    }

    /// Returns true when no further state change is expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Account grouping one or more AMC instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub owner_user_id: String,
}

impl Account {
    pub fn new(id: impl Into<String>, owner_user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_user_id: owner_user_id.into(),
        }
    }
}

/// Provisioned AMC instance. `status` is free text from the hosted store;
/// only `"active"` (case-insensitive) carries dashboard meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmcInstance {
    pub id: String,
    pub account_id: String,
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl AmcInstance {
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            status: status.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns true when the stored status marks the instance active.
    pub fn is_active(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("active")
    }
}

/// Defined analysis job bound to one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub owner_user_id: String,
    pub instance_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        owner_user_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_user_id: owner_user_id.into(),
            instance_id: instance_id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One run of a workflow. `execution_id` is the external correlation id
/// assigned by the advertising platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub execution_id: String,
    pub workflow_id: String,
    pub owner_user_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Recurring-run bookkeeping for a workflow. The console only reads these
/// counters; mutation belongs to the scheduling collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSchedule {
    pub id: String,
    pub workflow_id: String,
    pub owner_user_id: String,
    pub is_active: bool,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub consecutive_failures: u32,
}

/// Execution row pre-joined with its workflow and instance display names for
/// the activity feed. Missing join targets surface as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentExecutionRow {
    pub execution: WorkflowExecution,
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub instance_name: Option<String>,
}
