//! Entity store abstractions and in-memory backend.
//!
//! The dashboard only ever reads pre-scoped row sets through [`OpsStore`];
//! the hosted relational store owns every entity's lifecycle. Inserts exist
//! as the data-import and test seam.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use amc_entity::{
    Account, AmcInstance, RecentExecutionRow, Workflow, WorkflowExecution, WorkflowSchedule,
};

mod sqlite;

pub use sqlite::SqliteOpsStore;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, OpsStoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum OpsStoreError {
    #[error("{entity} '{id}' already exists")]
    RowAlreadyExists { entity: &'static str, id: String },
    #[error("invalid persisted value for '{field}': {value}")]
    InvalidPersistedValue { field: &'static str, value: String },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Async read/insert contract shared by the SQLite and in-memory backends.
///
/// The six read operations are exactly the dashboard's fetch plan; every one
/// is scoped by the requesting user (directly, or through the account id
/// list resolved from that user).
#[async_trait]
pub trait OpsStore: Send + Sync {
    async fn list_accounts(&self, owner_user_id: &str) -> StoreResult<Vec<Account>>;
    async fn list_instances_for_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AmcInstance>>;
    async fn count_workflows(&self, owner_user_id: &str) -> StoreResult<u64>;
    async fn list_executions_started_since(
        &self,
        owner_user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<WorkflowExecution>>;
    async fn list_schedules(&self, owner_user_id: &str) -> StoreResult<Vec<WorkflowSchedule>>;
    /// Most recent executions for the user, newest first, joined with the
    /// owning workflow's and instance's display names.
    async fn list_recent_executions(
        &self,
        owner_user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<RecentExecutionRow>>;

    async fn insert_account(&self, account: Account) -> StoreResult<()>;
    async fn insert_instance(&self, instance: AmcInstance) -> StoreResult<()>;
    async fn insert_workflow(&self, workflow: Workflow) -> StoreResult<()>;
    async fn insert_execution(&self, execution: WorkflowExecution) -> StoreResult<()>;
    async fn insert_schedule(&self, schedule: WorkflowSchedule) -> StoreResult<()>;
}

/// In-memory implementation for tests and local experimentation.
#[derive(Debug, Default)]
pub struct InMemoryOpsStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    accounts: HashMap<String, Account>,
    instances: HashMap<String, AmcInstance>,
    workflows: HashMap<String, Workflow>,
    executions: HashMap<String, WorkflowExecution>,
    schedules: HashMap<String, WorkflowSchedule>,
}

impl InMemoryOpsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpsStore for InMemoryOpsStore {
    async fn list_accounts(&self, owner_user_id: &str) -> StoreResult<Vec<Account>> {
        let inner = self.inner.read().await;
        let mut accounts: Vec<Account> = inner
            .accounts
            .values()
            .filter(|account| account.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        accounts.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(accounts)
    }

    async fn list_instances_for_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AmcInstance>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        let mut instances: Vec<AmcInstance> = inner
            .instances
            .values()
            .filter(|instance| account_ids.contains(&instance.account_id))
            .cloned()
            .collect();
        instances.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(instances)
    }

    async fn count_workflows(&self, owner_user_id: &str) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .workflows
            .values()
            .filter(|workflow| workflow.owner_user_id == owner_user_id)
            .count() as u64)
    }

    async fn list_executions_started_since(
        &self,
        owner_user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<WorkflowExecution>> {
        let inner = self.inner.read().await;
        let mut executions: Vec<WorkflowExecution> = inner
            .executions
            .values()
            .filter(|execution| {
                execution.owner_user_id == owner_user_id && execution.started_at >= since
            })
            .cloned()
            .collect();
        executions.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        Ok(executions)
    }

    async fn list_schedules(&self, owner_user_id: &str) -> StoreResult<Vec<WorkflowSchedule>> {
        let inner = self.inner.read().await;
        let mut schedules: Vec<WorkflowSchedule> = inner
            .schedules
            .values()
            .filter(|schedule| schedule.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        schedules.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(schedules)
    }

    async fn list_recent_executions(
        &self,
        owner_user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<RecentExecutionRow>> {
        let inner = self.inner.read().await;
        let mut executions: Vec<&WorkflowExecution> = inner
            .executions
            .values()
            .filter(|execution| execution.owner_user_id == owner_user_id)
            .collect();
        executions.sort_by(|left, right| right.started_at.cmp(&left.started_at));

        let rows = executions
            .into_iter()
            .take(limit)
            .map(|execution| {
                let workflow = inner.workflows.get(&execution.workflow_id);
                let instance = workflow
                    .and_then(|workflow| inner.instances.get(&workflow.instance_id));
                RecentExecutionRow {
                    execution: execution.clone(),
                    workflow_name: workflow.and_then(|workflow| workflow.name.clone()),
                    instance_name: instance.and_then(|instance| instance.name.clone()),
                }
            })
            .collect();
        Ok(rows)
    }

    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&account.id) {
            return Err(OpsStoreError::RowAlreadyExists {
                entity: "account",
                id: account.id,
            });
        }
        inner.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn insert_instance(&self, instance: AmcInstance) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.instances.contains_key(&instance.id) {
            return Err(OpsStoreError::RowAlreadyExists {
                entity: "instance",
                id: instance.id,
            });
        }
        inner.instances.insert(instance.id.clone(), instance);
        Ok(())
    }

    async fn insert_workflow(&self, workflow: Workflow) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.workflows.contains_key(&workflow.id) {
            return Err(OpsStoreError::RowAlreadyExists {
                entity: "workflow",
                id: workflow.id,
            });
        }
        inner.workflows.insert(workflow.id.clone(), workflow);
        Ok(())
    }

    async fn insert_execution(&self, execution: WorkflowExecution) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.executions.contains_key(&execution.id) {
            return Err(OpsStoreError::RowAlreadyExists {
                entity: "execution",
                id: execution.id,
            });
        }
        inner.executions.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn insert_schedule(&self, schedule: WorkflowSchedule) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.schedules.contains_key(&schedule.id) {
            return Err(OpsStoreError::RowAlreadyExists {
                entity: "schedule",
                id: schedule.id,
            });
        }
        inner.schedules.insert(schedule.id.clone(), schedule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use amc_entity::ExecutionStatus;
    use chrono::Duration;

    use super::*;

    fn sample_execution(
        id: &str,
        owner: &str,
        workflow_id: &str,
        status: ExecutionStatus,
        started_at: DateTime<Utc>,
    ) -> WorkflowExecution {
        WorkflowExecution {
            id: id.to_string(),
            execution_id: format!("amc-{id}"),
            workflow_id: workflow_id.to_string(),
            owner_user_id: owner.to_string(),
            status,
            started_at,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn unit_in_memory_store_scopes_reads_by_owner() {
        let store = InMemoryOpsStore::new();
        store
            .insert_account(Account::new("acct-1", "user-a"))
            .await
            .expect("insert account");
        store
            .insert_account(Account::new("acct-2", "user-b"))
            .await
            .expect("insert account");

        let accounts = store.list_accounts("user-a").await.expect("list accounts");
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, "acct-1");
        assert!(store
            .list_accounts("user-c")
            .await
            .expect("list accounts")
            .is_empty());
    }

    #[tokio::test]
    async fn unit_in_memory_store_rejects_duplicate_ids() {
        let store = InMemoryOpsStore::new();
        store
            .insert_account(Account::new("acct-1", "user-a"))
            .await
            .expect("first insert");
        let error = store
            .insert_account(Account::new("acct-1", "user-a"))
            .await
            .expect_err("duplicate insert should fail");
        assert!(matches!(
            error,
            OpsStoreError::RowAlreadyExists { entity: "account", .. }
        ));
    }

    #[tokio::test]
    async fn unit_list_instances_for_accounts_returns_empty_for_empty_id_list() {
        let store = InMemoryOpsStore::new();
        store
            .insert_account(Account::new("acct-1", "user-a"))
            .await
            .expect("insert account");
        store
            .insert_instance(AmcInstance::new("inst-1", "acct-1", "active"))
            .await
            .expect("insert instance");

        let instances = store
            .list_instances_for_accounts(&[])
            .await
            .expect("list instances");
        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn functional_list_executions_started_since_applies_window_filter() {
        let store = InMemoryOpsStore::new();
        let now = Utc::now();
        store
            .insert_execution(sample_execution(
                "exec-recent",
                "user-a",
                "wf-1",
                ExecutionStatus::Completed,
                now - Duration::hours(1),
            ))
            .await
            .expect("insert recent");
        store
            .insert_execution(sample_execution(
                "exec-old",
                "user-a",
                "wf-1",
                ExecutionStatus::Failed,
                now - Duration::days(9),
            ))
            .await
            .expect("insert old");

        let executions = store
            .list_executions_started_since("user-a", now - Duration::days(7))
            .await
            .expect("list executions");
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].id, "exec-recent");
    }

    #[tokio::test]
    async fn functional_list_recent_executions_joins_names_and_caps_limit() {
        let store = InMemoryOpsStore::new();
        let now = Utc::now();
        store
            .insert_account(Account::new("acct-1", "user-a"))
            .await
            .expect("insert account");
        store
            .insert_instance(
                AmcInstance::new("inst-1", "acct-1", "active").with_name("US Retail"),
            )
            .await
            .expect("insert instance");
        store
            .insert_workflow(
                Workflow::new("wf-1", "user-a", "inst-1").with_name("Path To Conversion"),
            )
            .await
            .expect("insert workflow");
        for index in 0..12 {
            store
                .insert_execution(sample_execution(
                    &format!("exec-{index}"),
                    "user-a",
                    "wf-1",
                    ExecutionStatus::Completed,
                    now - Duration::minutes(index),
                ))
                .await
                .expect("insert execution");
        }

        let rows = store
            .list_recent_executions("user-a", 10)
            .await
            .expect("list recent");
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].execution.id, "exec-0");
        assert_eq!(rows[9].execution.id, "exec-9");
        assert_eq!(rows[0].workflow_name.as_deref(), Some("Path To Conversion"));
        assert_eq!(rows[0].instance_name.as_deref(), Some("US Retail"));
    }

    #[tokio::test]
    async fn regression_list_recent_executions_tolerates_missing_join_targets() {
        let store = InMemoryOpsStore::new();
        store
            .insert_execution(sample_execution(
                "exec-orphan",
                "user-a",
                "wf-missing",
                ExecutionStatus::Running,
                Utc::now(),
            ))
            .await
            .expect("insert orphan execution");

        let rows = store
            .list_recent_executions("user-a", 10)
            .await
            .expect("list recent");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].workflow_name.is_none());
        assert!(rows[0].instance_name.is_none());
    }
}
