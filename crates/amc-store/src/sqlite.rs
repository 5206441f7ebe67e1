//! SQLite-backed `OpsStore` implementation with durable persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use amc_core::parse_timestamp_lenient;
use amc_entity::{
    Account, AmcInstance, ExecutionStatus, RecentExecutionRow, Workflow, WorkflowExecution,
    WorkflowSchedule,
};

use crate::{OpsStore, OpsStoreError, StoreResult};

/// Persistent SQLite store backend used by the console server.
#[derive(Debug)]
pub struct SqliteOpsStore {
    db_path: PathBuf,
}

impl SqliteOpsStore {
    /// Creates a SQLite-backed store at `path`, creating schema if needed.
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        Ok(store)
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> StoreResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                account_id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts (owner_user_id);

            CREATE TABLE IF NOT EXISTS instances (
                instance_id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                status TEXT NOT NULL,
                name TEXT NULL,
                FOREIGN KEY(account_id) REFERENCES accounts(account_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_instances_account ON instances (account_id);

            CREATE TABLE IF NOT EXISTS workflows (
                workflow_id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL,
                instance_id TEXT NOT NULL,
                name TEXT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workflows_owner ON workflows (owner_user_id);

            CREATE TABLE IF NOT EXISTS executions (
                id TEXT PRIMARY KEY,
                execution_id TEXT NOT NULL,
                workflow_id TEXT NOT NULL,
                owner_user_id TEXT NOT NULL,
                status TEXT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_executions_owner_started
                ON executions (owner_user_id, started_at);

            CREATE TABLE IF NOT EXISTS schedules (
                schedule_id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                owner_user_id TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                last_run_at TEXT NULL,
                next_run_at TEXT NULL,
                consecutive_failures INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_schedules_owner ON schedules (owner_user_id);
            "#,
        )?;
        Ok(())
    }

    fn insert_unique(
        &self,
        connection: &Connection,
        entity: &'static str,
        table: &str,
        id_column: &str,
        id: &str,
    ) -> StoreResult<()> {
        let exists = connection
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE {id_column} = ?1"),
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(OpsStoreError::RowAlreadyExists {
                entity,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OpsStore for SqliteOpsStore {
    async fn list_accounts(&self, owner_user_id: &str) -> StoreResult<Vec<Account>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT account_id, owner_user_id FROM accounts WHERE owner_user_id = ?1 \
             ORDER BY account_id",
        )?;
        let rows = statement
            .query_map(params![owner_user_id], |row| {
                Ok(Account {
                    id: row.get(0)?,
                    owner_user_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn list_instances_for_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AmcInstance>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let connection = self.open_connection()?;
        let placeholders = vec!["?"; account_ids.len()].join(", ");
        let mut statement = connection.prepare(&format!(
            "SELECT instance_id, account_id, status, name FROM instances \
             WHERE account_id IN ({placeholders}) ORDER BY instance_id"
        ))?;
        let rows = statement
            .query_map(params_from_iter(account_ids.iter()), |row| {
                Ok(AmcInstance {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    status: row.get(2)?,
                    name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn count_workflows(&self, owner_user_id: &str) -> StoreResult<u64> {
        let connection = self.open_connection()?;
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM workflows WHERE owner_user_id = ?1",
            params![owner_user_id],
            |row| row.get(0),
        )?;
        i64_to_u64("workflow_count", count)
    }

    async fn list_executions_started_since(
        &self,
        owner_user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<WorkflowExecution>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT id, execution_id, workflow_id, owner_user_id, status, started_at, \
             completed_at FROM executions \
             WHERE owner_user_id = ?1 AND started_at >= ?2 \
             ORDER BY started_at DESC",
        )?;
        let rows = statement
            .query_map(params![owner_user_id, timestamp_to_db(since)], map_execution_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(execution_from_raw).collect()
    }

    async fn list_schedules(&self, owner_user_id: &str) -> StoreResult<Vec<WorkflowSchedule>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT schedule_id, workflow_id, owner_user_id, is_active, last_run_at, \
             next_run_at, consecutive_failures FROM schedules \
             WHERE owner_user_id = ?1 ORDER BY schedule_id",
        )?;
        let rows = statement
            .query_map(params![owner_user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, workflow_id, owner_user_id, is_active, last_run_at, next_run_at, failures)| {
                    Ok(WorkflowSchedule {
                        id,
                        workflow_id,
                        owner_user_id,
                        is_active: is_active != 0,
                        last_run_at: lenient_timestamp_from_db(last_run_at),
                        next_run_at: lenient_timestamp_from_db(next_run_at),
                        consecutive_failures: i64_to_u32("consecutive_failures", failures)?,
                    })
                },
            )
            .collect()
    }

    async fn list_recent_executions(
        &self,
        owner_user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<RecentExecutionRow>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT e.id, e.execution_id, e.workflow_id, e.owner_user_id, e.status, \
             e.started_at, e.completed_at, w.name, i.name \
             FROM executions e \
             LEFT JOIN workflows w ON w.workflow_id = e.workflow_id \
             LEFT JOIN instances i ON i.instance_id = w.instance_id \
             WHERE e.owner_user_id = ?1 \
             ORDER BY e.started_at DESC \
             LIMIT ?2",
        )?;
        let rows = statement
            .query_map(params![owner_user_id, limit as i64], |row| {
                Ok((
                    (
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                    ),
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(raw, workflow_name, instance_name)| {
                Ok(RecentExecutionRow {
                    execution: execution_from_raw(raw)?,
                    workflow_name,
                    instance_name,
                })
            })
            .collect()
    }

    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        let connection = self.open_connection()?;
        self.insert_unique(&connection, "account", "accounts", "account_id", &account.id)?;
        connection.execute(
            "INSERT INTO accounts (account_id, owner_user_id) VALUES (?1, ?2)",
            params![account.id, account.owner_user_id],
        )?;
        Ok(())
    }

    async fn insert_instance(&self, instance: AmcInstance) -> StoreResult<()> {
        let connection = self.open_connection()?;
        self.insert_unique(
            &connection,
            "instance",
            "instances",
            "instance_id",
            &instance.id,
        )?;
        connection.execute(
            "INSERT INTO instances (instance_id, account_id, status, name) \
             VALUES (?1, ?2, ?3, ?4)",
            params![instance.id, instance.account_id, instance.status, instance.name],
        )?;
        Ok(())
    }

    async fn insert_workflow(&self, workflow: Workflow) -> StoreResult<()> {
        let connection = self.open_connection()?;
        self.insert_unique(
            &connection,
            "workflow",
            "workflows",
            "workflow_id",
            &workflow.id,
        )?;
        connection.execute(
            "INSERT INTO workflows (workflow_id, owner_user_id, instance_id, name) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                workflow.id,
                workflow.owner_user_id,
                workflow.instance_id,
                workflow.name
            ],
        )?;
        Ok(())
    }

    async fn insert_execution(&self, execution: WorkflowExecution) -> StoreResult<()> {
        let connection = self.open_connection()?;
        self.insert_unique(&connection, "execution", "executions", "id", &execution.id)?;
        connection.execute(
            "INSERT INTO executions (id, execution_id, workflow_id, owner_user_id, status, \
             started_at, completed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                execution.id,
                execution.execution_id,
                execution.workflow_id,
                execution.owner_user_id,
                execution.status.as_str(),
                timestamp_to_db(execution.started_at),
                option_timestamp_to_db(execution.completed_at),
            ],
        )?;
        Ok(())
    }

    async fn insert_schedule(&self, schedule: WorkflowSchedule) -> StoreResult<()> {
        let connection = self.open_connection()?;
        self.insert_unique(
            &connection,
            "schedule",
            "schedules",
            "schedule_id",
            &schedule.id,
        )?;
        connection.execute(
            "INSERT INTO schedules (schedule_id, workflow_id, owner_user_id, is_active, \
             last_run_at, next_run_at, consecutive_failures) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                schedule.id,
                schedule.workflow_id,
                schedule.owner_user_id,
                i64::from(schedule.is_active),
                option_timestamp_to_db(schedule.last_run_at),
                option_timestamp_to_db(schedule.next_run_at),
                i64::from(schedule.consecutive_failures),
            ],
        )?;
        Ok(())
    }
}

type RawExecutionRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
);

fn map_execution_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawExecutionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn execution_from_raw(raw: RawExecutionRow) -> StoreResult<WorkflowExecution> {
    let (id, execution_id, workflow_id, owner_user_id, status, started_at, completed_at) = raw;
    Ok(WorkflowExecution {
        id,
        execution_id,
        workflow_id,
        owner_user_id,
        status: ExecutionStatus::parse_lenient(status.as_deref()),
        started_at: required_timestamp_from_db("started_at", started_at)?,
        completed_at: lenient_timestamp_from_db(completed_at),
    })
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn option_timestamp_to_db(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(timestamp_to_db)
}

fn required_timestamp_from_db(field: &'static str, value: String) -> StoreResult<DateTime<Utc>> {
    parse_timestamp_lenient(&value).ok_or(OpsStoreError::InvalidPersistedValue { field, value })
}

/// Nullable timestamps classify leniently: a malformed stored value reads as
/// absent rather than failing the whole fetch.
fn lenient_timestamp_from_db(value: Option<String>) -> Option<DateTime<Utc>> {
    value.as_deref().and_then(parse_timestamp_lenient)
}

fn i64_to_u32(field: &'static str, value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| OpsStoreError::InvalidPersistedValue {
        field,
        value: value.to_string(),
    })
}

fn i64_to_u64(field: &'static str, value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| OpsStoreError::InvalidPersistedValue {
        field,
        value: value.to_string(),
    })
}
