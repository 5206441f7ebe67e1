//! End-to-end dashboard aggregation over a durable SQLite store.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use amc_dashboard::{compute_dashboard_snapshot, DashboardSnapshot};
use amc_entity::{
    Account, AmcInstance, ExecutionStatus, Workflow, WorkflowExecution, WorkflowSchedule,
};
use amc_store::{OpsStore, SqliteOpsStore};

fn open_store(root: &Path) -> SqliteOpsStore {
    SqliteOpsStore::new(root.join("console.sqlite")).expect("open sqlite store")
}

async fn seed_operator_data(store: &SqliteOpsStore, owner: &str, now: DateTime<Utc>) {
    store
        .insert_account(Account::new(format!("acct-{owner}"), owner))
        .await
        .expect("insert account");
    store
        .insert_instance(
            AmcInstance::new(format!("inst-{owner}"), format!("acct-{owner}"), "active")
                .with_name("US Retail"),
        )
        .await
        .expect("insert instance");
    store
        .insert_workflow(
            Workflow::new(format!("wf-{owner}"), owner, format!("inst-{owner}"))
                .with_name("Path To Conversion"),
        )
        .await
        .expect("insert workflow");
    store
        .insert_execution(WorkflowExecution {
            id: format!("exec-{owner}-1"),
            execution_id: format!("amc-exec-{owner}-1"),
            workflow_id: format!("wf-{owner}"),
            owner_user_id: owner.to_string(),
            status: ExecutionStatus::Completed,
            started_at: now - Duration::hours(1),
            completed_at: Some(now - Duration::minutes(15)),
        })
        .await
        .expect("insert execution");
    store
        .insert_execution(WorkflowExecution {
            id: format!("exec-{owner}-2"),
            execution_id: format!("amc-exec-{owner}-2"),
            workflow_id: format!("wf-{owner}"),
            owner_user_id: owner.to_string(),
            status: ExecutionStatus::Failed,
            started_at: now - Duration::days(2),
            completed_at: None,
        })
        .await
        .expect("insert execution");
    store
        .insert_schedule(WorkflowSchedule {
            id: format!("sched-{owner}-due"),
            workflow_id: format!("wf-{owner}"),
            owner_user_id: owner.to_string(),
            is_active: true,
            last_run_at: Some(now - Duration::days(1)),
            next_run_at: Some(now + Duration::hours(3)),
            consecutive_failures: 5,
        })
        .await
        .expect("insert schedule");
    store
        .insert_schedule(WorkflowSchedule {
            id: format!("sched-{owner}-idle"),
            workflow_id: format!("wf-{owner}"),
            owner_user_id: owner.to_string(),
            is_active: false,
            last_run_at: None,
            next_run_at: Some(now + Duration::hours(3)),
            consecutive_failures: 0,
        })
        .await
        .expect("insert schedule");
}

#[tokio::test]
async fn integration_snapshot_aggregates_durable_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let now = Utc::now();
    seed_operator_data(&store, "user-a", now).await;

    let snapshot = compute_dashboard_snapshot(&store, "user-a", now)
        .await
        .expect("compute snapshot");

    assert_eq!(snapshot.total_instances, 1);
    assert_eq!(snapshot.active_instances, 1);
    assert_eq!(snapshot.total_workflows, 1);
    assert_eq!(snapshot.executions.total_7d, 2);
    assert_eq!(snapshot.executions.total_24h, 1);
    assert_eq!(snapshot.executions.success_rate, 50.0);
    assert_eq!(snapshot.executions.status_breakdown.succeeded, 1);
    assert_eq!(snapshot.executions.status_breakdown.failed, 1);

    // The active schedule counts everywhere it qualifies; the inactive one
    // only in `total`.
    assert_eq!(snapshot.schedules.total, 2);
    assert_eq!(snapshot.schedules.active, 1);
    assert_eq!(snapshot.schedules.failing, 1);
    assert_eq!(snapshot.schedules.upcoming_24h, 1);

    assert_eq!(snapshot.recent_activity.len(), 2);
    assert_eq!(snapshot.recent_activity[0].execution_id, "amc-exec-user-a-1");
    assert_eq!(snapshot.recent_activity[0].workflow_name, "Path To Conversion");
    assert_eq!(snapshot.recent_activity[0].instance_name, "US Retail");
    assert_eq!(snapshot.recent_activity[0].status, "COMPLETED");
}

#[tokio::test]
async fn integration_snapshot_isolates_operators_sharing_one_store() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let now = Utc::now();
    seed_operator_data(&store, "user-a", now).await;
    seed_operator_data(&store, "user-b", now).await;

    let snapshot_a = compute_dashboard_snapshot(&store, "user-a", now)
        .await
        .expect("compute snapshot for user-a");
    assert_eq!(snapshot_a.total_workflows, 1);
    assert_eq!(snapshot_a.executions.total_7d, 2);
    assert!(snapshot_a
        .recent_activity
        .iter()
        .all(|entry| entry.execution_id.contains("user-a")));

    let snapshot_stranger = compute_dashboard_snapshot(&store, "user-c", now)
        .await
        .expect("compute snapshot for unknown user");
    assert_eq!(snapshot_stranger, DashboardSnapshot::zero());
}

#[tokio::test]
async fn integration_empty_store_matches_the_zero_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path());

    let snapshot = compute_dashboard_snapshot(&store, "user-new", Utc::now())
        .await
        .expect("compute snapshot");
    assert_eq!(snapshot, DashboardSnapshot::zero());
}

#[tokio::test]
async fn integration_malformed_next_run_at_only_drops_the_upcoming_classification() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let now = Utc::now();
    seed_operator_data(&store, "user-a", now).await;

    let connection = rusqlite::Connection::open(temp.path().join("console.sqlite"))
        .expect("open raw connection");
    connection
        .execute(
            "INSERT INTO schedules (schedule_id, workflow_id, owner_user_id, is_active, \
             last_run_at, next_run_at, consecutive_failures) \
             VALUES ('sched-bad-clock', 'wf-user-a', 'user-a', 1, NULL, 'soon-ish', 0)",
            [],
        )
        .expect("insert malformed schedule");

    let snapshot = compute_dashboard_snapshot(&store, "user-a", now)
        .await
        .expect("compute snapshot");
    // The malformed row still counts as a schedule, and as active, but never
    // as upcoming.
    assert_eq!(snapshot.schedules.total, 3);
    assert_eq!(snapshot.schedules.active, 2);
    assert_eq!(snapshot.schedules.upcoming_24h, 1);
}
