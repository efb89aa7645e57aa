use super::helpers::{
    POISON, date, insert_task, insert_task_without_status, run_snapshot, snapshot_row_count,
    stored_rows, test_connection,
};
use task_state_snapshot::domain::task_state::{
    errors::TaskStateError, grouping::GroupingStrategy,
};

#[tokio::test]
async fn grouped_snapshot_matches_worked_example() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;
    insert_task(&mut conn, 4, Some("A"), Some("x")).await;
    insert_task(&mut conn, 1, Some("B"), Some("y")).await;

    let day = date("20240101");
    let returned = run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .expect("snapshot failed");
    assert_eq!(returned.len(), 2);

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 2);

    let a = &rows[0];
    assert_eq!((a.sys_name.as_str(), a.employee.as_str()), ("A", "x"));
    assert_eq!(a.datestr.as_str(), "20240101");
    assert_eq!(a.counts.total, 2);
    assert_eq!(a.counts.unfinished, 1);
    assert_eq!(a.counts.not_started, 1);
    assert_eq!(a.counts.developing, 0);
    assert_eq!(a.counts.testing, 0);
    assert_eq!(a.counts.releasable, 0);
    assert_eq!(a.counts.finished, 1);
    assert_eq!(a.counts.closed, 0);

    let b = &rows[1];
    assert_eq!((b.sys_name.as_str(), b.employee.as_str()), ("B", "y"));
    assert_eq!(b.counts.total, 1);
    assert_eq!(b.counts.unfinished, 1);
    assert_eq!(b.counts.developing, 1);
    assert_eq!(b.counts.not_started, 0);
    assert_eq!(b.counts.finished, 0);
}

#[tokio::test]
async fn rerunning_same_day_replaces_rows() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;
    insert_task(&mut conn, 5, Some("A"), Some("y")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    let first = stored_rows(&mut conn, &day).await;

    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    let second = stored_rows(&mut conn, &day).await;

    assert_eq!(first, second);
    assert_eq!(snapshot_row_count(&mut conn).await, 2);
}

#[tokio::test]
async fn rerun_picks_up_changed_tasks() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    sqlx::query("UPDATE t_task SET status = 4")
        .execute(&mut conn)
        .await
        .unwrap();
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].counts.finished, 1);
    assert_eq!(rows[0].counts.unfinished, 0);
}

#[tokio::test]
async fn null_grouping_values_are_stored_as_empty_strings() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, None, None).await;
    insert_task(&mut conn, 2, None, None).await;
    insert_task(&mut conn, 3, Some("A"), None).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].sys_name.as_str(), rows[0].employee.as_str()), ("", ""));
    assert_eq!(rows[0].counts.total, 2);
    assert_eq!(rows[0].counts.testing, 1);
    assert_eq!((rows[1].sys_name.as_str(), rows[1].employee.as_str()), ("A", ""));
    assert_eq!(rows[1].counts.releasable, 1);

    let nulls: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM t_task_state_count WHERE sys_name IS NULL OR employee IS NULL",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();
    assert_eq!(nulls, 0);
}

#[tokio::test]
async fn global_grouping_stores_a_single_row() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;
    insert_task(&mut conn, 4, Some("B"), Some("y")).await;
    insert_task(&mut conn, 5, None, None).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::Global)
        .await
        .unwrap();

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!((row.sys_name.as_str(), row.employee.as_str()), ("", ""));
    assert_eq!(row.counts.total, 3);
    assert_eq!(row.counts.unfinished, 1);
    assert_eq!(row.counts.finished, 1);
    assert_eq!(row.counts.closed, 1);
}

#[tokio::test]
async fn counts_always_partition_the_total() {
    let mut conn = test_connection().await;
    let statuses = [0, 1, 2, 3, 4, 5, 0, 1, 4, 4, 5, 3];
    for (i, status) in statuses.into_iter().enumerate() {
        let employee = if i % 2 == 0 { "x" } else { "y" };
        insert_task(&mut conn, status, Some("A"), Some(employee)).await;
    }

    let rows = run_snapshot(&mut conn, date("20240101"), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.counts.bucket_sum(), row.counts.total);
        assert_eq!(row.counts.unfinished, row.counts.open_sum());
    }
    assert_eq!(rows.iter().map(|r| r.counts.total).sum::<i64>(), 12);
}

#[tokio::test]
async fn other_dates_are_left_alone() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 1, Some("A"), Some("x")).await;

    run_snapshot(&mut conn, date("20240101"), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    run_snapshot(&mut conn, date("20240102"), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    assert_eq!(stored_rows(&mut conn, &date("20240101")).await.len(), 1);
    assert_eq!(stored_rows(&mut conn, &date("20240102")).await.len(), 1);
}

#[tokio::test]
async fn failed_insert_rolls_back_the_delete() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;
    insert_task(&mut conn, 1, Some("B"), Some("y")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    let before = stored_rows(&mut conn, &day).await;
    assert_eq!(before.len(), 2);

    insert_task(&mut conn, 2, Some(POISON), Some("z")).await;
    insert_task(&mut conn, 4, Some("A"), Some("x")).await;

    let err = run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskStateError::Query(_)), "got {err:?}");

    let after = stored_rows(&mut conn, &day).await;
    assert_eq!(after, before);
}

#[tokio::test]
async fn unknown_status_is_counted_in_total_only() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;
    insert_task(&mut conn, 1, Some("B"), Some("y")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    insert_task(&mut conn, 9, Some("A"), Some("x")).await;
    insert_task(&mut conn, 6, Some("B"), Some("y")).await;
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .expect("unknown statuses must not abort the run");

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 2);
    let a = &rows[0];
    assert_eq!(a.counts.total, 2);
    assert_eq!(a.counts.not_started, 1);
    assert_eq!(a.counts.bucket_sum(), 1);
    assert_eq!(a.counts.unfinished, 1);
    let b = &rows[1];
    assert_eq!(b.counts.total, 2);
    assert_eq!(b.counts.developing, 1);
    assert_eq!(b.counts.unfinished, 1);
}

#[tokio::test]
async fn null_status_is_counted_in_total_only() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 4, Some("A"), Some("x")).await;
    insert_task_without_status(&mut conn, Some("A"), Some("x")).await;

    let rows = run_snapshot(&mut conn, date("20240101"), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.counts.total, 2);
    assert_eq!(row.counts.finished, 1);
    assert_eq!(row.counts.bucket_sum(), 1);
    assert_eq!(row.counts.unfinished, 0);
}

#[tokio::test]
async fn null_and_empty_grouping_values_share_one_row() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, None, None).await;
    insert_task(&mut conn, 1, Some(""), Some("")).await;
    insert_task(&mut conn, 2, Some("A"), None).await;
    insert_task(&mut conn, 3, Some("A"), Some("")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .expect("rows keyed by NULL and '' must not collide");

    let rows = stored_rows(&mut conn, &day).await;
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].sys_name.as_str(), rows[0].employee.as_str()), ("", ""));
    assert_eq!(rows[0].counts.total, 2);
    assert_eq!(rows[0].counts.not_started, 1);
    assert_eq!(rows[0].counts.developing, 1);
    assert_eq!((rows[1].sys_name.as_str(), rows[1].employee.as_str()), ("A", ""));
    assert_eq!(rows[1].counts.total, 2);
}

#[tokio::test]
async fn empty_task_table_clears_grouped_snapshot() {
    let mut conn = test_connection().await;
    insert_task(&mut conn, 0, Some("A"), Some("x")).await;

    let day = date("20240101");
    run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();

    sqlx::query("DELETE FROM t_task")
        .execute(&mut conn)
        .await
        .unwrap();
    let rows = run_snapshot(&mut conn, day.clone(), GroupingStrategy::BySystemEmployee)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(stored_rows(&mut conn, &day).await.is_empty());
}
