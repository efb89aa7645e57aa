use crate::{
    config::DbDriver,
    domain::{
        shared::date_key::DateKey,
        task_state::{
            entity::{GroupCounts, StatusCounts, TaskStateCount},
            errors::TaskStateError,
            grouping::GroupingStrategy,
            repository::{SnapshotFilter, TaskStateRepository},
        },
    },
    infrastructure::database::connection::{map_sqlx_error, placeholders},
};
use async_trait::async_trait;
use sqlx::{AnyConnection, Connection, Row, any::AnyRow};

pub const TASK_TABLE: &str = "t_task";
pub const SNAPSHOT_TABLE: &str = "t_task_state_count";

/// Physical name of the status-3 column in the snapshot table. The domain calls it
/// `releasable`; the deployed schema predates that name.
pub const RELEASABLE_COLUMN: &str = "fuckable";

const COUNT_COLUMNS: [&str; 8] = [
    "total",
    "unfinished",
    "not_started",
    "developing",
    "testing",
    RELEASABLE_COLUMN,
    "finished",
    "closed",
];

/// Task-state queries over one borrowed connection.
pub struct SqlxTaskStateRepository<'c> {
    conn: &'c mut AnyConnection,
    driver: DbDriver,
}

impl<'c> SqlxTaskStateRepository<'c> {
    pub fn new(conn: &'c mut AnyConnection, driver: DbDriver) -> Self {
        Self { conn, driver }
    }
}

/// Aggregation query for `grouping`. `COUNT(CASE ...)` keeps every count a 64-bit integer
/// on MySQL, Postgres and SQLite alike.
///
/// Grouping keys are coalesced to `''` before grouping so that NULL and empty values land
/// in the same snapshot row.
pub fn aggregate_sql(grouping: GroupingStrategy) -> String {
    let mut select = vec![
        "COUNT(*) AS total".to_string(),
        "COUNT(CASE WHEN status < 4 THEN 1 END) AS unfinished".to_string(),
        "COUNT(CASE WHEN status = 0 THEN 1 END) AS not_started".to_string(),
        "COUNT(CASE WHEN status = 1 THEN 1 END) AS developing".to_string(),
        "COUNT(CASE WHEN status = 2 THEN 1 END) AS testing".to_string(),
        format!("COUNT(CASE WHEN status = 3 THEN 1 END) AS {RELEASABLE_COLUMN}"),
        "COUNT(CASE WHEN status = 4 THEN 1 END) AS finished".to_string(),
        "COUNT(CASE WHEN status = 5 THEN 1 END) AS closed".to_string(),
    ];
    let keys: Vec<String> = grouping
        .columns()
        .iter()
        .map(|column| format!("COALESCE({column}, '')"))
        .collect();
    select.extend(
        keys.iter()
            .zip(grouping.columns())
            .map(|(key, column)| format!("{key} AS {column}")),
    );

    let mut sql = format!("SELECT {} FROM {}", select.join(", "), TASK_TABLE);
    if !keys.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", keys.join(", ")));
    }
    sql
}

/// Equality conditions for `filter`, numbered from `$1`, with the values to bind in order.
fn filter_conditions<'f>(
    driver: DbDriver,
    filter: &'f SnapshotFilter,
) -> (Vec<String>, Vec<&'f str>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    for (column, value) in [("sys_name", &filter.sys_name), ("employee", &filter.employee)] {
        if let Some(value) = value {
            let marker = placeholders(driver, values.len() + 1, 1).join("");
            conditions.push(format!("{column} = {marker}"));
            values.push(value.as_str());
        }
    }
    (conditions, values)
}

/// Newest `days` distinct snapshot dates matching the filter conditions.
pub fn recent_dates_sql(conditions: &[String], days: u32) -> String {
    let mut sql = format!("SELECT DISTINCT datestr FROM {SNAPSHOT_TABLE}");
    if !conditions.is_empty() {
        sql.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
    }
    sql.push_str(&format!(" ORDER BY datestr DESC LIMIT {days}"));
    sql
}

/// Snapshot rows matching the filter conditions from `oldest_marker` onwards, newest first.
pub fn history_rows_sql(conditions: &[String], oldest_marker: &str) -> String {
    let mut clauses = conditions.to_vec();
    clauses.push(format!("datestr >= {oldest_marker}"));
    format!(
        "SELECT {} FROM {} WHERE {} ORDER BY datestr DESC, sys_name, employee",
        snapshot_columns(),
        SNAPSHOT_TABLE,
        clauses.join(" AND ")
    )
}

fn snapshot_columns() -> String {
    let mut columns = vec!["datestr"];
    columns.extend(COUNT_COLUMNS);
    columns.extend(["sys_name", "employee"]);
    columns.join(", ")
}

fn read_counts(row: &AnyRow) -> Result<StatusCounts, sqlx::Error> {
    Ok(StatusCounts {
        total: row.try_get("total")?,
        unfinished: row.try_get("unfinished")?,
        not_started: row.try_get("not_started")?,
        developing: row.try_get("developing")?,
        testing: row.try_get("testing")?,
        releasable: row.try_get(RELEASABLE_COLUMN)?,
        finished: row.try_get("finished")?,
        closed: row.try_get("closed")?,
    })
}

fn read_snapshot_row(row: &AnyRow) -> Result<TaskStateCount, TaskStateError> {
    let datestr: String = row.try_get("datestr").map_err(map_sqlx_error)?;
    Ok(TaskStateCount {
        datestr: DateKey::parse(&datestr)
            .map_err(|_| TaskStateError::Query(format!("stored datestr '{datestr}' is malformed")))?,
        counts: read_counts(row).map_err(map_sqlx_error)?,
        sys_name: row
            .try_get::<Option<String>, _>("sys_name")
            .map_err(map_sqlx_error)?
            .unwrap_or_default(),
        employee: row
            .try_get::<Option<String>, _>("employee")
            .map_err(map_sqlx_error)?
            .unwrap_or_default(),
    })
}

#[async_trait]
impl<'c> TaskStateRepository for SqlxTaskStateRepository<'c> {
    async fn aggregate(
        &mut self,
        grouping: GroupingStrategy,
    ) -> Result<Vec<GroupCounts>, TaskStateError> {
        let sql = aggregate_sql(grouping);
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| -> Result<GroupCounts, sqlx::Error> {
                let (sys_name, employee) = match grouping {
                    GroupingStrategy::Global => (None, None),
                    GroupingStrategy::BySystemEmployee => (
                        row.try_get::<Option<String>, _>("sys_name")?,
                        row.try_get::<Option<String>, _>("employee")?,
                    ),
                };
                Ok(GroupCounts {
                    sys_name,
                    employee,
                    counts: read_counts(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_sqlx_error)
    }

    async fn replace_snapshot(
        &mut self,
        date: &DateKey,
        rows: &[TaskStateCount],
    ) -> Result<(), TaskStateError> {
        let delete_sql = format!(
            "DELETE FROM {} WHERE datestr = {}",
            SNAPSHOT_TABLE,
            placeholders(self.driver, 1, 1).join("")
        );
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            SNAPSHOT_TABLE,
            snapshot_columns(),
            placeholders(self.driver, 1, COUNT_COLUMNS.len() + 3).join(", ")
        );

        // Dropping `tx` on any early return rolls the delete back.
        let mut tx = self.conn.begin().await.map_err(map_sqlx_error)?;

        let deleted = sqlx::query(&delete_sql)
            .bind(date.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        for row in rows {
            let c = &row.counts;
            sqlx::query(&insert_sql)
                .bind(date.as_str())
                .bind(c.total)
                .bind(c.unfinished)
                .bind(c.not_started)
                .bind(c.developing)
                .bind(c.testing)
                .bind(c.releasable)
                .bind(c.finished)
                .bind(c.closed)
                .bind(row.sys_name.as_str())
                .bind(row.employee.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!(
            datestr = %date,
            deleted,
            inserted = rows.len(),
            "Snapshot replaced"
        );
        Ok(())
    }

    async fn snapshot_rows(
        &mut self,
        date: &DateKey,
    ) -> Result<Vec<TaskStateCount>, TaskStateError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE datestr = {} ORDER BY sys_name, employee",
            snapshot_columns(),
            SNAPSHOT_TABLE,
            placeholders(self.driver, 1, 1).join("")
        );
        let rows = sqlx::query(&sql)
            .bind(date.as_str())
            .fetch_all(&mut *self.conn)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(read_snapshot_row).collect()
    }

    async fn history(
        &mut self,
        filter: &SnapshotFilter,
        days: u32,
    ) -> Result<Vec<TaskStateCount>, TaskStateError> {
        let (conditions, values) = filter_conditions(self.driver, filter);

        let dates_sql = recent_dates_sql(&conditions, days);
        let mut dates_query = sqlx::query_scalar::<sqlx::Any, String>(&dates_sql);
        for value in &values {
            dates_query = dates_query.bind(*value);
        }
        let dates = dates_query
            .fetch_all(&mut *self.conn)
            .await
            .map_err(map_sqlx_error)?;
        let Some(oldest) = dates.last() else {
            return Ok(Vec::new());
        };

        let marker = placeholders(self.driver, values.len() + 1, 1).join("");
        let sql = history_rows_sql(&conditions, &marker);
        let mut query = sqlx::query::<sqlx::Any>(&sql);
        for value in &values {
            query = query.bind(*value);
        }
        let rows = query
            .bind(oldest.as_str())
            .fetch_all(&mut *self.conn)
            .await
            .map_err(map_sqlx_error)?;
        tracing::debug!(days, dates = dates.len(), rows = rows.len(), "History rows read");
        rows.iter().map(read_snapshot_row).collect()
    }
}
