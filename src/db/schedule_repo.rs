use sqlx::SqlitePool;

use super::query::{delete_sql, ListQuery, Table};
use super::{format_timestamp, parse_timestamp, DbError};
use crate::models::{DayRecord, ScheduleRow};
use crate::store::Filter;

const SCHEDULES: Table = Table {
    name: "schedules",
    select: "key, year, month, staff_id, schedule, updated_at",
    columns: &["key", "staff_id", "year", "month"],
};

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: SqlitePool,
}

// `schedule` holds the JSON-encoded day records.
#[derive(sqlx::FromRow)]
struct ScheduleDbRow {
    key: String,
    year: i64,
    month: i64,
    staff_id: String,
    schedule: String,
    updated_at: Option<String>,
}

impl TryFrom<ScheduleDbRow> for ScheduleRow {
    type Error = DbError;

    fn try_from(row: ScheduleDbRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| DbError::CorruptRow {
            table: SCHEDULES.name,
            message,
        };

        let schedule: Vec<DayRecord> = serde_json::from_str(&row.schedule)
            .map_err(|e| corrupt(format!("schedule {}: {}", row.key, e)))?;

        Ok(ScheduleRow {
            year: i32::try_from(row.year).map_err(|e| corrupt(e.to_string()))?,
            month: u32::try_from(row.month).map_err(|e| corrupt(e.to_string()))?,
            key: row.key,
            staff_id: row.staff_id,
            schedule,
            updated_at: parse_timestamp(row.updated_at),
        })
    }
}

impl ScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<ScheduleRow>, DbError> {
        let (sql, binds) = query.select_sql(&SCHEDULES)?;
        let mut q = sqlx::query_as::<_, ScheduleDbRow>(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(ScheduleRow::try_from).collect()
    }

    /// Inserts all rows or none.
    pub async fn insert(&self, rows: &[ScheduleRow]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            let schedule = encode_schedule(&row.schedule)?;
            sqlx::query(
                r#"
                INSERT INTO schedules (key, year, month, staff_id, schedule, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.key)
            .bind(row.year)
            .bind(row.month)
            .bind(&row.staff_id)
            .bind(&schedule)
            .bind(format_timestamp(row.updated_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    /// Insert or replace the whole month on `key`.
    pub async fn upsert(&self, row: &ScheduleRow) -> Result<(), DbError> {
        let schedule = encode_schedule(&row.schedule)?;
        sqlx::query(
            r#"
            INSERT INTO schedules (key, year, month, staff_id, schedule, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                year = excluded.year,
                month = excluded.month,
                staff_id = excluded.staff_id,
                schedule = excluded.schedule,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.key)
        .bind(row.year)
        .bind(row.month)
        .bind(&row.staff_id)
        .bind(&schedule)
        .bind(format_timestamp(row.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, filter: &Filter) -> Result<u64, DbError> {
        let (sql, binds) = delete_sql(&SCHEDULES, filter)?;
        let mut q = sqlx::query(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }
}

fn encode_schedule(days: &[DayRecord]) -> Result<String, DbError> {
    serde_json::to_string(days).map_err(|e| DbError::CorruptRow {
        table: SCHEDULES.name,
        message: e.to_string(),
    })
}
