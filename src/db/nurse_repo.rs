use sqlx::SqlitePool;

use super::query::{delete_sql, ListQuery, Table};
use super::{format_timestamp, parse_timestamp, DbError};
use crate::models::Nurse;
use crate::store::Filter;

const NURSES: Table = Table {
    name: "nurses",
    select: "id, name, created_at",
    columns: &["id", "name"],
};

#[derive(Clone)]
pub struct NurseRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct NurseRow {
    id: String,
    name: String,
    created_at: Option<String>,
}

impl From<NurseRow> for Nurse {
    fn from(row: NurseRow) -> Self {
        Nurse {
            id: row.id,
            name: row.name,
            created_at: parse_timestamp(row.created_at),
        }
    }
}

impl NurseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Nurse>, DbError> {
        let (sql, binds) = query.select_sql(&NURSES)?;
        let mut q = sqlx::query_as::<_, NurseRow>(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Nurse::from).collect())
    }

    /// Inserts all rows or none.
    pub async fn insert(&self, nurses: &[Nurse]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        for nurse in nurses {
            sqlx::query("INSERT INTO nurses (id, name, created_at) VALUES (?, ?, ?)")
                .bind(&nurse.id)
                .bind(&nurse.name)
                .bind(format_timestamp(nurse.created_at))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(nurses.len() as u64)
    }

    /// Insert or replace on `id`.
    pub async fn upsert(&self, nurse: &Nurse) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO nurses (id, name, created_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                created_at = COALESCE(excluded.created_at, nurses.created_at)
            "#,
        )
        .bind(&nurse.id)
        .bind(&nurse.name)
        .bind(format_timestamp(nurse.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, filter: &Filter) -> Result<u64, DbError> {
        let (sql, binds) = delete_sql(&NURSES, filter)?;
        let mut q = sqlx::query(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }
}
