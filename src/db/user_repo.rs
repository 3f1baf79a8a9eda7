use sqlx::SqlitePool;
use std::str::FromStr;

use super::query::{delete_sql, ListQuery, Table};
use super::{format_timestamp, parse_timestamp, DbError};
use crate::models::{Role, User};
use crate::store::Filter;

const USERS: Table = Table {
    name: "users",
    select: "id, username, secret, role, created_at",
    columns: &["id", "username", "secret", "role"],
};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    secret: String,
    role: String,
    created_at: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|message| DbError::CorruptRow {
            table: USERS.name,
            message,
        })?;
        Ok(User {
            id: row.id,
            username: row.username,
            secret: row.secret,
            role,
            created_at: parse_timestamp(row.created_at),
        })
    }
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<User>, DbError> {
        let (sql, binds) = query.select_sql(&USERS)?;
        let mut q = sqlx::query_as::<_, UserRow>(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    /// Inserts all rows or none.
    pub async fn insert(&self, users: &[User]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        for user in users {
            sqlx::query(
                "INSERT INTO users (id, username, secret, role, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.secret)
            .bind(user.role.to_string())
            .bind(format_timestamp(user.created_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(users.len() as u64)
    }

    /// Insert or replace on `id`.
    pub async fn upsert(&self, user: &User) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, secret, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                secret = excluded.secret,
                role = excluded.role,
                created_at = COALESCE(excluded.created_at, users.created_at)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.secret)
        .bind(user.role.to_string())
        .bind(format_timestamp(user.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, filter: &Filter) -> Result<u64, DbError> {
        let (sql, binds) = delete_sql(&USERS, filter)?;
        let mut q = sqlx::query(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }
}
