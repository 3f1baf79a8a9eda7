//! SQL assembly for filtered row queries.
//!
//! Column names come from a per-table whitelist; values are always bound.

use crate::store::Filter;

use super::DbError;

/// Static description of a table's queryable surface.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    /// Column list used in `SELECT`.
    pub select: &'static str,
    /// Columns allowed in filters and `ORDER BY`.
    pub columns: &'static [&'static str],
}

impl Table {
    fn check_column(&self, column: &str) -> Result<(), DbError> {
        if self.columns.contains(&column) {
            Ok(())
        } else {
            Err(DbError::UnknownColumn {
                column: column.to_string(),
                table: self.name,
            })
        }
    }

    fn push_where(&self, sql: &mut String, filter: &Filter) -> Result<Vec<String>, DbError> {
        let mut binds = Vec::with_capacity(filter.clauses().len());
        for (i, (column, value)) in filter.clauses().iter().enumerate() {
            self.check_column(column)?;
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(column);
            sql.push_str(" = ?");
            binds.push(value.clone());
        }
        Ok(binds)
    }
}

/// Filter, ordering and limit for a row listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Filter,
    pub order: Option<String>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order = Some(column.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn select_sql(&self, table: &Table) -> Result<(String, Vec<String>), DbError> {
        let mut sql = format!("SELECT {} FROM {}", table.select, table.name);
        let binds = table.push_where(&mut sql, &self.filter)?;

        if let Some(order) = &self.order {
            table.check_column(order)?;
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok((sql, binds))
    }
}

pub(crate) fn delete_sql(table: &Table, filter: &Filter) -> Result<(String, Vec<String>), DbError> {
    if filter.is_empty() {
        return Err(DbError::MissingFilter(table.name));
    }
    let mut sql = format!("DELETE FROM {}", table.name);
    let binds = table.push_where(&mut sql, filter)?;
    Ok((sql, binds))
}
