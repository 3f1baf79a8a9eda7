//! Row-level REST endpoints: `/rest/{collection}`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::AppState;
use crate::db::ListQuery;
use crate::models::{ChangeKind, Collection, Nurse, ScheduleRow, User};
use crate::store::{DeletedRows, Filter};

type Params = Vec<(String, String)>;

fn parse_collection(name: &str) -> Result<Collection, ApiError> {
    Collection::parse(name).ok_or_else(|| ApiError::NotFound(format!("Unknown collection: {}", name)))
}

fn list_query(params: &Params) -> Result<ListQuery, ApiError> {
    let mut query = ListQuery::filtered(Filter::from_query(params.iter().map(|(k, v)| (k, v)))?);

    for (name, value) in params {
        match name.as_str() {
            "order" => query = query.order_by(value.as_str()),
            "limit" => {
                let limit = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid limit '{}'", value)))?;
                query = query.limit(limit);
            }
            _ => {}
        }
    }

    Ok(query)
}

/// Rejects schedule rows whose `key` is not the canonical form of their columns.
fn check_schedule_keys(rows: &[ScheduleRow]) -> Result<(), ApiError> {
    for row in rows {
        row.validate_key()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    }
    Ok(())
}

fn rows_json<T: Serialize>(rows: Vec<T>) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(rows)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /rest/{collection}?col=eq.value&order=col&limit=n`
pub async fn select(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let collection = parse_collection(&collection)?;
    let query = list_query(&params)?;

    match collection {
        Collection::Users => rows_json(state.db.users.list(&query).await?),
        Collection::Nurses => rows_json(state.db.nurses.list(&query).await?),
        Collection::Schedules => rows_json(state.db.schedules.list(&query).await?),
    }
}

/// `POST /rest/{collection}` with a JSON array of rows.
pub async fn insert(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let collection = parse_collection(&collection)?;

    let inserted = match collection {
        Collection::Users => {
            let rows: Vec<User> = serde_json::from_value(body)?;
            state.db.users.insert(&rows).await?
        }
        Collection::Nurses => {
            let rows: Vec<Nurse> = serde_json::from_value(body)?;
            state.db.nurses.insert(&rows).await?
        }
        Collection::Schedules => {
            let rows: Vec<ScheduleRow> = serde_json::from_value(body)?;
            check_schedule_keys(&rows)?;
            state.db.schedules.insert(&rows).await?
        }
    };

    tracing::debug!("Inserted {} row(s) into {}", inserted, collection);
    if inserted > 0 {
        state.hub.publish(collection, ChangeKind::Insert);
    }
    Ok(StatusCode::CREATED)
}

/// `PUT /rest/{collection}` with one JSON row; insert or replace on the primary key.
pub async fn upsert(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let collection = parse_collection(&collection)?;

    match collection {
        Collection::Users => {
            let row: User = serde_json::from_value(body)?;
            state.db.users.upsert(&row).await?
        }
        Collection::Nurses => {
            let row: Nurse = serde_json::from_value(body)?;
            state.db.nurses.upsert(&row).await?
        }
        Collection::Schedules => {
            let row: ScheduleRow = serde_json::from_value(body)?;
            check_schedule_keys(std::slice::from_ref(&row))?;
            state.db.schedules.upsert(&row).await?
        }
    }

    state.hub.publish(collection, ChangeKind::Update);
    Ok(StatusCode::OK)
}

/// `DELETE /rest/{collection}?col=eq.value`; at least one filter is required.
pub async fn delete(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<DeletedRows>, ApiError> {
    let collection = parse_collection(&collection)?;
    let filter = Filter::from_query(params.iter().map(|(k, v)| (k, v)))?;

    let deleted = match collection {
        Collection::Users => state.db.users.delete(&filter).await?,
        Collection::Nurses => state.db.nurses.delete(&filter).await?,
        Collection::Schedules => state.db.schedules.delete(&filter).await?,
    };

    tracing::debug!("Deleted {} row(s) from {}", deleted, collection);
    if deleted > 0 {
        state.hub.publish(collection, ChangeKind::Delete);
    }
    Ok(Json(DeletedRows { deleted }))
}
