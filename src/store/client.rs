//! HTTP adapter for the store service's row endpoints.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use super::error::StoreError;
use super::feed::ChangeFeed;
use super::filter::Filter;
use super::{DeletedRows, ErrorBody, Record};
use crate::models::{Collection, User};

/// Typed access to `/rest/{collection}`.
///
/// Every call is a single request; failures are returned as-is.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl StoreClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Change feed against the same service and credentials.
    pub fn feed(&self) -> ChangeFeed {
        ChangeFeed::new(self.base_url.clone(), self.api_key.clone())
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        let url = format!("{}/rest/{}", self.base_url, collection);
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Turns a non-success response into a `StoreError`.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        if status == StatusCode::CONFLICT {
            Err(StoreError::Conflict(message))
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn fetch<T: Record>(
        &self,
        filter: &Filter,
        order_by: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<T>, StoreError> {
        let mut params = filter.to_query();
        if let Some(column) = order_by {
            params.push(("order".to_string(), column.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .request(Method::GET, T::COLLECTION)
            .query(&params)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// All rows of the collection, optionally ordered by one column.
    pub async fn list_all<T: Record>(&self, order_by: Option<&str>) -> Result<Vec<T>, StoreError> {
        self.fetch(&Filter::new(), order_by, None).await
    }

    /// Rows matching every equality clause of `filter`.
    pub async fn select<T: Record>(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.fetch(filter, None, None).await
    }

    /// The single row matching `filter`, if any.
    pub async fn get_one<T: Record>(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let mut rows: Vec<T> = self.fetch(filter, None, Some(2)).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(StoreError::MultipleRows(n)),
        }
    }

    /// Inserts all rows or none.
    pub async fn insert<T: Record>(&self, rows: &[T]) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, T::COLLECTION)
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!("Inserted {} row(s) into {}", rows.len(), T::COLLECTION);
        Ok(())
    }

    /// Inserts or replaces one row on the collection's primary key.
    pub async fn upsert<T: Record>(&self, row: &T) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, T::COLLECTION)
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Deletes matching rows and returns how many were removed.
    ///
    /// The service refuses an empty filter.
    pub async fn delete<T: Record>(&self, filter: &Filter) -> Result<u64, StoreError> {
        let response = self
            .request(Method::DELETE, T::COLLECTION)
            .query(&filter.to_query())
            .send()
            .await?;
        let body: DeletedRows = Self::check(response).await?.json().await?;
        tracing::debug!("Deleted {} row(s) from {}", body.deleted, T::COLLECTION);
        Ok(body.deleted)
    }

    /// True when a one-row read of `users` succeeds within `timeout`.
    pub async fn health_check(&self, timeout: Duration) -> bool {
        let all = Filter::new();
        let probe = self.fetch::<User>(&all, None, Some(1));
        match tokio::time::timeout(timeout, probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Health probe failed: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!("Health probe timed out after {:?}", timeout);
                false
            }
        }
    }
}
