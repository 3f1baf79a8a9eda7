//! Client side of the store service: typed row access and the change feed.

pub mod client;
pub mod error;
pub mod feed;
pub mod filter;

pub use client::StoreClient;
pub use error::StoreError;
pub use feed::{ChangeFeed, Subscription};
pub use filter::{Filter, FilterError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{Collection, Nurse, ScheduleRow, User};

/// JSON body of every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Response body of `DELETE /rest/{collection}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeletedRows {
    pub deleted: u64,
}

/// A row type stored in one collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;
}

impl Record for Nurse {
    const COLLECTION: Collection = Collection::Nurses;
}

impl Record for ScheduleRow {
    const COLLECTION: Collection = Collection::Schedules;
}
