//! Client-side state mirrored from the store.
//!
//! Each manager keeps a snapshot behind a `tokio::sync::RwLock` and exposes a
//! revision counter through a `watch` channel so observers can react to
//! completed reloads.

mod auth;
mod schedule;

pub use auth::{AuthSnapshot, AuthState};
pub use schedule::{ScheduleSnapshot, ScheduleState};
