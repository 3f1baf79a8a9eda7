//! Keeps the state managers in step with the store's change feed.

mod realtime;

pub use realtime::RealtimeSync;
