//! Shift-scheduling board for a small nursing team.
//!
//! The store service ([`server`]) holds users, the roster and monthly
//! schedules. Clients reach it through [`store::StoreClient`], mirror it in
//! the [`state`] managers and follow its change feed with
//! [`sync::RealtimeSync`]. [`board::Board`] ties them together.

pub mod board;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod state;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use board::Board;
pub use error::{Error, Result};
