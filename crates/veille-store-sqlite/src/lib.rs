//! SQLite backend for the veille substance store.
//!
//! Database access goes through [`tokio_rusqlite`], which owns the
//! connection on its own thread; async callers never block on disk I/O.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
