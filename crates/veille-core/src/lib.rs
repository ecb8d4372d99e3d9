//! Core types and pipeline stages for the veille reconciliation engine.
//!
//! No HTTP, no database: every stage here is a pure function over domain
//! types, and the rest of the workspace builds on top of this crate.

// We intentionally use native `async fn` in trait impls (stabilised in Rust
// 1.75). Suppress the advisory lint about `Send` bounds on returned futures.
#![allow(async_fn_in_trait)]

pub mod dedup;
pub mod diff;
pub mod error;
pub mod history;
pub mod identity;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod value;

pub use error::{Error, Result};
