//! Snapshot ingestion for the veille engine.
//!
//! This crate turns exported list snapshots on disk into store writes: it
//! reads the engine configuration, loads and coerces JSON snapshot files,
//! and drives full ingestion runs against any [`SubstanceStore`]
//! implementation.
//!
//! [`SubstanceStore`]: veille_core::store::SubstanceStore

pub mod archive;
pub mod config;
pub mod error;
pub mod loader;
pub mod run;

pub use error::{Error, Result};
