//! Test utilities and helpers for the rivulet crates.
//!
//! This crate provides:
//! - Synthetic data generation: the persons, products and relationships
//!   tables and a lazy cursor over their cross join
//! - Instrumented sinks: a byte-counting discard sink and a sink that fails
//!   on demand
//! - SQLite fixtures holding the same tables
//!
//! It is intended for use within the rivulet test suites and tools.

pub mod data_gen;
pub mod sinks;
pub mod sqlite;

pub use data_gen::{CrossJoinCursor, Entity, Projection, TestTables};
pub use sinks::{CountingSink, FaultySink};
