//! crates/store_bench_core/src/ports.rs
//!
//! Defines the service contract every benchmarked store implements.
//! The relational and document adapters are independent implementations of
//! this one trait; they are selected by route and never share code paths.

use crate::domain::{Database, InsertCount};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the database drivers.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Bad or missing input. Raised before any store is touched.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A referenced record (user history entry, book) could not be resolved.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Any failure reported by the underlying database client.
    #[error("Store error: {0}")]
    Store(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The four benchmark workloads. Each call is one complete operation; counts
/// returned are what the store reported as created, removed or modified.
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    /// Which store this is, for labelling responses.
    fn database(&self) -> Database;

    /// Creates `count` synthetic users with their devices and reading histories.
    async fn insert_users(&self, count: InsertCount) -> PortResult<u64>;

    /// Removes all user-scoped data. Books, authors and genres are left alone.
    async fn delete_all_users(&self) -> PortResult<u64>;

    /// Appends `"1"` to every user's password hash.
    async fn update_passwords(&self) -> PortResult<u64>;

    /// Creates one notification per user from their latest reading history.
    async fn add_notifications(&self) -> PortResult<u64>;
}
