//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use store_bench_core::ports::BenchmarkStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Each store handle owns its own connection pool. Handlers pick one by the
/// `{store}` path segment and never touch the other.
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<dyn BenchmarkStore>,
    pub mongo: Arc<dyn BenchmarkStore>,
}

impl AppState {
    /// Resolves the `{store}` path segment to a store handle.
    pub fn store(&self, name: &str) -> Option<Arc<dyn BenchmarkStore>> {
        match name {
            "postgres" => Some(self.postgres.clone()),
            "mongo" => Some(self.mongo.clone()),
            _ => None,
        }
    }
}
