//! crates/store_bench_core/src/domain.rs
//!
//! Defines the pure, core data structures for the benchmark.
//! These types are independent of any database or serialization format.

use crate::ports::{PortError, PortResult};
use std::fmt;

/// The workload variant a request runs. Every response carries its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
    Update,
    AddNotifications,
}

impl Operation {
    /// The short identifier returned in every response.
    pub fn tag(self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Delete => "DELETE",
            Operation::Update => "UPDATE",
            Operation::AddNotifications => "ADD_NOTIFICATIONS",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The backing store an operation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Database {
    PostgreSql,
    MongoDb,
}

impl Database {
    pub fn label(self) -> &'static str {
        match self {
            Database::PostgreSql => "PostgreSQL",
            Database::MongoDb => "MongoDB",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The number of synthetic users an insert creates. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertCount(u32);

impl InsertCount {
    /// Validates a raw count taken from a request body.
    pub fn new(raw: i64) -> PortResult<Self> {
        if raw <= 0 {
            return Err(PortError::Validation(
                "Count must be a positive integer".to_string(),
            ));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| PortError::Validation(format!("Count {} is too large", raw)))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
