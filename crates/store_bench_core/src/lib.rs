pub mod domain;
pub mod ports;
pub mod workload;

pub use domain::{Database, InsertCount, Operation};
pub use ports::{BenchmarkStore, PortError, PortResult};
