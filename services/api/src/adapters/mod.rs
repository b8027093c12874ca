pub mod mongo;
pub mod postgres;

pub use mongo::MongoStore;
pub use postgres::PostgresStore;
