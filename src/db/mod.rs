//! Persistence: the `Store` trait and its implementations

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
