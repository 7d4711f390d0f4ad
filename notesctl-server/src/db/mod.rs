//! Database layer - connection pool, schema and note storage
//!
//! # Design Principles
//!
//! - Connection pool, never a shared `Arc<Mutex<Connection>>`
//! - Point statements prepared once at startup, reused from the pool
//! - Listing is keyset-paginated; batch reads are one query (no N+1)
//! - Transactions for multi-step writes

pub mod error;
pub mod memory;
pub mod pool;
pub mod repos;
pub mod schema;

pub use error::DbError;
pub use memory::MemoryNoteStore;
pub use pool::{create_pool, PoolSettings};
pub use repos::*;
pub use schema::ensure_schema;
