//! # Storage Layer
//!
//! SQLite-backed persistence: connection pooling, embedded migrations, and
//! the account repository.

pub mod migrations;
pub mod pool;
pub mod repository;

pub use pool::{create_pool, DbPool};
pub use repository::{AccountRepository, SqlxAccountRepository};
