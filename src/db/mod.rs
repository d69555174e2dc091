//! Database layer
//!
//! SQLite is the default backend (single-file deployment); MySQL is available
//! for larger installations. The driver is chosen by configuration.
//!
//! ```ignore
//! use multiblog::config::DatabaseConfig;
//! use multiblog::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, is_unique_violation, Backend, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
