//! Schema comparison engine for SQLite and PostgreSQL.
//!
//! schemadiff introspects two live databases, a *source* and a *target*,
//! into in-memory schema models, computes the schema mutations needed to
//! reshape the target into the source, and emits them as a migration script
//! in the engine's own dialect. Applying the script is the caller's job; the
//! core only produces text.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use schemadiff_core::SqliteDriver;
//! use tokio_util::sync::CancellationToken;
//!
//! # fn run() -> schemadiff_core::Result<()> {
//! let driver = SqliteDriver::open("source.sqlite", "target.sqlite")?;
//! let script = driver.diff(&CancellationToken::new())?;
//! println!("{script}");
//! driver.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`db`] — connections, TLS, identifier quoting
//! - [`sqlite`] — SQLite schema model, catalog introspection, differ, driver
//! - [`postgres`] — PostgreSQL schema model, catalog introspection, differ, driver
//! - [`error`] — error types

pub mod db;
pub mod error;
pub mod postgres;
pub mod sqlite;

pub use db::SslMode;
pub use error::{Result, SchemaDiffError};
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;
