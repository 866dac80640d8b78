//! PostgreSQL engine: schema model, catalog introspection, and differ.

mod diff;
mod introspect;
mod model;

pub use model::{
    PostgresColumn, PostgresConstraint, PostgresIndex, PostgresTable, PostgresTrigger,
    PostgresView,
};

use tokio_postgres::Client;
use tokio_util::sync::CancellationToken;

use crate::db::{self, SslMode, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::error::Result;

/// Compares two PostgreSQL schemas and emits a migration script.
///
/// The two connection strings may point at distinct databases or at distinct
/// schemas on the same server (via search_path); each side diffs whatever
/// `current_schema()` resolves to. Both connections are owned exclusively by
/// the driver and released when it is dropped, on every exit path.
pub struct PostgresDriver {
    source: Client,
    target: Client,
}

impl PostgresDriver {
    /// Connect to both databases with the default SSL mode and timeout.
    pub async fn connect(source: &str, target: &str) -> Result<Self> {
        Self::connect_with(source, target, SslMode::default()).await
    }

    /// Connect to both databases with an explicit SSL mode.
    pub async fn connect_with(source: &str, target: &str, ssl_mode: SslMode) -> Result<Self> {
        let source = db::connect_postgres(source, ssl_mode, DEFAULT_CONNECT_TIMEOUT_SECS).await?;
        let target = db::connect_postgres(target, ssl_mode, DEFAULT_CONNECT_TIMEOUT_SECS).await?;
        Ok(Self { source, target })
    }

    /// Build a driver from two already-open clients.
    pub fn from_clients(source: Client, target: Client) -> Self {
        Self { source, target }
    }

    /// Produce the migration script that reshapes the target schema into the
    /// source schema.
    ///
    /// Both sides are introspected in full, then the script is computed as a
    /// pure function of the two models. Cancelling the token aborts the
    /// catalog query in flight and returns [`SchemaDiffError::Cancelled`]
    /// with no partial output.
    ///
    /// [`SchemaDiffError::Cancelled`]: crate::error::SchemaDiffError::Cancelled
    pub async fn diff(&self, cancel: &CancellationToken) -> Result<String> {
        let source_tables = introspect::tables(&self.source, cancel).await?;
        let target_tables = introspect::tables(&self.target, cancel).await?;
        let source_views = introspect::views(&self.source, cancel).await?;
        let target_views = introspect::views(&self.target, cancel).await?;
        log::debug!(
            "Introspected schemas; source_tables={}, target_tables={}",
            source_tables.len(),
            target_tables.len()
        );

        let mut sections = Vec::new();
        let tables = diff::diff_tables(&source_tables, &target_tables)?;
        if !tables.is_empty() {
            sections.push(tables);
        }
        let views = diff::diff_views(&source_views, &target_views);
        if !views.is_empty() {
            sections.push(views);
        }
        Ok(sections.join("\n"))
    }

    /// Release both connections. Dropping the driver has the same effect.
    pub fn close(self) {}
}
