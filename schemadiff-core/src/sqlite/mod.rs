//! SQLite engine: schema model, catalog introspection, and differ.

mod diff;
mod introspect;
mod model;

pub use model::{
    SqliteColumn, SqliteForeignKey, SqliteIndex, SqliteTable, SqliteTrigger, SqliteView,
};

use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use crate::db;
use crate::error::{Result, SchemaDiffError};

/// Compares two SQLite databases and emits a migration script.
///
/// Owns both connections exclusively; they are released by [`close`] or when
/// the driver is dropped, on every exit path.
///
/// [`close`]: SqliteDriver::close
pub struct SqliteDriver {
    source: Connection,
    target: Connection,
}

impl SqliteDriver {
    /// Open both database files.
    pub fn open(source_path: &str, target_path: &str) -> Result<Self> {
        let source = db::open_sqlite(source_path)?;
        let target = db::open_sqlite(target_path)?;
        log::debug!("Opened SQLite databases; source={source_path}, target={target_path}");
        Ok(Self { source, target })
    }

    /// Produce the migration script that reshapes the target schema into the
    /// source schema.
    ///
    /// Both sides are introspected in full, then the script is computed as a
    /// pure function of the two models; nothing is executed against either
    /// database. Cancelling the token aborts between catalog queries and
    /// returns [`SchemaDiffError::Cancelled`] with no partial output.
    pub fn diff(&self, cancel: &CancellationToken) -> Result<String> {
        let source_tables = introspect::tables(&self.source, cancel)?;
        let target_tables = introspect::tables(&self.target, cancel)?;
        let source_views = introspect::views(&self.source, cancel)?;
        let target_views = introspect::views(&self.target, cancel)?;
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

    /// Close both connections.
    pub fn close(self) -> Result<()> {
        self.source
            .close()
            .map_err(|(_, e)| SchemaDiffError::from(e))?;
        self.target
            .close()
            .map_err(|(_, e)| SchemaDiffError::from(e))?;
        Ok(())
    }
}
