//! Catalog introspection for PostgreSQL databases.
//!
//! Reads the schema visible through `current_schema()`; the connection's
//! search_path decides which schema a driver side sees. Any catalog query
//! error aborts the run; no partial model is returned.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row};
use tokio_util::sync::CancellationToken;

use super::model::{
    PostgresColumn, PostgresConstraint, PostgresIndex, PostgresTable, PostgresTrigger,
    PostgresView,
};
use crate::error::{Result, SchemaDiffError};

/// Run one catalog query, racing it against the cancellation token.
async fn query(
    client: &Client,
    cancel: &CancellationToken,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<Row>> {
    tokio::select! {
        _ = cancel.cancelled() => Err(SchemaDiffError::Cancelled),
        rows = client.query(sql, params) => Ok(rows?),
    }
}

/// Read every base table in the current schema, with columns, constraints,
/// indexes, and triggers.
pub async fn tables(client: &Client, cancel: &CancellationToken) -> Result<Vec<PostgresTable>> {
    let rows = query(
        client,
        cancel,
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
         ORDER BY table_name",
        &[],
    )
    .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.get(0);
        tables.push(table(client, cancel, name).await?);
    }
    Ok(tables)
}

/// Read every view in the current schema.
pub async fn views(client: &Client, cancel: &CancellationToken) -> Result<Vec<PostgresView>> {
    let rows = query(
        client,
        cancel,
        "SELECT table_name, view_definition FROM information_schema.views \
         WHERE table_schema = current_schema() ORDER BY table_name",
        &[],
    )
    .await?;

    Ok(rows
        .iter()
        .map(|row| PostgresView {
            name: row.get(0),
            definition: row.get::<_, Option<String>>(1).unwrap_or_default(),
        })
        .collect())
}

async fn table(
    client: &Client,
    cancel: &CancellationToken,
    name: String,
) -> Result<PostgresTable> {
    let columns = query(
        client,
        cancel,
        "SELECT column_name, data_type, is_nullable, column_default \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 \
         ORDER BY ordinal_position",
        &[&name],
    )
    .await?
    .iter()
    .map(|row| PostgresColumn {
        name: row.get(0),
        type_name: row.get(1),
        not_null: row.get::<_, String>(2) == "NO",
        default: row.get(3),
    })
    .collect();

    let constraints = query(
        client,
        cancel,
        "SELECT conname, contype, pg_get_constraintdef(oid) \
         FROM pg_constraint WHERE conrelid = $1::text::regclass \
         ORDER BY conname",
        &[&name],
    )
    .await?
    .iter()
    .map(|row| PostgresConstraint {
        name: row.get(0),
        kind: row.get::<_, i8>(1) as u8 as char,
        definition: row.get(2),
    })
    .collect();

    // Constraint-backed indexes are implicit; the constraint diff covers them.
    let indexes = query(
        client,
        cancel,
        "SELECT indexname, indexdef FROM pg_indexes \
         WHERE schemaname = current_schema() AND tablename = $1 \
         AND indexname NOT IN ( \
             SELECT conname FROM pg_constraint WHERE conrelid = $1::regclass \
         ) \
         ORDER BY indexname",
        &[&name],
    )
    .await?
    .iter()
    .map(|row| PostgresIndex {
        table: name.clone(),
        name: row.get(0),
        definition: row.get(1),
    })
    .collect();

    let triggers = query(
        client,
        cancel,
        "SELECT tgname, pg_get_triggerdef(oid) \
         FROM pg_trigger WHERE tgrelid = $1::text::regclass AND tgisinternal = false \
         ORDER BY tgname",
        &[&name],
    )
    .await?
    .iter()
    .map(|row| PostgresTrigger {
        name: row.get(0),
        definition: row.get(1),
    })
    .collect();

    Ok(PostgresTable {
        name,
        columns,
        constraints,
        indexes,
        triggers,
    })
}
