//! Catalog introspection for SQLite databases.
//!
//! Issues a fixed, read-only sequence of queries against `sqlite_master` and
//! the `pragma_*` table-valued functions. Any query error aborts the run; no
//! partial model is returned.

use rusqlite::{params, Connection};
use tokio_util::sync::CancellationToken;

use super::model::{
    SqliteColumn, SqliteForeignKey, SqliteIndex, SqliteTable, SqliteTrigger, SqliteView,
};
use crate::error::{Result, SchemaDiffError};

/// Read every user table with its columns, indexes, triggers, and foreign
/// keys. Tables come back in name order; columns stay in ordinal order.
pub fn tables(conn: &Connection, cancel: &CancellationToken) -> Result<Vec<SqliteTable>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        if cancel.is_cancelled() {
            return Err(SchemaDiffError::Cancelled);
        }
        tables.push(SqliteTable {
            columns: table_columns(conn, &name)?,
            indexes: table_indexes(conn, &name)?,
            triggers: table_triggers(conn, &name)?,
            foreign_keys: table_foreign_keys(conn, &name)?,
            name,
        });
    }
    Ok(tables)
}

/// Read every user view, with the stored CREATE VIEW text verbatim.
pub fn views(conn: &Connection, cancel: &CancellationToken) -> Result<Vec<SqliteView>> {
    if cancel.is_cancelled() {
        return Err(SchemaDiffError::Cancelled);
    }
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'view' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let views = stmt
        .query_map([], |row| {
            Ok(SqliteView {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(views)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<SqliteColumn>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(SqliteColumn {
                name: row.get(0)?,
                type_name: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(columns)
}

fn table_indexes(conn: &Connection, table: &str) -> Result<Vec<SqliteIndex>> {
    // origin = 'c' keeps only explicitly created indexes; sqlite_autoindex_*
    // entries cannot be created or dropped by DDL.
    let mut stmt = conn.prepare(
        "SELECT name, \"unique\" FROM pragma_index_list(?1) \
         WHERE origin = 'c' ORDER BY name",
    )?;
    let entries: Vec<(String, bool)> = stmt
        .query_map(params![table], |row| {
            Ok((row.get(0)?, row.get::<_, i64>(1)? != 0))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut indexes = Vec::with_capacity(entries.len());
    for (name, unique) in entries {
        indexes.push(SqliteIndex {
            table: table.to_string(),
            columns: index_columns(conn, &name)?,
            name,
            unique,
        });
    }
    Ok(indexes)
}

fn index_columns(conn: &Connection, index: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    // name is NULL for rowid or expression members; those cannot be named in
    // a CREATE INDEX column list anyway.
    let columns = stmt
        .query_map(params![index], |row| row.get::<_, Option<String>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns.into_iter().flatten().collect())
}

fn table_triggers(conn: &Connection, table: &str) -> Result<Vec<SqliteTrigger>> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'trigger' AND tbl_name = ?1 ORDER BY name",
    )?;
    let triggers = stmt
        .query_map(params![table], |row| {
            Ok(SqliteTrigger {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(triggers)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<SqliteForeignKey>> {
    let mut stmt = conn.prepare(
        "SELECT id, \"table\", \"from\", \"to\", on_update, on_delete \
         FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let rows: Vec<(i64, String, String, Option<String>, String, String)> = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<rusqlite::Result<_>>()?;

    // Rows with the same id belong to one (possibly composite) constraint;
    // seq order fills the parallel from/to arrays.
    let mut groups: Vec<(i64, SqliteForeignKey)> = Vec::new();
    for (id, ref_table, from, to, on_update, on_delete) in rows {
        let to = to.unwrap_or_default();
        match groups.iter_mut().find(|(group_id, _)| *group_id == id) {
            Some((_, fk)) => {
                fk.from.push(from);
                fk.to.push(to);
            }
            None => groups.push((
                id,
                SqliteForeignKey {
                    table: ref_table,
                    from: vec![from],
                    to: vec![to],
                    on_update,
                    on_delete,
                },
            )),
        }
    }

    // Sort groups so comparison does not depend on the engine's internal
    // constraint numbering.
    let mut foreign_keys: Vec<SqliteForeignKey> = groups.into_iter().map(|(_, fk)| fk).collect();
    foreign_keys.sort_by(|a, b| {
        (
            &a.table,
            a.from.join(","),
            a.to.join(","),
            &a.on_update,
            &a.on_delete,
        )
            .cmp(&(
                &b.table,
                b.from.join(","),
                b.to.join(","),
                &b.on_update,
                &b.on_delete,
            ))
    });
    Ok(foreign_keys)
}
