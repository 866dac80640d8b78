//! Schema comparison and migration script generation for SQLite.
//!
//! The differ is a pure function of two introspected models. It compares at
//! the database, table, column, and dependent-object levels, and decides per
//! table whether the change is expressible with in-place ALTERs or needs the
//! table-rebuild protocol (shadow table, mapped copy, drop, rename).

use std::fmt::Write;

use super::model::{SqliteTable, SqliteView};
use crate::db::quote_ident;
use crate::error::{Result, SchemaDiffError};

/// Outcome of classifying two column lists.
///
/// The four classes are disjoint: a column participating in a rename is
/// neither added nor removed.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ColumnsDiff {
    /// Source column names absent from the target.
    pub added: Vec<String>,
    /// Columns present on both sides whose non-name attributes differ and
    /// whose types are rebuild-compatible.
    pub modified: Vec<String>,
    /// Target column names absent from the source.
    pub removed: Vec<String>,
    /// (target name, source name) pairs in detection order.
    pub renamed: Vec<(String, String)>,
    pub foreign_keys_changed: bool,
}

impl ColumnsDiff {
    /// Modified columns and foreign-key changes cannot be expressed as
    /// single ALTERs; they force the rebuild protocol.
    fn requires_rebuild(&self) -> bool {
        !self.modified.is_empty() || self.foreign_keys_changed
    }

    /// The target-side (old) name a source column was renamed from.
    fn renamed_from(&self, source_name: &str) -> Option<&str> {
        self.renamed
            .iter()
            .find(|(_, new)| new == source_name)
            .map(|(old, _)| old.as_str())
    }

    fn consumed_target(&self, target_name: &str) -> bool {
        self.renamed.iter().any(|(old, _)| old == target_name)
    }
}

/// Classify the column sets of two same-named tables.
pub(crate) fn diff_columns(source: &SqliteTable, target: &SqliteTable) -> ColumnsDiff {
    let mut diff = ColumnsDiff::default();

    for source_column in &source.columns {
        let Some(target_column) = target.column_by_name(&source_column.name) else {
            // Absent by name in the target. A rename candidate is a target
            // column that is absent from the source, not yet consumed by an
            // earlier rename, and attribute-equal; first fit in declared
            // order wins.
            let renamed = target.columns.iter().find(|c| {
                source.column_by_name(&c.name).is_none()
                    && !diff.consumed_target(&c.name)
                    && c.attributes_equal(source_column)
            });
            match renamed {
                Some(c) => diff.renamed.push((c.name.clone(), source_column.name.clone())),
                None => diff.added.push(source_column.name.clone()),
            }
            continue;
        };

        if source_column == target_column {
            continue;
        }

        if source_column.type_name != target_column.type_name
            && !source_column.type_change_compatible(target_column)
        {
            // Incompatible type change: the data cannot be carried over, so
            // the column is dropped and re-added.
            diff.removed.push(target_column.name.clone());
            diff.added.push(source_column.name.clone());
            continue;
        }

        diff.modified.push(source_column.name.clone());
    }

    for target_column in &target.columns {
        if source.column_by_name(&target_column.name).is_none()
            && !diff.consumed_target(&target_column.name)
        {
            diff.removed.push(target_column.name.clone());
        }
    }

    diff.foreign_keys_changed = source.foreign_keys.len() != target.foreign_keys.len()
        || source
            .foreign_keys
            .iter()
            .any(|fk| !target.foreign_keys.contains(fk));

    diff
}

/// Diff the full table sets. Source-only tables are created in full,
/// common tables are descended into, and target-only tables are dropped at
/// the end of the section.
pub fn diff_tables(source: &[SqliteTable], target: &[SqliteTable]) -> Result<String> {
    let mut segments = Vec::new();

    for source_table in source {
        match target.iter().find(|t| t.name == source_table.name) {
            None => segments.push(source_table.create_full_sql()),
            Some(target_table) => {
                let table_diff = diff_table(source_table, target_table)?;
                if !table_diff.is_empty() {
                    segments.push(table_diff);
                }
            }
        }
    }

    let mut drops = Vec::new();
    for target_table in target {
        if !source.iter().any(|t| t.name == target_table.name) {
            drops.push(format!("DROP TABLE {};", quote_ident(&target_table.name)));
        }
    }
    if !drops.is_empty() {
        segments.push(drops.join("\n"));
    }

    Ok(segments.join("\n"))
}

/// Diff the view sets. Views are replayed verbatim; a changed definition is
/// dropped and recreated.
pub fn diff_views(source: &[SqliteView], target: &[SqliteView]) -> String {
    let mut statements = Vec::new();

    for source_view in source {
        match target.iter().find(|v| v.name == source_view.name) {
            None => statements.push(format!("{};", source_view.sql)),
            Some(target_view) if source_view.sql != target_view.sql => {
                statements.push(format!("DROP VIEW {};", quote_ident(&target_view.name)));
                statements.push(format!("{};", source_view.sql));
            }
            Some(_) => {}
        }
    }

    for target_view in target {
        if !source.iter().any(|v| v.name == target_view.name) {
            statements.push(format!("DROP VIEW {};", quote_ident(&target_view.name)));
        }
    }

    statements.join("\n")
}

fn diff_table(source: &SqliteTable, target: &SqliteTable) -> Result<String> {
    let columns = diff_columns(source, target);
    let mut out = String::new();

    if columns.requires_rebuild() {
        write_rebuild(&mut out, source, target, &columns)?;
        // DROP TABLE discarded the target's triggers along with the table;
        // restore the source's set wholesale.
        for trigger in &source.triggers {
            writeln!(out, "{};", trigger.sql)?;
        }
    } else {
        write_index_diff(&mut out, source, target)?;
        write_trigger_diff(&mut out, source, target)?;
        write_column_alters(&mut out, source, &columns)?;
    }

    Ok(out.trim_end().to_string())
}

fn write_index_diff(out: &mut String, source: &SqliteTable, target: &SqliteTable) -> Result<()> {
    for source_index in &source.indexes {
        match target.index_by_name(&source_index.name) {
            None => writeln!(out, "{}", source_index.create_sql())?,
            Some(target_index) if source_index != target_index => {
                writeln!(out, "DROP INDEX {};", quote_ident(&target_index.name))?;
                writeln!(out, "{}", source_index.create_sql())?;
            }
            Some(_) => {}
        }
    }
    for target_index in &target.indexes {
        if source.index_by_name(&target_index.name).is_none() {
            writeln!(out, "DROP INDEX {};", quote_ident(&target_index.name))?;
        }
    }
    Ok(())
}

fn write_trigger_diff(out: &mut String, source: &SqliteTable, target: &SqliteTable) -> Result<()> {
    for source_trigger in &source.triggers {
        match target.trigger_by_name(&source_trigger.name) {
            None => writeln!(out, "{};", source_trigger.sql)?,
            Some(target_trigger) if source_trigger.sql != target_trigger.sql => {
                writeln!(out, "DROP TRIGGER {};", quote_ident(&target_trigger.name))?;
                writeln!(out, "{};", source_trigger.sql)?;
            }
            Some(_) => {}
        }
    }
    for target_trigger in &target.triggers {
        if source.trigger_by_name(&target_trigger.name).is_none() {
            writeln!(out, "DROP TRIGGER {};", quote_ident(&target_trigger.name))?;
        }
    }
    Ok(())
}

fn write_column_alters(
    out: &mut String,
    source: &SqliteTable,
    columns: &ColumnsDiff,
) -> Result<()> {
    let table = quote_ident(&source.name);
    for (old_name, new_name) in &columns.renamed {
        writeln!(
            out,
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            table,
            quote_ident(old_name),
            quote_ident(new_name)
        )?;
    }
    for name in &columns.removed {
        writeln!(out, "ALTER TABLE {} DROP COLUMN {};", table, quote_ident(name))?;
    }
    for name in &columns.added {
        let column = source.column_by_name(name).ok_or_else(|| {
            SchemaDiffError::Internal(format!(
                "added column {} not found in table {}",
                name, source.name
            ))
        })?;
        writeln!(
            out,
            "ALTER TABLE {} ADD COLUMN {};",
            table,
            column.definition()
        )?;
    }
    Ok(())
}

/// The rebuild protocol: shadow table, mapped copy, drop, rename, index
/// re-creation. The INSERT column list follows the source's declared order;
/// each select expression copies a surviving column, reads a renamed
/// column's old name, falls back to the declared default, or NULL.
fn write_rebuild(
    out: &mut String,
    source: &SqliteTable,
    target: &SqliteTable,
    columns: &ColumnsDiff,
) -> Result<()> {
    let shadow_name = format!("_{}_temp", source.name);
    let shadow = SqliteTable {
        name: shadow_name.clone(),
        ..source.clone()
    };
    writeln!(out, "{}", shadow.create_table_sql())?;

    let mut insert_columns = Vec::with_capacity(source.columns.len());
    let mut select_exprs = Vec::with_capacity(source.columns.len());
    for column in &source.columns {
        insert_columns.push(quote_ident(&column.name));
        if target.column_by_name(&column.name).is_some() {
            select_exprs.push(quote_ident(&column.name));
        } else if let Some(old_name) = columns.renamed_from(&column.name) {
            select_exprs.push(quote_ident(old_name));
        } else if let Some(default) = &column.default {
            select_exprs.push(default.clone());
        } else {
            select_exprs.push("NULL".to_string());
        }
    }
    writeln!(
        out,
        "INSERT INTO {} ({}) SELECT {} FROM {};",
        quote_ident(&shadow_name),
        insert_columns.join(", "),
        select_exprs.join(", "),
        quote_ident(&source.name)
    )?;

    writeln!(out, "DROP TABLE {};", quote_ident(&source.name))?;
    writeln!(
        out,
        "ALTER TABLE {} RENAME TO {};",
        quote_ident(&shadow_name),
        quote_ident(&source.name)
    )?;

    // DROP TABLE took the target's indexes with it; recreate the source set
    // against the final table name.
    for index in &source.indexes {
        writeln!(out, "{}", index.create_sql())?;
    }
    Ok(())
}
