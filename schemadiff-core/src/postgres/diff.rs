//! Schema comparison and migration script generation for PostgreSQL.
//!
//! Every column change is expressible in place (ADD/DROP COLUMN, ALTER
//! COLUMN TYPE, SET/DROP NOT NULL, SET/DROP DEFAULT), so there is no rebuild
//! protocol. Renames are not detected: a renamed column comes out as an
//! ADD/DROP pair.

use std::fmt::Write;

use super::model::{PostgresTable, PostgresView};
use crate::db::quote_ident;
use crate::error::Result;

/// Diff the full table sets. Source-only tables are created in full, common
/// tables are descended into, and target-only tables are dropped at the end
/// of the section.
pub fn diff_tables(source: &[PostgresTable], target: &[PostgresTable]) -> Result<String> {
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

/// Diff the view sets by name, with textual definition equality.
pub fn diff_views(source: &[PostgresView], target: &[PostgresView]) -> String {
    let mut statements = Vec::new();

    for source_view in source {
        match target.iter().find(|v| v.name == source_view.name) {
            None => statements.push(source_view.create_sql()),
            Some(target_view) if source_view.definition != target_view.definition => {
                statements.push(format!("DROP VIEW {};", quote_ident(&target_view.name)));
                statements.push(source_view.create_sql());
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

/// Columns first, then constraints, indexes, and triggers, all in place.
fn diff_table(source: &PostgresTable, target: &PostgresTable) -> Result<String> {
    let mut out = String::new();
    let table = quote_ident(&source.name);

    for source_column in &source.columns {
        let Some(target_column) = target.column_by_name(&source_column.name) else {
            writeln!(
                out,
                "ALTER TABLE {} ADD COLUMN {};",
                table,
                source_column.definition()
            )?;
            continue;
        };
        if source_column.attributes_equal(target_column) {
            continue;
        }
        let column = quote_ident(&source_column.name);
        if source_column.type_name != target_column.type_name {
            writeln!(
                out,
                "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
                table, column, source_column.type_name
            )?;
        }
        if source_column.not_null != target_column.not_null {
            if source_column.not_null {
                writeln!(out, "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;", table, column)?;
            } else {
                writeln!(out, "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL;", table, column)?;
            }
        }
        if source_column.default != target_column.default {
            match &source_column.default {
                Some(default) => writeln!(
                    out,
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    table, column, default
                )?,
                None => writeln!(
                    out,
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    table, column
                )?,
            }
        }
    }
    for target_column in &target.columns {
        if source.column_by_name(&target_column.name).is_none() {
            writeln!(
                out,
                "ALTER TABLE {} DROP COLUMN {};",
                table,
                quote_ident(&target_column.name)
            )?;
        }
    }

    for source_constraint in &source.constraints {
        match target.constraint_by_name(&source_constraint.name) {
            None => writeln!(out, "ALTER TABLE {} ADD {};", table, source_constraint.clause())?,
            Some(target_constraint)
                if target_constraint.definition != source_constraint.definition =>
            {
                writeln!(
                    out,
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    table,
                    quote_ident(&target_constraint.name)
                )?;
                writeln!(out, "ALTER TABLE {} ADD {};", table, source_constraint.clause())?;
            }
            Some(_) => {}
        }
    }
    for target_constraint in &target.constraints {
        if source.constraint_by_name(&target_constraint.name).is_none() {
            writeln!(
                out,
                "ALTER TABLE {} DROP CONSTRAINT {};",
                table,
                quote_ident(&target_constraint.name)
            )?;
        }
    }

    for source_index in &source.indexes {
        match target.index_by_name(&source_index.name) {
            None => writeln!(out, "{}", source_index.create_sql())?,
            Some(target_index) if target_index.definition != source_index.definition => {
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

    for source_trigger in &source.triggers {
        match target.trigger_by_name(&source_trigger.name) {
            None => writeln!(out, "{}", source_trigger.create_sql())?,
            Some(target_trigger) if target_trigger.definition != source_trigger.definition => {
                writeln!(
                    out,
                    "DROP TRIGGER {} ON {};",
                    quote_ident(&target_trigger.name),
                    table
                )?;
                writeln!(out, "{}", source_trigger.create_sql())?;
            }
            Some(_) => {}
        }
    }
    for target_trigger in &target.triggers {
        if source.trigger_by_name(&target_trigger.name).is_none() {
            writeln!(
                out,
                "DROP TRIGGER {} ON {};",
                quote_ident(&target_trigger.name),
                table
            )?;
        }
    }

    Ok(out.trim_end().to_string())
}
