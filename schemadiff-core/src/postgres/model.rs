//! In-memory schema model and DDL rendering for PostgreSQL.
//!
//! Dependent-object definitions are kept as the catalog-provided text
//! (`pg_get_constraintdef`, `pg_indexes.indexdef`, `pg_get_triggerdef`) and
//! compared textually; the emitter replays them verbatim.

use crate::db::quote_ident;

/// A base table with its columns and dependent objects.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresTable {
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<PostgresColumn>,
    pub constraints: Vec<PostgresConstraint>,
    pub indexes: Vec<PostgresIndex>,
    pub triggers: Vec<PostgresTrigger>,
}

impl PostgresTable {
    pub fn column_by_name(&self, name: &str) -> Option<&PostgresColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<&PostgresConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn index_by_name(&self, name: &str) -> Option<&PostgresIndex> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn trigger_by_name(&self, name: &str) -> Option<&PostgresTrigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// The CREATE TABLE statement alone: column clauses followed by inline
    /// constraint clauses, one per line.
    pub fn create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("\t{}", c.definition()))
            .collect();
        lines.extend(
            self.constraints
                .iter()
                .map(|c| format!("\t{}", c.clause())),
        );
        format!(
            "CREATE TABLE {} (\n{}\n);",
            quote_ident(&self.name),
            lines.join(",\n")
        )
    }

    /// Full creation DDL: table, then indexes, then triggers.
    pub fn create_full_sql(&self) -> String {
        let mut sql = self.create_table_sql();
        for index in &self.indexes {
            sql.push('\n');
            sql.push_str(&index.create_sql());
        }
        for trigger in &self.triggers {
            sql.push('\n');
            sql.push_str(&trigger.create_sql());
        }
        sql
    }
}

/// A table column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresColumn {
    pub name: String,
    /// `data_type`, verbatim from the catalog (e.g. `integer`, `text`).
    pub type_name: String,
    pub not_null: bool,
    /// `column_default`, verbatim. `None` means no default.
    pub default: Option<String>,
}

impl PostgresColumn {
    /// The column clause: `"name" type [NOT NULL] [DEFAULT expr]`.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.type_name);
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }
        def
    }

    /// Equality of everything except the name.
    pub fn attributes_equal(&self, other: &PostgresColumn) -> bool {
        self.type_name == other.type_name
            && self.not_null == other.not_null
            && self.default == other.default
    }
}

/// A table constraint from `pg_constraint`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConstraint {
    pub name: String,
    /// `contype`: p (primary), u (unique), c (check), f (foreign).
    pub kind: char,
    /// `pg_get_constraintdef` output, compared and replayed verbatim.
    pub definition: String,
}

impl PostgresConstraint {
    /// The inline clause: `CONSTRAINT "name" <def>`.
    pub fn clause(&self) -> String {
        format!("CONSTRAINT {} {}", quote_ident(&self.name), self.definition)
    }
}

/// An index from `pg_indexes`, excluding constraint-backed ones.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresIndex {
    pub table: String,
    pub name: String,
    /// Full `indexdef` statement, compared and replayed verbatim.
    pub definition: String,
}

impl PostgresIndex {
    pub fn create_sql(&self) -> String {
        format!("{};", self.definition)
    }
}

/// A user trigger from `pg_trigger`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresTrigger {
    pub name: String,
    /// `pg_get_triggerdef` output.
    pub definition: String,
}

impl PostgresTrigger {
    pub fn create_sql(&self) -> String {
        format!("{};", self.definition)
    }
}

/// A view from `information_schema.views`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresView {
    pub name: String,
    /// `view_definition` body; the catalog terminates it with a semicolon.
    pub definition: String,
}

impl PostgresView {
    pub fn create_sql(&self) -> String {
        format!("CREATE VIEW {} AS {}", quote_ident(&self.name), self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_definition() {
        let col = PostgresColumn {
            name: "name".to_string(),
            type_name: "text".to_string(),
            not_null: true,
            default: Some("'anon'::text".to_string()),
        };
        assert_eq!(col.definition(), "\"name\" text NOT NULL DEFAULT 'anon'::text");
    }

    #[test]
    fn test_constraint_clause() {
        let constraint = PostgresConstraint {
            name: "pk_users".to_string(),
            kind: 'p',
            definition: "PRIMARY KEY (id)".to_string(),
        };
        assert_eq!(constraint.clause(), "CONSTRAINT \"pk_users\" PRIMARY KEY (id)");
    }

    #[test]
    fn test_create_table_sql_with_constraint() {
        let table = PostgresTable {
            name: "users".to_string(),
            columns: vec![
                PostgresColumn {
                    name: "id".to_string(),
                    type_name: "integer".to_string(),
                    not_null: true,
                    default: None,
                },
                PostgresColumn {
                    name: "name".to_string(),
                    type_name: "text".to_string(),
                    not_null: false,
                    default: None,
                },
            ],
            constraints: vec![PostgresConstraint {
                name: "pk_users".to_string(),
                kind: 'p',
                definition: "PRIMARY KEY (id)".to_string(),
            }],
            indexes: vec![],
            triggers: vec![],
        };
        assert_eq!(
            table.create_table_sql(),
            "CREATE TABLE \"users\" (\n\
             \t\"id\" integer NOT NULL,\n\
             \t\"name\" text,\n\
             \tCONSTRAINT \"pk_users\" PRIMARY KEY (id)\n\
             );"
        );
    }

    #[test]
    fn test_view_create_sql() {
        let view = PostgresView {
            name: "user_ids".to_string(),
            definition: " SELECT id\n   FROM users;".to_string(),
        };
        assert_eq!(
            view.create_sql(),
            "CREATE VIEW \"user_ids\" AS  SELECT id\n   FROM users;"
        );
    }
}
