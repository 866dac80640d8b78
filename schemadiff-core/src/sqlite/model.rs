//! In-memory schema model and DDL rendering for SQLite.
//!
//! Built once per diff run from the catalog and read-only afterwards. Tables
//! reference other tables only by name; every lookup goes through a
//! name-indexed search on the owning side's table list.

use crate::db::quote_ident;

/// Type names whose mutual conversions SQLite handles without data loss.
///
/// Types declared outside this set (VARCHAR, NUMERIC, ...) are treated as
/// incompatible and degrade to a drop-and-add pair.
const COMPATIBLE_TYPES: [&str; 4] = ["TEXT", "INTEGER", "REAL", "BLOB"];

/// A base table with its columns and dependent objects.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteTable {
    pub name: String,
    /// Columns in declared (ordinal) order. Position matters: the rebuild
    /// protocol's INSERT-SELECT mapping follows it.
    pub columns: Vec<SqliteColumn>,
    pub indexes: Vec<SqliteIndex>,
    pub triggers: Vec<SqliteTrigger>,
    pub foreign_keys: Vec<SqliteForeignKey>,
}

impl SqliteTable {
    pub fn column_by_name(&self, name: &str) -> Option<&SqliteColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_by_name(&self, name: &str) -> Option<&SqliteIndex> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn trigger_by_name(&self, name: &str) -> Option<&SqliteTrigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// The CREATE TABLE statement alone: column clauses followed by inline
    /// foreign-key clauses, one per line.
    pub fn create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("\t{}", c.definition()))
            .collect();
        lines.extend(
            self.foreign_keys
                .iter()
                .map(|fk| format!("\t{}", fk.definition())),
        );
        format!(
            "CREATE TABLE {} (\n{}\n);",
            quote_ident(&self.name),
            lines.join(",\n")
        )
    }

    pub fn create_indexes_sql(&self) -> String {
        self.indexes
            .iter()
            .map(|i| i.create_sql())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn create_triggers_sql(&self) -> String {
        self.triggers
            .iter()
            .map(|t| format!("{};", t.sql))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full creation DDL: table, then indexes, then triggers.
    pub fn create_full_sql(&self) -> String {
        let mut sql = self.create_table_sql();
        let indexes = self.create_indexes_sql();
        if !indexes.is_empty() {
            sql.push('\n');
            sql.push_str(&indexes);
        }
        let triggers = self.create_triggers_sql();
        if !triggers.is_empty() {
            sql.push('\n');
            sql.push_str(&triggers);
        }
        sql
    }
}

/// A table column as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteColumn {
    pub name: String,
    /// Declared type, verbatim from the catalog.
    pub type_name: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// Default expression, verbatim. `None` means no default was declared;
    /// an empty string is a declared (empty) default.
    pub default: Option<String>,
}

impl SqliteColumn {
    /// The column clause: `"name" TYPE [NOT NULL] [PRIMARY KEY] [DEFAULT expr]`.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.type_name);
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }
        def
    }

    /// Equality of everything except the name. Drives rename detection.
    pub fn attributes_equal(&self, other: &SqliteColumn) -> bool {
        self.type_name == other.type_name
            && self.not_null == other.not_null
            && self.primary_key == other.primary_key
            && self.default == other.default
    }

    /// Whether changing between this column's type and the other's preserves
    /// the stored data under SQLite's type affinity rules.
    pub fn type_change_compatible(&self, other: &SqliteColumn) -> bool {
        COMPATIBLE_TYPES.contains(&self.type_name.as_str())
            && COMPATIBLE_TYPES.contains(&other.type_name.as_str())
    }
}

/// An explicitly created index. The column list order is part of identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteIndex {
    pub table: String,
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl SqliteIndex {
    pub fn create_sql(&self) -> String {
        let unique = if self.unique { "UNIQUE " } else { "" };
        let columns = self
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE {}INDEX {} ON {} ({});",
            unique,
            quote_ident(&self.name),
            quote_ident(&self.table),
            columns
        )
    }
}

/// A trigger, carrying the stored CREATE TRIGGER text verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteTrigger {
    pub name: String,
    pub sql: String,
}

/// A view, carrying the stored CREATE VIEW text verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteView {
    pub name: String,
    pub sql: String,
}

/// One foreign-key constraint. `from` and `to` are parallel arrays in the
/// engine's reported sequence order; `table` is the referenced table's name,
/// never a pointer. Lookups go by name.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteForeignKey {
    pub table: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub on_update: String,
    pub on_delete: String,
}

impl SqliteForeignKey {
    /// The inline clause: `FOREIGN KEY (...) REFERENCES "t" (...)` plus any
    /// actions that differ from NO ACTION.
    pub fn definition(&self) -> String {
        let from = self
            .from
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let to = self
            .to
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut def = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            from,
            quote_ident(&self.table),
            to
        );
        if self.on_update != "NO ACTION" && !self.on_update.is_empty() {
            def.push_str(&format!(" ON UPDATE {}", self.on_update));
        }
        if self.on_delete != "NO ACTION" && !self.on_delete.is_empty() {
            def.push_str(&format!(" ON DELETE {}", self.on_delete));
        }
        def
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, type_name: &str) -> SqliteColumn {
        SqliteColumn {
            name: name.to_string(),
            type_name: type_name.to_string(),
            not_null: false,
            primary_key: false,
            default: None,
        }
    }

    #[test]
    fn test_column_definition_plain() {
        assert_eq!(column("name", "TEXT").definition(), "\"name\" TEXT");
    }

    #[test]
    fn test_column_definition_full() {
        let col = SqliteColumn {
            name: "id".to_string(),
            type_name: "INTEGER".to_string(),
            not_null: true,
            primary_key: true,
            default: Some("0".to_string()),
        };
        assert_eq!(
            col.definition(),
            "\"id\" INTEGER NOT NULL PRIMARY KEY DEFAULT 0"
        );
    }

    #[test]
    fn test_attributes_equal_ignores_name() {
        let a = column("name", "TEXT");
        let b = column("full_name", "TEXT");
        assert!(a.attributes_equal(&b));
    }

    #[test]
    fn test_attributes_equal_detects_default_presence() {
        let a = column("name", "TEXT");
        let mut b = column("other", "TEXT");
        b.default = Some(String::new());
        // An empty default is still a declared default.
        assert!(!a.attributes_equal(&b));
    }

    #[test]
    fn test_type_change_compatible() {
        assert!(column("a", "TEXT").type_change_compatible(&column("b", "INTEGER")));
        assert!(!column("a", "TEXT").type_change_compatible(&column("b", "VARCHAR(50)")));
        assert!(!column("a", "NUMERIC").type_change_compatible(&column("b", "INTEGER")));
    }

    #[test]
    fn test_index_create_sql() {
        let index = SqliteIndex {
            table: "users".to_string(),
            name: "idx_users_name".to_string(),
            columns: vec!["name".to_string(), "email".to_string()],
            unique: true,
        };
        assert_eq!(
            index.create_sql(),
            "CREATE UNIQUE INDEX \"idx_users_name\" ON \"users\" (\"name\", \"email\");"
        );
    }

    #[test]
    fn test_foreign_key_definition_omits_no_action() {
        let fk = SqliteForeignKey {
            table: "users".to_string(),
            from: vec!["user_id".to_string()],
            to: vec!["id".to_string()],
            on_update: "NO ACTION".to_string(),
            on_delete: "CASCADE".to_string(),
        };
        assert_eq!(
            fk.definition(),
            "FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_create_table_sql_with_foreign_key() {
        let table = SqliteTable {
            name: "posts".to_string(),
            columns: vec![column("id", "INTEGER"), column("user_id", "INTEGER")],
            indexes: vec![],
            triggers: vec![],
            foreign_keys: vec![SqliteForeignKey {
                table: "users".to_string(),
                from: vec!["user_id".to_string()],
                to: vec!["id".to_string()],
                on_update: "NO ACTION".to_string(),
                on_delete: "NO ACTION".to_string(),
            }],
        };
        assert_eq!(
            table.create_table_sql(),
            "CREATE TABLE \"posts\" (\n\t\"id\" INTEGER,\n\t\"user_id\" INTEGER,\n\tFOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\")\n);"
        );
    }

    #[test]
    fn test_create_full_sql_appends_indexes_and_triggers() {
        let table = SqliteTable {
            name: "users".to_string(),
            columns: vec![column("id", "INTEGER")],
            indexes: vec![SqliteIndex {
                table: "users".to_string(),
                name: "idx_id".to_string(),
                columns: vec!["id".to_string()],
                unique: false,
            }],
            triggers: vec![SqliteTrigger {
                name: "users_audit".to_string(),
                sql: "CREATE TRIGGER users_audit AFTER INSERT ON users BEGIN SELECT 1; END"
                    .to_string(),
            }],
            foreign_keys: vec![],
        };
        assert_eq!(
            table.create_full_sql(),
            "CREATE TABLE \"users\" (\n\t\"id\" INTEGER\n);\n\
             CREATE INDEX \"idx_id\" ON \"users\" (\"id\");\n\
             CREATE TRIGGER users_audit AFTER INSERT ON users BEGIN SELECT 1; END;"
        );
    }
}
