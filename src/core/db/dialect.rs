//! Per-backend SQL text.
//!
//! Statements are written once with `?` placeholders; the dialect of the open
//! backend decides how they reach the driver.

use std::borrow::Cow;

use crate::core::{AccessError, Result};

/// Table created by [`Dialect::create_table_sql`].
pub const SAMPLE_TABLE: &str = "foo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Rewrites `?` placeholders into the backend's positional syntax.
    ///
    /// SQLite takes `?` as is. PostgreSQL needs `$1, $2, ...`. Question marks
    /// inside single-quoted literals or double-quoted identifiers are kept.
    pub fn bind_parameters(self, sql: &str) -> Cow<'_, str> {
        if self == Dialect::Sqlite || !sql.contains('?') {
            return Cow::Borrowed(sql);
        }

        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0;
        let mut quote: Option<char> = None;
        for c in sql.chars() {
            match (quote, c) {
                (Some(q), c) if c == q => {
                    quote = None;
                    out.push(c);
                }
                (Some(_), c) => out.push(c),
                (None, '\'') | (None, '"') => {
                    quote = Some(c);
                    out.push(c);
                }
                (None, '?') => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                }
                (None, c) => out.push(c),
            }
        }
        Cow::Owned(out)
    }

    /// DDL for the sample table.
    ///
    /// PostgreSQL gets `BIGINT` so ids round-trip as `i64` on both backends.
    pub fn create_table_sql(self) -> String {
        let id_type = match self {
            Dialect::Sqlite => "INTEGER",
            Dialect::Postgres => "BIGINT",
        };
        format!(
            "CREATE TABLE {} (id {} NOT NULL PRIMARY KEY, name TEXT)",
            SAMPLE_TABLE, id_type
        )
    }

    pub fn drop_table_sql(self) -> String {
        format!("DROP TABLE IF EXISTS {}", SAMPLE_TABLE)
    }

    pub fn insert_sql(self, table: &str) -> Result<String> {
        let sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", checked_table(table)?);
        Ok(self.bind_parameters(&sql).into_owned())
    }

    pub fn select_all_sql(self, table: &str) -> Result<String> {
        Ok(format!("SELECT id, name FROM {}", checked_table(table)?))
    }

    pub fn select_one_sql(self, table: &str) -> Result<String> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?", checked_table(table)?);
        Ok(self.bind_parameters(&sql).into_owned())
    }

    pub fn delete_all_sql(self, table: &str) -> Result<String> {
        Ok(format!("DELETE FROM {}", checked_table(table)?))
    }
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
fn checked_table(table: &str) -> Result<&str> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(table)
    } else {
        Err(AccessError::invalid_query(format!("invalid table name '{}'", table)))
    }
}
