//! Static registry of entity tables.
//!
//! # Responsibility
//! - Enumerate every table the store owns, in foreign-key dependency order.
//! - Verify a connection carries the registered tables/columns before
//!   repositories touch it.
//! - Drop registered tables for resets.
//!
//! # Invariants
//! - `ENTITY_TABLES` lists parents before children; drops run in reverse.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Entity kinds persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Status,
}

impl EntityKind {
    /// Lower-case noun used in log lines and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Status => "status",
        }
    }
}

/// Declared shape of one entity table.
#[derive(Debug, Clone, Copy)]
pub struct EntityTable {
    pub kind: EntityKind,
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const USERS_TABLE: EntityTable = EntityTable {
    kind: EntityKind::User,
    name: "users",
    columns: &["user_id", "user_email", "user_name", "user_last_name"],
};

pub const STATUSES_TABLE: EntityTable = EntityTable {
    kind: EntityKind::Status,
    name: "statuses",
    columns: &["status_id", "status_text", "user_id"],
};

/// Every registered entity table, parents first.
pub const ENTITY_TABLES: &[EntityTable] = &[USERS_TABLE, STATUSES_TABLE];

/// Returns the names of all user tables currently present in the database.
pub fn existing_tables(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name
         FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = Vec::new();
    while let Some(row) = rows.next()? {
        tables.push(row.get(0)?);
    }
    Ok(tables)
}

/// Returns registered tables that are absent from the database.
pub fn missing_tables(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let existing = existing_tables(conn)?;
    Ok(ENTITY_TABLES
        .iter()
        .map(|table| table.name)
        .filter(|name| !existing.iter().any(|current| current.as_str() == *name))
        .collect())
}

/// Checks that the connection is migrated and carries the given tables.
pub fn verify_schema(conn: &Connection, tables: &[EntityTable]) -> DbResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version == 0 {
        return Err(DbError::UninitializedConnection {
            expected_version: latest_version(),
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(DbError::MissingRequiredTable(table.name));
        }
        for &column in table.columns {
            if !table_has_column(conn, table.name, column)? {
                return Err(DbError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

/// Drops every registered table that exists and resets the schema version,
/// so the next `open_db` recreates the tables from scratch.
///
/// Returns the dropped table names in drop order.
pub fn drop_tables(conn: &mut Connection) -> DbResult<Vec<&'static str>> {
    let existing = existing_tables(conn)?;
    let to_drop: Vec<&'static str> = ENTITY_TABLES
        .iter()
        .rev()
        .map(|table| table.name)
        .filter(|name| existing.iter().any(|current| current.as_str() == *name))
        .collect();

    let tx = conn.transaction()?;
    for name in &to_drop {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {name};"))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;

    if to_drop.is_empty() {
        info!("event=db_drop_tables module=db status=ok dropped=none");
    } else {
        info!(
            "event=db_drop_tables module=db status=ok dropped={}",
            to_drop.join(",")
        );
    }
    Ok(to_drop)
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
