use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::{Connection, OpenFlags};

use crate::error::MemberDbError;

/// A column as SQLite reports it through `table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

impl ColumnInfo {
    pub fn nullability(&self) -> &'static str {
        if self.not_null {
            "NOT NULL"
        } else {
            "NULL"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub table: String,
    pub references: String,
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens the database file, creating it if it does not exist. The parent
    /// directory must already exist.
    pub fn open(db_path: &Path) -> Result<Self, MemberDbError> {
        let conn = Connection::open(db_path)?;
        debug!("Database opened at: {}", db_path.display());

        Ok(Database {
            conn,
            path: db_path.to_owned(),
        })
    }

    /// Opens an existing database file without ever creating one.
    pub fn open_existing(db_path: &Path, read_only: bool) -> Result<Self, MemberDbError> {
        if !db_path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Database file '{}' does not exist", db_path.display()),
            )
            .into());
        }

        let flags = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(db_path, flags)?;
        debug!(
            "Database opened at: {} (read_only={})",
            db_path.display(),
            read_only
        );

        Ok(Database {
            conn,
            path: db_path.to_owned(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_foreign_keys(conn: &Connection, enabled: bool) -> Result<(), MemberDbError> {
        conn.execute_batch(if enabled {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        })?;
        Ok(())
    }

    /// User tables in creation order, excluding SQLite's internal tables.
    pub fn table_names(conn: &Connection) -> Result<Vec<String>, MemberDbError> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY rowid",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, MemberDbError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, MemberDbError> {
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
        )?;

        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    decl_type: row.get(1)?,
                    not_null: row.get::<_, i64>(2)? != 0,
                    default: row.get(3)?,
                    primary_key: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns)
    }

    pub fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyInfo>, MemberDbError> {
        let mut stmt = conn.prepare(
            "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?) ORDER BY id, seq",
        )?;

        let keys = stmt
            .query_map([table], |row| {
                Ok(ForeignKeyInfo {
                    column: row.get(0)?,
                    table: row.get(1)?,
                    references: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(keys)
    }

    /// Indexes created with `CREATE INDEX`, sorted by name. Indexes SQLite
    /// builds for UNIQUE and PRIMARY KEY constraints are excluded.
    pub fn index_names(conn: &Connection, table: &str) -> Result<Vec<String>, MemberDbError> {
        let mut stmt = conn.prepare(
            "SELECT name FROM pragma_index_list(?) WHERE origin = 'c' ORDER BY name",
        )?;

        let names = stmt
            .query_map([table], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, MemberDbError> {
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
            row.get(0)
        })?;

        Ok(count)
    }
}
