use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use log::{error, info, warn, Level};
use logging_timer::timer;
use rusqlite::{params_from_iter, Connection};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::backup::Backup;
use crate::database::{ColumnInfo, Database};
use crate::error::MemberDbError;
use crate::models::MemberType;
use crate::schema::{Constraint, Shape, MEMBER};

use super::traits::Procedure;

/// Constraint-free copy of `member` the rows are normalized into.
pub const STAGING_TABLE: &str = "member_temp";
/// Fully constrained table that replaces `member` at the end.
pub const FINAL_TABLE: &str = "member_final";

// ============================================================================
// Member column migration
//
// SQLite can't add constraints or reorder columns in place, so the member
// table is rebuilt twice inside one transaction:
//
//   1. into an unconstrained staging table, rewriting legacy member types and
//      filling columns older files lack,
//   2. into a table carrying the full constraint set, after the staged rows
//      have been checked against those constraints.
//
// Each step is a `MigrationStage` so tests can stop at any point and inspect
// the intermediate tables.
// ============================================================================

#[derive(Display, EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    CreateStaging,
    CopyNormalized,
    SwapStaging,
    CreateFinal,
    Validate,
    CopyFinal,
    SwapFinal,
    RecreateIndexes,
}

impl MigrationStage {
    pub fn description(&self) -> &'static str {
        match self {
            MigrationStage::CreateStaging => "Creating unconstrained staging table",
            MigrationStage::CopyNormalized => "Copying and normalizing member rows",
            MigrationStage::SwapStaging => "Swapping staging table into place",
            MigrationStage::CreateFinal => "Creating constrained final table",
            MigrationStage::Validate => "Checking rows against the final constraints",
            MigrationStage::CopyFinal => "Copying rows into the final table",
            MigrationStage::SwapFinal => "Swapping final table into place",
            MigrationStage::RecreateIndexes => "Recreating member indexes",
        }
    }

    pub fn apply(&self, conn: &Connection) -> Result<(), MemberDbError> {
        match self {
            MigrationStage::CreateStaging => {
                conn.execute_batch(&MEMBER.create_sql(STAGING_TABLE, Shape::Unconstrained, false))?;
            }
            MigrationStage::CopyNormalized => copy_normalized(conn)?,
            MigrationStage::SwapStaging => swap_into_place(conn, STAGING_TABLE)?,
            MigrationStage::CreateFinal => {
                conn.execute_batch(&MEMBER.create_sql(FINAL_TABLE, Shape::Constrained, false))?;
            }
            MigrationStage::Validate => {
                let violations = find_violations(conn, MEMBER.name)?;
                if !violations.is_empty() {
                    return Err(MemberDbError::ConstraintViolations(violations));
                }
            }
            MigrationStage::CopyFinal => {
                let columns = MEMBER.column_names().join(", ");
                let copied = conn.execute(
                    &format!(
                        "INSERT INTO {} ({}) SELECT {} FROM {}",
                        FINAL_TABLE, columns, columns, MEMBER.name
                    ),
                    [],
                )?;
                info!("Copied {} rows into {}", copied, FINAL_TABLE);
            }
            MigrationStage::SwapFinal => swap_into_place(conn, FINAL_TABLE)?,
            MigrationStage::RecreateIndexes => {
                for sql in MEMBER.create_index_sql(false) {
                    conn.execute_batch(&sql)?;
                }
            }
        }

        Ok(())
    }
}

fn copy_normalized(conn: &Connection) -> Result<(), MemberDbError> {
    let live: HashSet<String> = Database::table_columns(conn, MEMBER.name)?
        .into_iter()
        .map(|c| c.name)
        .collect();

    if live.is_empty() {
        return Err(MemberDbError::Error(format!(
            "Table '{}' does not exist",
            MEMBER.name
        )));
    }

    let dropped: Vec<&str> = live
        .iter()
        .map(String::as_str)
        .filter(|name| MEMBER.column(name).is_none())
        .collect();
    if !dropped.is_empty() {
        warn!("Columns not carried over by the migration: {}", dropped.join(", "));
    }

    let select_exprs: Vec<String> = MEMBER
        .columns
        .iter()
        .map(|column| {
            if live.contains(column.name) {
                return column.name.to_owned();
            }
            info!("Adding column '{}' to {}", column.name, MEMBER.name);
            match column.default {
                Some(default) => default.to_owned(),
                None if column.is_text() => "''".to_owned(),
                None => "NULL".to_owned(),
            }
        })
        .collect();

    let copied = conn.execute(
        &format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            STAGING_TABLE,
            MEMBER.column_names().join(", "),
            select_exprs.join(", "),
            MEMBER.name
        ),
        [],
    )?;
    info!("Copied {} rows into {}", copied, STAGING_TABLE);

    normalize_member_types(conn)
}

/// Rewrites legacy member type labels in the staging table.
fn normalize_member_types(conn: &Connection) -> Result<(), MemberDbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT member_type FROM {} WHERE member_type IS NOT NULL",
        STAGING_TABLE
    ))?;
    let labels = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    for label in &labels {
        let normalized = MemberType::normalize(label);
        if normalized == label.as_str() {
            continue;
        }

        let rewritten = conn.execute(
            &format!("UPDATE {} SET member_type = ? WHERE member_type = ?", STAGING_TABLE),
            [normalized, label.as_str()],
        )?;
        info!("Rewrote member_type '{}' to '{}' in {} rows", label, normalized, rewritten);
    }

    Ok(())
}

fn swap_into_place(conn: &Connection, replacement: &str) -> Result<(), MemberDbError> {
    conn.execute_batch(&format!(
        "DROP TABLE {live};
         ALTER TABLE {replacement} RENAME TO {live};",
        live = MEMBER.name,
        replacement = replacement
    ))?;
    Ok(())
}

/// Every row of `table` that the constrained member declaration would reject,
/// one message per violated rule. Foreign keys are not enforced while the
/// table is rebuilt and are checked after commit instead.
pub fn find_violations(conn: &Connection, table: &str) -> Result<Vec<String>, MemberDbError> {
    let mut violations = Vec::new();

    for column in MEMBER.columns.iter().filter(|c| c.not_null) {
        let ids = query_ids(
            conn,
            &format!("SELECT id FROM {} WHERE {} IS NULL ORDER BY id", table, column.name),
            Vec::new(),
        )?;
        if !ids.is_empty() {
            violations.push(format!("{} is NULL in rows {}", column.name, id_list(&ids)));
        }
    }

    for constraint in MEMBER.constraints {
        match constraint {
            Constraint::Check {
                name,
                column,
                allowed,
            } => {
                let allowed = allowed();
                let placeholders = vec!["?"; allowed.len()].join(", ");
                let ids = query_ids(
                    conn,
                    &format!(
                        "SELECT id FROM {} WHERE {} IS NOT NULL AND {} NOT IN ({}) ORDER BY id",
                        table, column, column, placeholders
                    ),
                    allowed.clone(),
                )?;
                if !ids.is_empty() {
                    violations.push(format!(
                        "{}: {} outside ({}) in rows {}",
                        name,
                        column,
                        allowed.join(", "),
                        id_list(&ids)
                    ));
                }
            }
            Constraint::Unique { name, columns } => {
                let not_null: Vec<String> = columns.iter().map(|c| format!("{} IS NOT NULL", c)).collect();
                let mut stmt = conn.prepare(&format!(
                    "SELECT group_concat(id, ',') FROM {} WHERE {} GROUP BY {} HAVING COUNT(*) > 1",
                    table,
                    not_null.join(" AND "),
                    columns.join(", ")
                ))?;
                let groups = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                for group in groups {
                    violations.push(format!(
                        "{}: duplicate ({}) in rows [{}]",
                        name,
                        columns.join(", "),
                        group
                    ));
                }
            }
            Constraint::ForeignKey { .. } => {}
        }
    }

    Ok(violations)
}

fn query_ids(conn: &Connection, sql: &str, params: Vec<&str>) -> Result<Vec<i64>, MemberDbError> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn id_list(ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
    format!("[{}]", ids.join(", "))
}

/// Statistics printed once the migration has committed.
#[derive(Debug, PartialEq, Eq)]
pub struct MigrationSummary {
    pub total_members: i64,
    pub by_member_type: Vec<(String, i64)>,
    pub columns: Vec<ColumnInfo>,
}

impl MigrationSummary {
    pub fn collect(conn: &Connection) -> Result<Self, MemberDbError> {
        let total_members = Database::count_rows(conn, MEMBER.name)?;

        let mut stmt = conn.prepare(
            "SELECT member_type, COUNT(*) FROM member GROUP BY member_type ORDER BY member_type",
        )?;
        let by_member_type = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, i64)>, _>>()?;

        let columns = Database::table_columns(conn, MEMBER.name)?;

        Ok(MigrationSummary {
            total_members,
            by_member_type,
            columns,
        })
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total members: {}", self.total_members)?;
        writeln!(f, "Members by type:")?;
        for (member_type, count) in &self.by_member_type {
            writeln!(f, "  {}: {}", member_type, count)?;
        }
        writeln!(f)?;
        writeln!(f, "New table structure:")?;
        for column in &self.columns {
            writeln!(f, "  {} {} {}", column.name, column.decl_type, column.nullability())?;
        }
        Ok(())
    }
}

/// Evolves an existing member table to the current declaration.
pub struct MemberMigration {
    db_path: PathBuf,
    backup_suffix: String,
}

impl MemberMigration {
    pub fn new(db_path: PathBuf, backup_suffix: String) -> Self {
        MemberMigration {
            db_path,
            backup_suffix,
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        Backup::sibling_path(&self.db_path, &self.backup_suffix)
    }

    /// Backs the file up, then runs every stage in one transaction. On failure
    /// the transaction is rolled back and the backup is left in place.
    pub fn execute(&self) -> Result<MigrationSummary, MemberDbError> {
        if !self.db_path.is_file() {
            return Err(MemberDbError::Error(format!(
                "Database file not found: {}",
                self.db_path.display()
            )));
        }

        let backup_path = self.backup_path();
        Backup::copy(&self.db_path, &backup_path)?;
        println!("Backup created: {}", backup_path.display());

        let mut db = Database::open_existing(&self.db_path, false)?;

        if let Err(e) = Self::apply_without_foreign_keys(&mut db, MigrationStage::iter()) {
            error!("Migration rolled back: {}", e);
            println!("Error during migration: {}", e);
            println!("The original file is preserved at {}", backup_path.display());
            return Err(e);
        }

        Self::report_orphans(db.conn())?;

        MigrationSummary::collect(db.conn())
    }

    /// Runs `stages` in one transaction with foreign key enforcement off.
    /// A stage error is returned even if enforcement can't be restored.
    pub fn apply_without_foreign_keys<I>(db: &mut Database, stages: I) -> Result<(), MemberDbError>
    where
        I: IntoIterator<Item = MigrationStage>,
    {
        // Has no effect inside a transaction, so it's toggled around it
        Database::set_foreign_keys(db.conn(), false)?;

        match Self::apply_stages(db.conn_mut(), stages) {
            Ok(()) => Database::set_foreign_keys(db.conn(), true),
            Err(e) => {
                if let Err(fk_err) = Database::set_foreign_keys(db.conn(), true) {
                    warn!("Could not re-enable foreign keys: {}", fk_err);
                }
                Err(e)
            }
        }
    }

    /// Runs `stages` in order inside a single transaction.
    pub fn apply_stages<I>(conn: &mut Connection, stages: I) -> Result<(), MemberDbError>
    where
        I: IntoIterator<Item = MigrationStage>,
    {
        let tx = conn.transaction()?;

        for stage in stages {
            let _tmr = timer!(Level::Debug; "MigrationStage", "{}", stage);
            println!("{}...", stage.description());
            stage.apply(&tx)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn report_orphans(conn: &Connection) -> Result<(), MemberDbError> {
        let mut stmt = conn.prepare("SELECT rowid, \"parent\" FROM pragma_foreign_key_check(?)")?;
        let orphans = stmt
            .query_map([MEMBER.name], |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (rowid, parent) in orphans {
            warn!(
                "Member row {:?} references a missing {} row",
                rowid, parent
            );
        }

        Ok(())
    }
}

impl Procedure for MemberMigration {
    fn name(&self) -> &'static str {
        "Member column migration"
    }

    fn run(&mut self) -> Result<(), MemberDbError> {
        let summary = self.execute()?;

        print!("{}", summary);
        println!("Migration complete!");
        Ok(())
    }
}
