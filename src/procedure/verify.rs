use log::{info, warn};
use rusqlite::{Connection, OptionalExtension};

use crate::config::PathsConfig;
use crate::database::Database;
use crate::error::MemberDbError;
use crate::password::PasswordHash;
use crate::schema::{INSURANCE_APPLICATION, MEMBER};
use crate::seed::{SEED_ADMIN, SEED_PARTNER_ADMIN};

use super::traits::Procedure;

/// What the advisory post-checks found. Only `issues` decides whether
/// warnings were printed; nothing here fails the procedure.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub tables: Vec<String>,
    pub admin_present: bool,
    /// The administrator still logs in with the seeded password
    pub admin_password_matches: bool,
    pub missing_indexes: Vec<String>,
    pub partner_groups: Vec<(i64, String)>,
    pub missing_columns: Vec<String>,
    pub missing_foreign_keys: Vec<String>,
}

impl VerifyReport {
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.admin_present {
            issues.push(format!("Administrator account '{}' not found", SEED_ADMIN.username));
        } else if !self.admin_password_matches {
            issues.push(format!(
                "Administrator account '{}' does not accept the default password",
                SEED_ADMIN.username
            ));
        }
        for index in &self.missing_indexes {
            issues.push(format!("{} index '{}' missing", MEMBER.name, index));
        }
        if !self.tables.iter().any(|t| t == INSURANCE_APPLICATION.name) {
            issues.push(format!("Table '{}' not found", INSURANCE_APPLICATION.name));
        }
        for column in &self.missing_columns {
            issues.push(format!("{} column '{}' missing", INSURANCE_APPLICATION.name, column));
        }
        for fk in &self.missing_foreign_keys {
            issues.push(format!("{} foreign key {} missing", INSURANCE_APPLICATION.name, fk));
        }

        issues
    }
}

/// Read-only post-checks run after initialization, or on their own.
pub struct Verify {
    paths: PathsConfig,
}

impl Verify {
    pub fn new(paths: PathsConfig) -> Self {
        Verify { paths }
    }

    pub fn execute(&self) -> Result<VerifyReport, MemberDbError> {
        let db = Database::open_existing(&self.paths.db_path, true)?;
        let conn = db.conn();

        let admin_hash = Self::admin_hash(conn)?;
        let mut report = VerifyReport {
            tables: Database::table_names(conn)?,
            admin_present: admin_hash.is_some(),
            admin_password_matches: admin_hash
                .as_deref()
                .map(Self::accepts_seed_password)
                .unwrap_or(false),
            ..Default::default()
        };

        if Database::table_exists(conn, MEMBER.name)? {
            let indexes = Database::index_names(conn, MEMBER.name)?;
            report.missing_indexes = MEMBER
                .indexes
                .iter()
                .map(|index| index.name)
                .filter(|name| !indexes.iter().any(|i| i == name))
                .map(str::to_owned)
                .collect();
        }

        if Database::table_exists(conn, "partner_group")? {
            let mut stmt = conn.prepare("SELECT id, name FROM partner_group ORDER BY id")?;
            report.partner_groups = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
        }

        if report.tables.iter().any(|t| t == INSURANCE_APPLICATION.name) {
            let columns = Database::table_columns(conn, INSURANCE_APPLICATION.name)?;
            report.missing_columns = INSURANCE_APPLICATION
                .column_names()
                .into_iter()
                .filter(|name| !columns.iter().any(|c| c.name == *name))
                .map(str::to_owned)
                .collect();

            let keys = Database::foreign_keys(conn, INSURANCE_APPLICATION.name)?;
            report.missing_foreign_keys = INSURANCE_APPLICATION
                .foreign_keys()
                .into_iter()
                .filter(|(column, table, references)| {
                    !keys.iter().any(|k| {
                        k.column == *column && k.table == *table && k.references == *references
                    })
                })
                .map(|(column, table, references)| format!("{} -> {}({})", column, table, references))
                .collect();
        }

        Ok(report)
    }

    fn admin_hash(conn: &Connection) -> Result<Option<String>, MemberDbError> {
        if !Database::table_exists(conn, MEMBER.name)? {
            return Ok(None);
        }

        let hash = conn
            .query_row(
                "SELECT password_hash FROM member WHERE username = ? AND partner_group_id IS NULL",
                [SEED_ADMIN.username],
                |row| row.get(0),
            )
            .optional()?;

        Ok(hash)
    }

    fn accepts_seed_password(stored: &str) -> bool {
        match PasswordHash::verify(stored, SEED_ADMIN.password) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Administrator password hash is unreadable: {}", e);
                false
            }
        }
    }

    pub fn print(&self, report: &VerifyReport) {
        println!("📋 Tables: {}", report.tables.join(", "));

        if report.admin_present {
            println!("✅ Administrator account '{}' found", SEED_ADMIN.username);
        }

        println!("📋 Partner groups:");
        for (id, name) in &report.partner_groups {
            println!("   - {}: {}", id, name);
        }

        let issues = report.issues();
        for issue in &issues {
            warn!("{}", issue);
            println!("⚠️  {}", issue);
        }
        if issues.is_empty() {
            println!("✅ {} columns and foreign keys present", INSURANCE_APPLICATION.name);
        }

        let constraint_names: Vec<&str> = MEMBER.constraints.iter().filter_map(|c| c.name()).collect();

        println!("📝 Expected configuration:");
        println!("   - Database: {}", self.paths.db_path.display());
        println!("   - Backups: {}", self.paths.backup_dir.display());
        println!("   - Uploads: {}", self.paths.uploads_dir.display());
        println!(
            "   - Administrator login: {} / {}",
            SEED_ADMIN.username, SEED_ADMIN.password
        );
        println!(
            "   - Partner administrator login: {} / {}",
            SEED_PARTNER_ADMIN.username, SEED_PARTNER_ADMIN.password
        );
        println!("   - Member constraints: {}", constraint_names.join(", "));

        info!("Verification finished with {} issues", issues.len());
    }
}

impl Procedure for Verify {
    fn name(&self) -> &'static str {
        "Database verification"
    }

    fn run(&mut self) -> Result<(), MemberDbError> {
        let report = self.execute()?;
        self.print(&report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BuiltinHost, HostApp};
    use crate::procedure::Bootstrap;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn paths_in(dir: &Path) -> PathsConfig {
        PathsConfig {
            db_path: dir.join("busan.db"),
            backup_dir: dir.join("backups"),
            uploads_dir: dir.join("uploads"),
            uploads_sentinel: ".gitkeep".to_owned(),
        }
    }

    #[test]
    fn test_verify_host_initialized_database() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        {
            let host = BuiltinHost::new(paths.uploads_dir.clone(), ".gitkeep".to_owned(), 10);
            let mut db = Database::open(&paths.db_path).unwrap();
            host.ensure_initialized(&mut db).unwrap();
            host.init_db_and_assets(&mut db).unwrap();
        }

        let report = Verify::new(paths).execute().unwrap();

        assert_eq!(
            report.tables,
            vec!["partner_group", "member", "insurance_application"]
        );
        assert!(report.admin_present);
        assert!(report.admin_password_matches);
        assert!(report.missing_indexes.is_empty());
        assert_eq!(
            report.partner_groups,
            vec![(1, "부산광역시자동차매매사업조합".to_owned())]
        );
        assert!(report.issues().is_empty());
    }

    #[test]
    fn test_verify_reports_missing_pieces() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        Bootstrap::new(paths.clone(), 10).execute().unwrap();

        let report = Verify::new(paths.clone()).execute().unwrap();
        assert!(report.admin_present);
        assert_eq!(
            report.issues(),
            vec!["Table 'insurance_application' not found".to_owned()]
        );

        // A hand-made table lacking a column and a foreign key
        {
            let conn = Connection::open(&paths.db_path).unwrap();
            conn.execute_batch(
                "CREATE TABLE insurance_application (
                     id INTEGER NOT NULL,
                     member_id INTEGER NOT NULL,
                     partner_group_id INTEGER,
                     car_number VARCHAR(32),
                     customer_name VARCHAR(128),
                     created_at DATETIME,
                     PRIMARY KEY (id),
                     FOREIGN KEY(member_id) REFERENCES member (id)
                 );
                 DELETE FROM member WHERE username = 'hyundai';",
            )
            .unwrap();
        }

        let report = Verify::new(paths).execute().unwrap();
        assert!(!report.admin_present);
        assert_eq!(report.missing_columns, vec!["status".to_owned()]);
        assert_eq!(
            report.missing_foreign_keys,
            vec!["partner_group_id -> partner_group(id)".to_owned()]
        );
        assert_eq!(report.issues().len(), 3);
    }

    #[test]
    fn test_verify_reports_index_and_password_drift() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        Bootstrap::new(paths.clone(), 10).execute().unwrap();
        {
            let conn = Connection::open(&paths.db_path).unwrap();
            conn.execute_batch(
                "DROP INDEX idx_member_created_at;
                 UPDATE member SET password_hash = 'plaintext' WHERE username = 'hyundai';",
            )
            .unwrap();
        }

        let report = Verify::new(paths).execute().unwrap();

        assert!(report.admin_present);
        assert!(!report.admin_password_matches);
        assert_eq!(report.missing_indexes, vec!["idx_member_created_at".to_owned()]);
        assert_eq!(
            report.issues(),
            vec![
                "Administrator account 'hyundai' does not accept the default password".to_owned(),
                "member index 'idx_member_created_at' missing".to_owned(),
                "Table 'insurance_application' not found".to_owned(),
            ]
        );
    }

    #[test]
    fn test_verify_requires_database_file() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());

        assert!(Verify::new(paths.clone()).execute().is_err());
        assert!(!paths.db_path.exists());
    }
}
