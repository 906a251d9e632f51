use std::path::PathBuf;

use log::{error, info};

use crate::backup::{Backup, PurgeReport};
use crate::config::PathsConfig;
use crate::error::MemberDbError;
use crate::seed::SEED_ADMIN;

use super::traits::Procedure;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResetReport {
    /// Where the previous database was copied, if there was one
    pub backup: Option<PathBuf>,
    pub purge: PurgeReport,
}

/// Backs up and deletes the database file and clears uploaded files.
/// Recreating the schema is left to the application's next start.
pub struct FullReset {
    paths: PathsConfig,
}

impl FullReset {
    pub fn new(paths: PathsConfig) -> Self {
        FullReset { paths }
    }

    pub fn execute(&self) -> Result<ResetReport, MemberDbError> {
        let db_path = &self.paths.db_path;
        let mut report = ResetReport::default();

        println!("=== Database reset started ===");

        if db_path.exists() {
            let backup_path = Backup::full_backup_path(db_path, &Backup::timestamp());
            Backup::copy(db_path, &backup_path).inspect_err(|e| {
                error!("Backup failed: {}", e);
                println!("❌ Backup failed: {}", e);
            })?;
            println!("✅ Existing database backed up: {}", backup_path.display());
            report.backup = Some(backup_path);

            Backup::remove(db_path).inspect_err(|e| {
                error!("Deleting database failed: {}", e);
                println!("❌ Failed to delete database file: {}", e);
            })?;
            println!("✅ Existing database file deleted");
        } else {
            info!("No database file at {}, nothing to back up", db_path.display());
            println!("ℹ️  No existing database file at {}", db_path.display());
        }

        report.purge = Backup::purge_uploads(&self.paths.uploads_dir, &self.paths.uploads_sentinel);
        if report.purge.failed > 0 {
            println!(
                "⚠️  Upload cleanup incomplete ({} removed, {} failures ignored)",
                report.purge.removed, report.purge.failed
            );
        } else {
            println!("✅ Upload cleanup complete ({} removed)", report.purge.removed);
        }

        Ok(report)
    }
}

impl Procedure for FullReset {
    fn name(&self) -> &'static str {
        "Database reset"
    }

    fn run(&mut self) -> Result<(), MemberDbError> {
        self.execute()?;

        println!("✅ Database reset complete!");
        println!("📝 Next steps:");
        println!("   1. Restart the application");
        println!("   2. Tables and seed data are created on first access");
        println!(
            "   3. Log in with the administrator account: {} / {}",
            SEED_ADMIN.username, SEED_ADMIN.password
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn paths_in(dir: &Path) -> PathsConfig {
        PathsConfig {
            db_path: dir.join("data").join("busan.db"),
            backup_dir: dir.join("data").join("backups"),
            uploads_dir: dir.join("static").join("uploads"),
            uploads_sentinel: ".gitkeep".to_owned(),
        }
    }

    #[test]
    fn test_reset_backs_up_and_deletes() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        fs::create_dir_all(paths.data_dir()).unwrap();
        fs::write(&paths.db_path, b"SQLite format 3\0 pretend").unwrap();
        fs::create_dir_all(&paths.uploads_dir).unwrap();
        fs::write(paths.uploads_dir.join(".gitkeep"), b"").unwrap();
        fs::write(paths.uploads_dir.join("scan.jpg"), b"jpg").unwrap();

        let report = FullReset::new(paths.clone()).execute().unwrap();

        let backup = report.backup.expect("a backup should be made");
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("busan.db.full_backup."));
        assert_eq!(fs::read(&backup).unwrap(), b"SQLite format 3\0 pretend");
        assert!(!paths.db_path.exists());
        assert_eq!(report.purge.removed, 1);
        assert!(paths.uploads_dir.join(".gitkeep").exists());
        assert!(!paths.uploads_dir.join("scan.jpg").exists());
    }

    #[test]
    fn test_reset_without_database_succeeds_without_backup() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());

        let report = FullReset::new(paths.clone()).execute().unwrap();

        assert_eq!(report, ResetReport::default());
        assert!(!paths.data_dir().exists());
    }

    #[test]
    fn test_reset_fails_when_backup_cannot_be_written() {
        let dir = TempDir::new().unwrap();
        let mut paths = paths_in(dir.path());
        // A directory at the database path can't be copied as a file
        paths.db_path = dir.path().join("busan.db");
        fs::create_dir_all(&paths.db_path).unwrap();

        let result = FullReset::new(paths.clone()).execute();

        assert!(result.is_err());
        assert!(paths.db_path.exists());
    }
}
