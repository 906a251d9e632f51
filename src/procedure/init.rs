use std::fs;
use std::path::PathBuf;

use log::{error, info};

use crate::backup::Backup;
use crate::config::PathsConfig;
use crate::database::Database;
use crate::error::MemberDbError;
use crate::host::HostApp;

use super::traits::Procedure;
use super::verify::Verify;

/// Moves any existing database into the backup directory and lets the host
/// application build a fresh one.
pub struct InitDatabase<H: HostApp> {
    paths: PathsConfig,
    host: H,
}

impl<H: HostApp> InitDatabase<H> {
    pub fn new(paths: PathsConfig, host: H) -> Self {
        InitDatabase { paths, host }
    }

    /// Returns where the previous database was backed up, if one existed.
    pub fn execute(&self) -> Result<Option<PathBuf>, MemberDbError> {
        let db_path = &self.paths.db_path;

        fs::create_dir_all(&self.paths.backup_dir)?;

        let backup = if db_path.exists() {
            let backup_path =
                Backup::timestamped_path(db_path, &self.paths.backup_dir, &Backup::timestamp());
            Backup::copy(db_path, &backup_path)?;
            println!("✅ Existing database backed up: {}", backup_path.display());

            Backup::remove(db_path)?;
            println!("✅ Existing database deleted: {}", db_path.display());
            Some(backup_path)
        } else {
            info!("No database file at {}", db_path.display());
            println!("ℹ️  No existing database file, creating a new one");
            None
        };

        fs::create_dir_all(self.paths.data_dir())?;

        let mut db = Database::open(db_path)?;
        self.host
            .ensure_initialized(&mut db)
            .and_then(|_| self.host.init_db_and_assets(&mut db))
            .inspect_err(|e| error!("Host initialization of {} failed: {}", db_path.display(), e))?;

        println!("✅ New database created");
        for table in Database::table_names(db.conn())? {
            println!("   - {}", table);
        }

        Ok(backup)
    }
}

impl<H: HostApp> Procedure for InitDatabase<H> {
    fn name(&self) -> &'static str {
        "Database initialization"
    }

    fn run(&mut self) -> Result<(), MemberDbError> {
        println!("=== Database initialization started ===");
        self.execute()?;

        let verify = Verify::new(self.paths.clone());
        let report = verify.execute()?;
        verify.print(&report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BuiltinHost;
    use pretty_assertions::assert_eq;
    use rusqlite::Connection;
    use std::path::Path;
    use tempfile::TempDir;

    struct FailingHost;

    impl HostApp for FailingHost {
        fn ensure_initialized(&self, _db: &mut Database) -> Result<(), MemberDbError> {
            Err(MemberDbError::Error("host unavailable".to_owned()))
        }

        fn init_db_and_assets(&self, _db: &mut Database) -> Result<(), MemberDbError> {
            Ok(())
        }
    }

    fn paths_in(dir: &Path) -> PathsConfig {
        PathsConfig {
            db_path: dir.join("data").join("busan.db"),
            backup_dir: dir.join("data").join("backups"),
            uploads_dir: dir.join("static").join("uploads"),
            uploads_sentinel: ".gitkeep".to_owned(),
        }
    }

    fn builtin_host(paths: &PathsConfig) -> BuiltinHost {
        BuiltinHost::new(paths.uploads_dir.clone(), paths.uploads_sentinel.clone(), 10)
    }

    #[test]
    fn test_init_fresh_directory() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());

        let backup = InitDatabase::new(paths.clone(), builtin_host(&paths))
            .execute()
            .unwrap();

        assert_eq!(backup, None);
        assert!(paths.backup_dir.is_dir());
        assert_eq!(fs::read_dir(&paths.backup_dir).unwrap().count(), 0);

        let conn = Connection::open(&paths.db_path).unwrap();
        assert_eq!(
            Database::table_names(&conn).unwrap(),
            vec!["partner_group", "member", "insurance_application"]
        );
        assert_eq!(Database::count_rows(&conn, "member").unwrap(), 2);
        assert!(paths.uploads_dir.join(".gitkeep").is_file());
    }

    #[test]
    fn test_init_backs_up_existing_database() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        fs::create_dir_all(paths.data_dir()).unwrap();
        {
            let conn = Connection::open(&paths.db_path).unwrap();
            conn.execute_batch("CREATE TABLE old_data (x INTEGER); INSERT INTO old_data VALUES (7);")
                .unwrap();
        }
        let original = fs::read(&paths.db_path).unwrap();

        let backup = InitDatabase::new(paths.clone(), builtin_host(&paths))
            .execute()
            .unwrap()
            .expect("existing database should be backed up");

        assert_eq!(backup.parent(), Some(paths.backup_dir.as_path()));
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("busan_backup_"));
        assert!(name.ends_with(".db"));
        assert_eq!(fs::read(&backup).unwrap(), original);

        let conn = Connection::open(&paths.db_path).unwrap();
        assert!(!Database::table_exists(&conn, "old_data").unwrap());
        assert!(Database::table_exists(&conn, "insurance_application").unwrap());
    }

    #[test]
    fn test_init_propagates_host_failure() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());

        let result = InitDatabase::new(paths.clone(), FailingHost).execute();

        assert!(matches!(result, Err(MemberDbError::Error(msg)) if msg == "host unavailable"));
    }

    #[test]
    fn test_run_includes_verification() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());

        let mut init = InitDatabase::new(paths.clone(), builtin_host(&paths));
        init.run().unwrap();

        let report = Verify::new(paths).execute().unwrap();
        assert!(report.issues().is_empty());
    }
}
