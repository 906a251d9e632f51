use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::error::MemberDbError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Outcome of a best-effort uploads cleanup.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    pub kept: usize,
    pub failed: usize,
}

pub struct Backup;

impl Backup {
    pub fn timestamp() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// `<backup_dir>/<stem>_backup_<stamp>.<ext>`, e.g. `busan_backup_20250115_103000.db`.
    pub fn timestamped_path(db_path: &Path, backup_dir: &Path, stamp: &str) -> PathBuf {
        let stem = db_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database".to_owned());

        let file_name = match db_path.extension() {
            Some(ext) => format!("{}_backup_{}.{}", stem, stamp, ext.to_string_lossy()),
            None => format!("{}_backup_{}", stem, stamp),
        };

        backup_dir.join(file_name)
    }

    /// `<db_path>.full_backup.<stamp>` next to the database file.
    pub fn full_backup_path(db_path: &Path, stamp: &str) -> PathBuf {
        Self::sibling_path(db_path, &format!("full_backup.{}", stamp))
    }

    /// `<db_path>.<suffix>` next to the database file.
    pub fn sibling_path(db_path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = db_path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Byte-for-byte copy of `src` to `dst`. Returns the number of bytes copied.
    pub fn copy(src: &Path, dst: &Path) -> Result<u64, MemberDbError> {
        let bytes = fs::copy(src, dst).map_err(|e| {
            MemberDbError::Error(format!(
                "Failed to back up '{}' to '{}': {}",
                src.display(),
                dst.display(),
                e
            ))
        })?;

        info!("Backed up {} ({} bytes) to {}", src.display(), bytes, dst.display());
        Ok(bytes)
    }

    pub fn remove(path: &Path) -> Result<(), MemberDbError> {
        fs::remove_file(path).map_err(|e| {
            MemberDbError::Error(format!("Failed to delete '{}': {}", path.display(), e))
        })?;

        info!("Deleted {}", path.display());
        Ok(())
    }

    /// Deletes every regular file directly inside `dir` except `sentinel`.
    /// Never fails: problems are logged and counted in the report.
    pub fn purge_uploads(dir: &Path, sentinel: &str) -> PurgeReport {
        let mut report = PurgeReport::default();

        if !dir.is_dir() {
            info!("Uploads directory {} does not exist, nothing to clean", dir.display());
            return report;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not list uploads directory {}: {}", dir.display(), e);
                report.failed += 1;
                return report;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Could not read entry in {}: {}", dir.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_name() == sentinel || !path.is_file() {
                report.kept += 1;
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!("Could not delete upload {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_layouts() {
        let db_path = Path::new("data/busan.db");

        assert_eq!(
            Backup::timestamped_path(db_path, Path::new("data/backups"), "20250115_103000"),
            PathBuf::from("data/backups/busan_backup_20250115_103000.db")
        );
        assert_eq!(
            Backup::full_backup_path(db_path, "20250115_103000"),
            PathBuf::from("data/busan.db.full_backup.20250115_103000")
        );
        assert_eq!(
            Backup::sibling_path(db_path, "simple_backup"),
            PathBuf::from("data/busan.db.simple_backup")
        );
        assert_eq!(
            Backup::timestamped_path(Path::new("members"), Path::new("b"), "x"),
            PathBuf::from("b/members_backup_x")
        );
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = Backup::timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("busan.db");
        let dst = dir.path().join("busan.db.simple_backup");
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        fs::write(&src, &payload).unwrap();

        let bytes = Backup::copy(&src, &dst).unwrap();

        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), payload);
        assert!(src.exists());
    }

    #[test]
    fn test_copy_and_remove_missing_file_fail() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.db");

        assert!(Backup::copy(&missing, &dir.path().join("copy.db")).is_err());
        assert!(Backup::remove(&missing).is_err());
    }

    #[test]
    fn test_purge_uploads_keeps_sentinel_and_directories() {
        let dir = TempDir::new().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(uploads.join("nested")).unwrap();
        fs::write(uploads.join(".gitkeep"), b"").unwrap();
        fs::write(uploads.join("license.pdf"), b"pdf").unwrap();
        fs::write(uploads.join("cert.png"), b"png").unwrap();
        fs::write(uploads.join("nested").join("inner.txt"), b"txt").unwrap();

        let report = Backup::purge_uploads(&uploads, ".gitkeep");

        assert_eq!(
            report,
            PurgeReport {
                removed: 2,
                kept: 2,
                failed: 0
            }
        );
        assert!(uploads.join(".gitkeep").exists());
        assert!(!uploads.join("license.pdf").exists());
        assert!(uploads.join("nested").join("inner.txt").exists());
    }

    #[test]
    fn test_purge_missing_directory() {
        let dir = TempDir::new().unwrap();
        let report = Backup::purge_uploads(&dir.path().join("nope"), ".gitkeep");
        assert_eq!(report, PurgeReport::default());
    }
}
