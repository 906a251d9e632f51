use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::MemberDbError;

pub const CONFIG_FILE: &str = "memberdb.toml";
const ENV_PREFIX: &str = "MEMBERDB_";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    pub memberdb: String,
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const MEMBERDB_LEVEL: &str = "warn";

    fn default() -> Self {
        LoggingConfig {
            memberdb: Self::MEMBERDB_LEVEL.to_string(),
            log_dir: None,
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.memberdb.clone();
        self.memberdb = self.memberdb.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.memberdb.as_str()) {
            eprintln!(
                "Config error: memberdb log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::MEMBERDB_LEVEL
            );
            self.memberdb = Self::MEMBERDB_LEVEL.to_owned();
        }
    }
}

/// Locations of everything the procedures touch on disk. Relative paths
/// resolve against the working directory of the invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PathsConfig {
    pub db_path: PathBuf,
    pub backup_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub uploads_sentinel: String,
}

impl PathsConfig {
    fn default() -> Self {
        PathsConfig {
            db_path: PathBuf::from("data").join("busan.db"),
            backup_dir: PathBuf::from("data").join("backups"),
            uploads_dir: PathBuf::from("static").join("uploads"),
            uploads_sentinel: ".gitkeep".to_owned(),
        }
    }

    /// Directory holding the database file.
    pub fn data_dir(&self) -> &Path {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn ensure_valid(&mut self) {
        if self.uploads_sentinel.trim().is_empty() {
            eprintln!("Config error: uploads sentinel is empty - using default of '.gitkeep'");
            self.uploads_sentinel = ".gitkeep".to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MigrationConfig {
    pub backup_suffix: String,
}

impl MigrationConfig {
    const BACKUP_SUFFIX: &str = "simple_backup";

    fn default() -> Self {
        MigrationConfig {
            backup_suffix: Self::BACKUP_SUFFIX.to_owned(),
        }
    }

    fn ensure_valid(&mut self) {
        let trimmed = self.backup_suffix.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            eprintln!(
                "Config error: migration backup suffix is empty - using default of '{}'",
                Self::BACKUP_SUFFIX
            );
            self.backup_suffix = Self::BACKUP_SUFFIX.to_owned();
        } else {
            self.backup_suffix = trimmed.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecurityConfig {
    pub pbkdf2_iterations: u32,
}

impl SecurityConfig {
    const PBKDF2_ITERATIONS: u32 = 600_000;

    fn default() -> Self {
        SecurityConfig {
            pbkdf2_iterations: Self::PBKDF2_ITERATIONS,
        }
    }

    fn ensure_valid(&mut self) {
        if self.pbkdf2_iterations == 0 {
            eprintln!(
                "Config error: pbkdf2 iterations must be positive - using default of {}",
                Self::PBKDF2_ITERATIONS
            );
            self.pbkdf2_iterations = Self::PBKDF2_ITERATIONS;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    pub migration: MigrationConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            migration: MigrationConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration: built-in defaults, then `memberdb.toml` in the
    /// working directory if present, then `MEMBERDB_` environment variables
    /// (sections separated by `__`, e.g. `MEMBERDB_PATHS__DB_PATH`).
    pub fn load_config() -> Result<Self, MemberDbError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(config_path: &Path) -> Result<Self, MemberDbError> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract()?;
        config.ensure_valid();

        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, MemberDbError> {
        toml::to_string_pretty(self)
            .map_err(|e| MemberDbError::Error(format!("Failed to serialize config: {}", e)))
    }

    fn ensure_valid(&mut self) {
        self.paths.ensure_valid();
        self.migration.ensure_valid();
        self.security.ensure_valid();
        self.logging.ensure_valid();
    }
}
