use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemberDbError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Configuration error: {0}")]
    ConfigError(Box<figment::Error>),

    #[error("Logger error: {0}")]
    LoggerError(#[from] flexi_logger::FlexiLoggerError),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Staged rows violate the target constraints:\n  {}", .0.join("\n  "))]
    ConstraintViolations(Vec<String>),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}

impl From<figment::Error> for MemberDbError {
    fn from(err: figment::Error) -> Self {
        MemberDbError::ConfigError(Box::new(err))
    }
}
