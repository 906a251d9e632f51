use clap::{Parser, Subcommand};
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};
use log::{debug, info};

use crate::config::{Config, LoggingConfig};
use crate::error::MemberDbError;
use crate::host::BuiltinHost;
use crate::procedure::{Bootstrap, FullReset, InitDatabase, MemberMigration, Procedure, Verify};

#[derive(Parser)]
#[command(
    name = "memberdb",
    version,
    about = "Maintenance procedures for the dealership association member database"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Back up and delete the database, then let the application recreate it
    Init,

    /// Create the member tables and seed accounts directly
    Bootstrap,

    /// Back up and delete the database and clear uploaded files
    Reset,

    /// Rebuild the member table with the current columns and constraints
    Migrate,

    /// Check an existing database without modifying it
    Verify,

    /// Print the effective configuration
    Config,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), MemberDbError> {
        let args = Cli::parse();

        let config = Config::load_config()?;
        // Dropping the handle would stop file logging
        let _logger = Self::setup_logging(&config.logging)?;
        debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

        Self::run_command(args.command, config)
    }

    fn setup_logging(logging: &LoggingConfig) -> Result<LoggerHandle, MemberDbError> {
        let spec = format!("memberdb={}", logging.memberdb);
        let logger = Logger::try_with_str(&spec)?;

        let handle = match &logging.log_dir {
            Some(dir) => logger
                .log_to_file(FileSpec::default().directory(dir).basename("memberdb"))
                .duplicate_to_stderr(Duplicate::Warn)
                .start()?,
            None => logger.start()?,
        };

        Ok(handle)
    }

    fn run_command(command: Command, config: Config) -> Result<(), MemberDbError> {
        let mut procedure: Box<dyn Procedure> = match command {
            Command::Init => Box::new(InitDatabase::new(
                config.paths.clone(),
                BuiltinHost::new(
                    config.paths.uploads_dir.clone(),
                    config.paths.uploads_sentinel.clone(),
                    config.security.pbkdf2_iterations,
                ),
            )),
            Command::Bootstrap => Box::new(Bootstrap::new(
                config.paths.clone(),
                config.security.pbkdf2_iterations,
            )),
            Command::Reset => Box::new(FullReset::new(config.paths.clone())),
            Command::Migrate => Box::new(MemberMigration::new(
                config.paths.db_path.clone(),
                config.migration.backup_suffix.clone(),
            )),
            Command::Verify => Box::new(Verify::new(config.paths.clone())),
            Command::Config => {
                print!("{}", config.to_toml()?);
                return Ok(());
            }
        };

        info!("Running procedure: {}", procedure.name());
        match procedure.run() {
            Ok(()) => {
                println!("\n✅ {} finished successfully", procedure.name());
                Ok(())
            }
            Err(e) => {
                println!("\n❌ {} failed", procedure.name());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_subcommands() {
        let cases = [
            ("init", Command::Init),
            ("bootstrap", Command::Bootstrap),
            ("reset", Command::Reset),
            ("migrate", Command::Migrate),
            ("verify", Command::Verify),
            ("config", Command::Config),
        ];

        for (arg, expected) in cases {
            let cli = Cli::try_parse_from(["memberdb", arg]).unwrap();
            assert_eq!(cli.command, expected);
        }
    }

    #[test]
    fn test_cli_parsing_requires_command() {
        assert!(Cli::try_parse_from(["memberdb"]).is_err());
    }

    #[test]
    fn test_cli_parsing_invalid_arguments() {
        let result = Cli::try_parse_from(["memberdb", "nonexistent-command"]);
        assert!(result.is_err(), "Should reject unknown commands");

        let result = Cli::try_parse_from(["memberdb", "migrate", "--force"]);
        assert!(result.is_err(), "Subcommands take no flags");
    }
}
