mod backup;
mod cli;
mod config;
mod database;
mod error;
mod host;
mod models;
mod password;
mod procedure;
mod schema;
mod seed;

use cli::Cli;
use log::error;

fn main() {
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
