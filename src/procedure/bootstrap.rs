use std::fs;

use log::{error, info};

use crate::config::PathsConfig;
use crate::database::Database;
use crate::error::MemberDbError;
use crate::schema::{Shape, BOOTSTRAP_TABLES, MEMBER};
use crate::seed::{OnConflict, SeedCounts, Seeder, SEED_ADMIN, SEED_PARTNER_ADMIN, SEED_PARTNER_GROUP};

use super::traits::Procedure;

/// Creates the partner group and member tables directly over a raw
/// connection and inserts the seed accounts, without going through the host
/// application.
pub struct Bootstrap {
    paths: PathsConfig,
    pbkdf2_iterations: u32,
}

impl Bootstrap {
    pub fn new(paths: PathsConfig, pbkdf2_iterations: u32) -> Self {
        Bootstrap {
            paths,
            pbkdf2_iterations,
        }
    }

    /// All statements run in one transaction. Running against a populated
    /// file fails on the seed rows' primary keys and leaves it untouched.
    pub fn execute(&self) -> Result<SeedCounts, MemberDbError> {
        fs::create_dir_all(self.paths.data_dir())?;

        println!("Database initialization started...");
        let mut db = Database::open(&self.paths.db_path)?;

        let result = Self::create_and_seed(&mut db, self.pbkdf2_iterations);
        if let Err(e) = &result {
            error!("Bootstrap of {} rolled back: {}", db.path().display(), e);
            println!("❌ Database initialization failed: {}", e);
        }

        result
    }

    fn create_and_seed(db: &mut Database, pbkdf2_iterations: u32) -> Result<SeedCounts, MemberDbError> {
        let tx = db.conn_mut().transaction()?;

        for table in BOOTSTRAP_TABLES.iter() {
            tx.execute_batch(&table.create_sql(table.name, Shape::Constrained, true))?;
        }

        let counts = Seeder::insert_all(&tx, pbkdf2_iterations, OnConflict::Fail)?;

        for sql in MEMBER.create_index_sql(true) {
            tx.execute_batch(&sql)?;
        }

        tx.commit()?;
        info!("Bootstrap committed");

        Ok(counts)
    }
}

impl Procedure for Bootstrap {
    fn name(&self) -> &'static str {
        "Database initialization"
    }

    fn run(&mut self) -> Result<(), MemberDbError> {
        self.execute()?;

        println!("✅ Database initialization complete!");
        println!("📊 Created data:");
        println!("   - Partner group: {}", SEED_PARTNER_GROUP.name);
        println!(
            "   - Administrator account: {} / {}",
            SEED_ADMIN.username, SEED_ADMIN.password
        );
        println!(
            "   - Partner administrator: {} / {}",
            SEED_PARTNER_ADMIN.username, SEED_PARTNER_ADMIN.password
        );
        println!("You can now start the application.");
        Ok(())
    }
}
