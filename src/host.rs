use std::fs;
use std::path::PathBuf;

use log::info;

use crate::database::Database;
use crate::error::MemberDbError;
use crate::schema::{Shape, ALL_TABLES};
use crate::seed::{OnConflict, Seeder};

/// The web application's own initialization entry points. The backup-and-reset
/// procedure delegates schema and seed creation to these instead of issuing
/// statements itself.
pub trait HostApp {
    /// Creates any missing tables and indexes. Safe to call repeatedly.
    fn ensure_initialized(&self, db: &mut Database) -> Result<(), MemberDbError>;

    /// Populates seed rows and on-disk assets that are not present yet.
    fn init_db_and_assets(&self, db: &mut Database) -> Result<(), MemberDbError>;
}

/// Host initialization rendered from the schema declarations, matching what
/// the application does on its first start.
pub struct BuiltinHost {
    uploads_dir: PathBuf,
    uploads_sentinel: String,
    pbkdf2_iterations: u32,
}

impl BuiltinHost {
    pub fn new(uploads_dir: PathBuf, uploads_sentinel: String, pbkdf2_iterations: u32) -> Self {
        BuiltinHost {
            uploads_dir,
            uploads_sentinel,
            pbkdf2_iterations,
        }
    }
}

impl HostApp for BuiltinHost {
    fn ensure_initialized(&self, db: &mut Database) -> Result<(), MemberDbError> {
        let tx = db.conn_mut().transaction()?;

        for table in ALL_TABLES.iter() {
            tx.execute_batch(&table.create_sql(table.name, Shape::Constrained, true))?;
            for sql in table.create_index_sql(true) {
                tx.execute_batch(&sql)?;
            }
        }

        tx.commit()?;
        info!("Schema ensured for {} tables", ALL_TABLES.len());
        Ok(())
    }

    fn init_db_and_assets(&self, db: &mut Database) -> Result<(), MemberDbError> {
        let tx = db.conn_mut().transaction()?;
        Seeder::insert_all(&tx, self.pbkdf2_iterations, OnConflict::Ignore)?;
        tx.commit()?;

        fs::create_dir_all(&self.uploads_dir)?;
        let sentinel = self.uploads_dir.join(&self.uploads_sentinel);
        if !sentinel.exists() {
            fs::write(&sentinel, b"")?;
        }
        info!("Uploads directory ready at {}", self.uploads_dir.display());

        Ok(())
    }
}
