use crate::error::MemberDbError;

/// A run-once maintenance procedure invoked from the command line.
///
/// Procedures print their own progress. `run` returning `Ok` is the only
/// success signal the caller consumes; the CLI turns it into the closing
/// status banner.
pub trait Procedure {
    /// Short name used in the closing banner (e.g., "Database reset")
    fn name(&self) -> &'static str;

    /// Execute the procedure to completion
    fn run(&mut self) -> Result<(), MemberDbError>;
}
