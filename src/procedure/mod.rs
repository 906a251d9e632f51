mod bootstrap;
mod init;
mod migrate;
mod reset;
mod traits;
mod verify;

pub use bootstrap::Bootstrap;
pub use init::InitDatabase;
pub use migrate::MemberMigration;
pub use reset::FullReset;
pub use traits::Procedure;
pub use verify::Verify;
