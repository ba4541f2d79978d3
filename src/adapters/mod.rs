pub mod branch_store;
pub mod directory;
pub mod liveness;

pub use branch_store::{PgBranchConnector, PgBranchSession};
pub use directory::PostgresBranchRegistry;
pub use liveness::TcpLivenessProbe;
