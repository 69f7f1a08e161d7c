//! The rotated-file ledger (`ArchiveIndex`) and the one-time startup
//! reconciliation that rebuilds it from disk (`ArchiveScanner`).

pub mod index;
pub mod scanner;

pub use index::{ArchiveIndex, OldLogFile};
pub use scanner::{scan, CurrentBoundary};
