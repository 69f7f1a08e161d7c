use thiserror::Error;

/// Errors that can prevent a [`crate::LoggerBuilder`] from starting.
///
/// Everything past construction time is handled internally (printed via
/// [`crate::diagnostics`] and retried or absorbed) -- see the crate-level
/// docs for the rationale.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LogWriterError {
    /// The interval specification string didn't match `<digits><UNIT>[S]`.
    #[error("invalid rotation interval: {0:?}")]
    InvalidInterval(String),

    /// The configured base directory exists but is not a directory.
    #[error("log output path {0} is not a directory")]
    OutputBadDirectory(std::path::PathBuf),

    /// Spawning the writer or closer thread failed.
    #[error("failed to spawn background thread")]
    ThreadSpawn(#[source] std::io::Error),

    /// A filesystem operation during startup (scan, rename, open) failed.
    #[error("log output cannot be written")]
    OutputIo(#[from] std::io::Error),

    /// A mutex guarding internal state was poisoned by a panicking thread.
    #[error("internal lock was poisoned")]
    Poison,
}
