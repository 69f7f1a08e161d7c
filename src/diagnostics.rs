//! Internal fault reporting.
//!
//! A logger cannot report its own write failures through `log` without
//! either a circular dependency or swallowing the failure silently. Instead,
//! every subsystem below the public API funnels its non-fatal errors through
//! [`eprint_err`]/[`eprint_msg`], which write to a process-wide, swappable
//! [`ErrorChannel`]. Nothing in here ever panics or propagates -- per the
//! core's "writer thread never exits except through the shutdown handshake"
//! policy.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

/// Tags which subsystem produced a diagnostic, for grep-ability in whatever
/// aggregates stderr for the node process.
#[derive(Copy, Clone, Debug)]
pub enum ErrorCode {
    SinkOpen,
    SinkWrite,
    SinkClose,
    Archive,
    Scan,
    Codec,
    Poison,
}
impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::SinkOpen => "sink_open",
            Self::SinkWrite => "sink_write",
            Self::SinkClose => "sink_close",
            Self::Archive => "archive",
            Self::Scan => "scan",
            Self::Codec => "codec",
            Self::Poison => "poison",
        }
    }
}

/// Where diagnostics go. Defaults to stderr; swap it with [`set_error_channel`].
#[derive(Clone, Debug)]
pub enum ErrorChannel {
    /// Write diagnostics to the process's standard error stream.
    Stderr,
    /// Write diagnostics to the process's standard output stream.
    Stdout,
    /// Append diagnostics to the file at this path, opening it as needed.
    File(PathBuf),
    /// Discard diagnostics.
    Null,
}
impl Default for ErrorChannel {
    fn default() -> Self {
        Self::Stderr
    }
}

fn channel() -> &'static RwLock<ErrorChannel> {
    static CHANNEL: OnceLock<RwLock<ErrorChannel>> = OnceLock::new();
    CHANNEL.get_or_init(|| RwLock::new(ErrorChannel::default()))
}

/// Redirects internal diagnostics. Safe to call from any thread, at any time.
pub fn set_error_channel(new_channel: ErrorChannel) {
    match channel().write() {
        Ok(mut guard) => *guard = new_channel,
        Err(poisoned) => *poisoned.into_inner() = new_channel,
    }
}

pub(crate) fn eprint_err(code: ErrorCode, msg: &str, err: &dyn std::error::Error) {
    emit(&format!(
        "[swarmlog][{code}] {msg}, caused by {err}",
        code = code.as_str()
    ));
}

pub(crate) fn eprint_msg(code: ErrorCode, msg: &str) {
    emit(&format!("[swarmlog][{code}] {msg}", code = code.as_str()));
}

fn emit(line: &str) {
    let guard = match channel().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match &*guard {
        ErrorChannel::Stderr => eprintln!("{line}"),
        ErrorChannel::Stdout => println!("{line}"),
        ErrorChannel::Null => {}
        ErrorChannel::File(path) => {
            if let Err(e) = append_to_file(path, line) {
                eprintln!("{line}");
                eprintln!("[swarmlog][sink_open] can't write diagnostics file, caused by {e}");
            }
        }
    }
}

fn append_to_file(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}
