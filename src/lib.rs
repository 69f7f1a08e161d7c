#![deny(missing_docs)]
#![deny(clippy::all)]
#![allow(clippy::too_many_arguments)]

//! An asynchronous, rotating, gzip-compressed file logger for long-running
//! peer-to-peer node processes.
//!
//! Producers hand over already-formatted, newline-terminated byte slices to
//! a [`LoggerHandle`]; a single background writer thread drains a bounded,
//! byte-accounted queue into a compressed, time-rotated primary log file
//! (plus an optional uncompressed "latest" convenience mirror), enforces a
//! disk quota over the rotated archive, and shuts down by draining the queue
//! within a deadline.
//!
//! ```no_run
//! use swarmlog::LoggerBuilder;
//!
//! let (handle, _guard) = LoggerBuilder::new("/var/log/mynode", "mynode")
//!     .rotate_interval("1HOUR")
//!     .mirror_latest(true)
//!     .start()
//!     .expect("logger failed to start");
//!
//! handle.enqueue(b"hello world\n".to_vec());
//! // `_guard` drains the buffer and closes the sinks when it drops.
//! ```
//!
//! What this crate is *not*: a level-filtering facade (bring your own
//! threshold policy upstream), a record formatter (callers hand over already
//! formatted bytes), or a multi-process-safe rotator. See `DESIGN.md` for the
//! full scope boundary.

mod archive;
mod archive_report;
mod buffer;
mod builder;
mod closer;
mod diagnostics;
mod error;
mod filename_codec;
mod handle;
mod host_identity;
mod interval;
mod rotation_clock;
mod sink_writer;
mod switch_request;
mod writer_loop;

pub use crate::archive_report::LogFileReport;
pub use crate::builder::LoggerBuilder;
pub use crate::diagnostics::{set_error_channel, ErrorChannel};
pub use crate::error::LogWriterError;
pub use crate::handle::{LoggerHandle, ShutdownGuard};

/// Re-exported so callers can build the argument to
/// [`LoggerHandle::send_log_by_contained_date`] without depending on `chrono`
/// themselves.
pub use chrono::{DateTime, Utc};
