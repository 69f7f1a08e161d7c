//! The two handles producers and operators actually hold: the cheap,
//! `Clone`-able [`LoggerHandle`] (`spec.md` §6's producer API) and the
//! single, non-`Clone` [`ShutdownGuard`] whose `Drop` runs the shutdown
//! handshake.

use crate::archive::ArchiveIndex;
use crate::archive_report::{self, LogFileReport};
use crate::buffer::BoundedLogBuffer;
use crate::closer::{self, DRAIN_DEADLINE};
use crate::host_identity::HostIdentity;
use crate::switch_request::SwitchRequest;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub(crate) struct Inner {
    pub(crate) buffer: Arc<BoundedLogBuffer>,
    pub(crate) switch: Arc<SwitchRequest>,
    pub(crate) archive: Arc<ArchiveIndex>,
    pub(crate) host_identity: Arc<HostIdentity>,
    pub(crate) flush_delay_ms: Arc<AtomicU64>,
    pub(crate) max_archive_bytes: Arc<AtomicU64>,
    pub(crate) directory: PathBuf,
    pub(crate) base: String,
}

/// The cheap, cloneable producer/control handle. Every producer thread holds
/// one; `enqueue` never blocks beyond the buffer's mutex and never fails
/// (`spec.md` §6).
#[derive(Clone)]
pub struct LoggerHandle {
    pub(crate) inner: Arc<Inner>,
}

impl LoggerHandle {
    /// `enqueue(bytes)`.
    pub fn enqueue(&self, record: Vec<u8>) {
        self.inner.buffer.enqueue(record);
    }

    /// `setMaxListBytes(n)`: reconfigures the buffer's byte cap. Safe from
    /// any thread.
    pub fn set_max_list_bytes(&self, n: usize) {
        self.inner.buffer.set_max_bytes(n);
    }

    /// `setMaxBacklogNotBusy(ms)`: reconfigures how long the writer holds a
    /// below-threshold buffer before flushing anyway.
    pub fn set_max_backlog_not_busy(&self, ms: u64) {
        self.inner.flush_delay_ms.store(ms, Ordering::Relaxed);
    }

    /// `setMaxOldLogsSize(n)`: updates the archive quota and schedules
    /// `trim()` on a background task, non-blocking to the caller
    /// (`spec.md` §4.4).
    pub fn set_max_old_logs_size(&self, n: u64) {
        self.inner.max_archive_bytes.store(n, Ordering::Relaxed);
        let archive = Arc::clone(&self.inner.archive);
        std::thread::spawn(move || archive.trim(n));
    }

    /// `switchBaseFilename(path)`: requests that the writer rename its base
    /// path at the next rotation check.
    pub fn switch_base_filename(&self, new_base: PathBuf) {
        self.inner.switch.switch_base_filename(new_base);
    }

    /// `waitForSwitch()`: blocks until a pending switch has been applied, or
    /// returns immediately if none is outstanding.
    pub fn wait_for_switch(&self) {
        self.inner.switch.wait_for_switch();
    }

    /// `deleteAllOldLogFiles()`: drains the archive, deleting every rotated
    /// file it tracks. The file currently being written is untouched.
    pub fn delete_all_old_log_files(&self) {
        self.inner.archive.delete_all();
    }

    /// `listAvailableLogs()`.
    pub fn list_available_logs(&self) -> Vec<LogFileReport> {
        archive_report::list_available_logs(&self.inner.archive)
    }

    /// `sendLogByContainedDate(t, sink, pattern?)`.
    pub fn send_log_by_contained_date(
        &self,
        instant: DateTime<Utc>,
        sink: &mut dyn std::io::Write,
        pattern: Option<&str>,
    ) -> std::io::Result<()> {
        archive_report::send_log_by_contained_date(&self.inner.archive, instant, sink, pattern)
    }

    /// The process-wide host-identity token, if one was configured via
    /// [`crate::LoggerBuilder::host_identity`].
    pub fn host_identity(&self) -> Option<&str> {
        self.inner.host_identity.get()
    }

    /// The directory the logger is currently writing rotated files into.
    pub fn directory(&self) -> &std::path::Path {
        &self.inner.directory
    }

    /// The configured basename prefix for rotated files.
    pub fn base_name(&self) -> &str {
        &self.inner.base
    }
}

/// The single, non-`Clone` handle whose `Drop` runs the shutdown handshake:
/// Rust's RAII standing in for "register the closer thread with the process
/// shutdown hook" (`spec.md` §6). Dropping it (or calling
/// [`close`](Self::close) explicitly) signals the writer thread to drain and
/// waits up to the deadline for it to confirm.
pub struct ShutdownGuard {
    pub(crate) buffer: Arc<BoundedLogBuffer>,
    pub(crate) join: Option<JoinHandle<()>>,
}

impl ShutdownGuard {
    /// `close()`: sets `closed` and waits up to the 10s drain deadline.
    /// Idempotent -- a second call observes the buffer already closed and
    /// returns immediately once the writer (if still alive) confirms.
    /// Returns `true` if the writer drained and confirmed within the
    /// deadline.
    pub fn close(&mut self) -> bool {
        let drained = closer::close_and_wait(&self.buffer, DRAIN_DEADLINE);
        if let Some(join) = self.join.take() {
            join.join().ok();
        }
        drained
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.close();
        }
    }
}
