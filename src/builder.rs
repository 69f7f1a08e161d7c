//! The fluent construction surface (`spec.md` §6's implicit constructor
//! argument list, made explicit), grounded on
//! `writers/file_log_writer/builder.rs` and `logger.rs`.

use crate::archive::ArchiveIndex;
use crate::buffer::BoundedLogBuffer;
use crate::error::LogWriterError;
use crate::handle::{Inner, LoggerHandle, ShutdownGuard};
use crate::host_identity::HostIdentity;
use crate::interval::RotationInterval;
use crate::rotation_clock::RotationClock;
use crate::switch_request::SwitchRequest;
use crate::writer_loop::WriterLoop;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{mpsc, Arc};
use std::time::Duration;

const DEFAULT_MAX_BUFFER_COUNT: usize = 100_000;
const DEFAULT_MAX_BUFFER_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 1024 * 1024 * 1024;
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

/// Builds and starts the asynchronous rotating file logger. `directory` and
/// `base` together determine the rotated filenames (`spec.md` §4.2):
/// `<directory>/<base>-<build>-YYYY-MM-DD-HH[-MM][-n].log.gz`.
pub struct LoggerBuilder {
    directory: PathBuf,
    base: String,
    build_number: u32,
    rotate_interval: String,
    max_buffer_count: usize,
    max_buffer_bytes: usize,
    max_archive_bytes: u64,
    flush_interval: Duration,
    mirror_latest: bool,
    host_identity: Option<String>,
}

impl LoggerBuilder {
    /// Starts a builder for a logger that rotates files under `directory`
    /// with filenames prefixed `<base>-`.
    pub fn new(directory: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base: base.into(),
            build_number: 0,
            rotate_interval: "HOUR".to_string(),
            max_buffer_count: DEFAULT_MAX_BUFFER_COUNT,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            mirror_latest: true,
            host_identity: None,
        }
    }

    /// The build number embedded in every rotated filename (`spec.md` §4.2).
    /// Defaults to `0`.
    pub fn build_number(mut self, n: u32) -> Self {
        self.build_number = n;
        self
    }

    /// The rotation interval grammar from `spec.md` §4.1/§6, e.g.
    /// `"5MINUTES"`, `"HOUR"`, `"3DAYS"`. Parsed lazily at [`start`](Self::start)
    /// so a bad string surfaces as `LogWriterError::InvalidInterval` rather
    /// than panicking the builder chain.
    pub fn rotate_interval(mut self, spec: impl Into<String>) -> Self {
        self.rotate_interval = spec.into();
        self
    }

    /// The buffer's record-count cap (`maxCount`, `spec.md` §3/§4.6).
    pub fn max_buffer_count(mut self, n: usize) -> Self {
        self.max_buffer_count = n;
        self
    }

    /// The buffer's byte-accounted cap (`maxBytes`, `spec.md` §3/§4.6).
    pub fn max_buffer_bytes(mut self, n: usize) -> Self {
        self.max_buffer_bytes = n;
        self
    }

    /// The archive's byte quota enforced by `ArchiveIndex::trim` (`spec.md`
    /// §4.4).
    pub fn max_archive_bytes(mut self, n: u64) -> Self {
        self.max_archive_bytes = n;
        self
    }

    /// How long the writer holds a below-threshold buffer before flushing
    /// anyway (`flushTime`/`flushDelay`, `spec.md` §4.7.2). Defaults to 1s.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Whether to also maintain the uncompressed `<base>-latest.log` mirror
    /// (`spec.md` §4.7.1 step 6). Defaults to `true`.
    pub fn mirror_latest(mut self, enabled: bool) -> Self {
        self.mirror_latest = enabled;
        self
    }

    /// Threads a host-identity token through construction instead of a
    /// mutable global (`spec.md` §9).
    pub fn host_identity(mut self, identity: impl Into<String>) -> Self {
        self.host_identity = Some(identity.into());
        self
    }

    /// Parses the interval, validates the output directory, spawns the
    /// writer thread, and returns once that thread has either opened its
    /// first sink or failed to start. The `LoggerHandle` is the producer
    /// surface; the `ShutdownGuard` must be held for the logger's lifetime --
    /// dropping it runs the shutdown handshake (`spec.md` §6).
    pub fn start(self) -> Result<(LoggerHandle, ShutdownGuard), LogWriterError> {
        let interval = RotationInterval::parse(&self.rotate_interval)
            .map_err(LogWriterError::InvalidInterval)?;

        if self.directory.is_file() {
            return Err(LogWriterError::OutputBadDirectory(self.directory));
        }

        let buffer = Arc::new(BoundedLogBuffer::new(
            self.max_buffer_count,
            self.max_buffer_bytes,
        ));
        let switch = Arc::new(SwitchRequest::new());
        let archive = Arc::new(ArchiveIndex::new());
        let host_identity = Arc::new(HostIdentity::new());
        if let Some(identity) = self.host_identity {
            host_identity.set(identity);
        }
        let flush_delay_ms = Arc::new(AtomicU64::new(self.flush_interval.as_millis() as u64));
        let max_archive_bytes = Arc::new(AtomicU64::new(self.max_archive_bytes));
        let clock = RotationClock::new(interval);

        let directory = self.directory.clone();
        let base = self.base.clone();

        let buffer_t = Arc::clone(&buffer);
        let switch_t = Arc::clone(&switch);
        let archive_t = Arc::clone(&archive);
        let flush_delay_ms_t = Arc::clone(&flush_delay_ms);
        let max_archive_bytes_t = Arc::clone(&max_archive_bytes);
        let directory_t = directory.clone();
        let base_t = base.clone();
        let build_number = self.build_number;
        let mirror_latest = self.mirror_latest;

        let (startup_tx, startup_rx) = mpsc::sync_channel::<std::io::Result<()>>(1);

        let join = std::thread::Builder::new()
            .name("swarmlog-writer".to_string())
            .spawn(move || {
                match WriterLoop::start(
                    directory_t,
                    base_t,
                    build_number,
                    mirror_latest,
                    flush_delay_ms_t,
                    max_archive_bytes_t,
                    clock,
                    buffer_t,
                    switch_t,
                    archive_t,
                ) {
                    Ok(writer) => {
                        startup_tx.send(Ok(())).ok();
                        writer.run();
                    }
                    Err(e) => {
                        startup_tx.send(Err(e)).ok();
                    }
                }
            })
            .map_err(LogWriterError::ThreadSpawn)?;

        match startup_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                join.join().ok();
                return Err(LogWriterError::OutputIo(e));
            }
            Err(_) => {
                join.join().ok();
                return Err(LogWriterError::Poison);
            }
        }

        let inner = Arc::new(Inner {
            buffer: Arc::clone(&buffer),
            switch,
            archive,
            host_identity,
            flush_delay_ms,
            max_archive_bytes,
            directory,
            base,
        });

        Ok((
            LoggerHandle { inner },
            ShutdownGuard {
                buffer,
                join: Some(join),
            },
        ))
    }
}
