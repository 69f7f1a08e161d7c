//! The single dedicated background thread: drains the buffer, rotates files
//! on schedule, and performs the shutdown handshake (`spec.md` §4.7).

use crate::archive::{self, ArchiveIndex, CurrentBoundary, OldLogFile};
use crate::buffer::{BoundedLogBuffer, LogRecord};
use crate::diagnostics::{eprint_err, ErrorCode};
use crate::filename_codec::FileNameCodec;
use crate::interval::RotationField;
use crate::rotation_clock::{Boundary, RotationClock};
use crate::sink_writer::{self, Sink};
use crate::switch_request::SwitchRequest;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a single condvar wait is capped at, regardless of how far off
/// the next flush deadline is -- keeps the closer thread's 10s timeout
/// responsive (`spec.md` §4.7.2).
const WAIT_POLL_CAP: Duration = Duration::from_millis(500);

enum WaitOutcome {
    Record(LogRecord),
    FlushTimeout,
    Shutdown,
}

/// Owns both output sinks and all rotation bookkeeping. Runs on its own
/// thread for the life of the logger; nothing else touches `primary` or
/// `mirror`.
pub struct WriterLoop {
    buffer: Arc<BoundedLogBuffer>,
    switch: Arc<SwitchRequest>,
    archive: Arc<ArchiveIndex>,
    clock: RotationClock,

    directory: PathBuf,
    base: String,
    build: u32,
    mirror_enabled: bool,
    /// Backlog-not-busy flush delay, in milliseconds. An `Arc<AtomicU64>`
    /// rather than a plain `Duration` so `LoggerHandle::set_max_backlog_not_busy`
    /// can reconfigure it from any thread (`spec.md` §6).
    flush_delay_ms: Arc<AtomicU64>,
    /// Archive byte quota, reconfigurable at runtime the same way
    /// (`setMaxOldLogsSize`).
    max_archive_bytes: Arc<AtomicU64>,

    current_filename: PathBuf,
    current_start: DateTime<Utc>,
    current_end: DateTime<Utc>,
    primary: Sink,
    mirror: Option<Sink>,
    time_waiting_for_sync: Option<Instant>,
}

impl WriterLoop {
    /// Runs the `spec.md` §4.7 startup sequence: align to the current
    /// boundary, run the archive scanner, open the primary (and optional
    /// mirror) sink.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        directory: PathBuf,
        base: String,
        build: u32,
        mirror_enabled: bool,
        flush_delay_ms: Arc<AtomicU64>,
        max_archive_bytes: Arc<AtomicU64>,
        clock: RotationClock,
        buffer: Arc<BoundedLogBuffer>,
        switch: Arc<SwitchRequest>,
        archive: Arc<ArchiveIndex>,
    ) -> std::io::Result<Self> {
        let boundary = clock.align(Utc::now());
        let field = clock.interval().field;
        let current = current_boundary(&boundary, build, field);

        let opened_path = archive::scan(
            &directory,
            &base,
            current,
            &archive,
            max_archive_bytes.load(Ordering::Relaxed),
        )?;
        archive.pop_if_matches(&opened_path);

        let primary = sink_writer::open(&opened_path, true);
        let mirror = if mirror_enabled {
            let codec = FileNameCodec::new(&directory, &base);
            Some(sink_writer::open(&codec.mirror_path(), false))
        } else {
            None
        };

        Ok(Self {
            buffer,
            switch,
            archive,
            clock,
            directory,
            base,
            build,
            mirror_enabled,
            flush_delay_ms,
            max_archive_bytes,
            current_filename: opened_path,
            current_start: boundary.start,
            current_end: boundary.end,
            primary,
            mirror,
            time_waiting_for_sync: None,
        })
    }

    /// Runs the main loop until the shutdown handshake completes. Consumes
    /// `self` because the sinks it owns are closed on the way out.
    pub fn run(mut self) {
        loop {
            let now = Utc::now();
            if now > self.current_end || self.switch.is_pending() {
                self.rotate();
            }

            match self.wait_for_work() {
                WaitOutcome::Shutdown => {
                    sink_writer::write(&mut self.primary, None);
                    if let Some(mirror) = &mut self.mirror {
                        sink_writer::write(mirror, None);
                    }
                    sink_writer::close(self.primary);
                    if let Some(mirror) = self.mirror {
                        sink_writer::close(mirror);
                    }
                    let mut state = self.buffer.lock();
                    state.mark_closed_finished();
                    self.buffer.notify_all();
                    return;
                }
                WaitOutcome::FlushTimeout => {
                    sink_writer::write(&mut self.primary, None);
                    if let Some(mirror) = &mut self.mirror {
                        sink_writer::write(mirror, None);
                    }
                }
                WaitOutcome::Record(record) => {
                    sink_writer::write(&mut self.primary, Some(&record));
                    if let Some(mirror) = &mut self.mirror {
                        sink_writer::write(mirror, Some(&record));
                    }
                }
            }
        }
    }

    /// `spec.md` §4.7.1.
    fn rotate(&mut self) {
        if let Some(new_base) = self.switch.peek_pending() {
            if let Some(parent) = new_base.parent() {
                self.directory = parent.to_path_buf();
            }
            if let Some(file_name) = new_base.file_name() {
                self.base = file_name.to_string_lossy().into_owned();
            }
        }

        let codec = FileNameCodec::new(&self.directory, &self.base);
        let old_filename = self.current_filename.clone();
        let old_start = self.current_start;
        let old_end = self.current_end;

        let new_boundary = self.clock.next(Boundary {
            start: old_start,
            end: old_end,
        });
        let minute_present = self.clock.interval().field == RotationField::Minute;
        let new_filename = codec.encode(
            self.build,
            new_boundary.start.year(),
            new_boundary.start.month(),
            new_boundary.start.day(),
            new_boundary.start.hour(),
            if minute_present {
                Some(new_boundary.start.minute())
            } else {
                None
            },
            None,
            true,
        );

        // 1-2: the new filename is computed above; flush+close the
        // outgoing sink, then open the new one.
        sink_writer::write(&mut self.primary, None);
        let outgoing = std::mem::replace(&mut self.primary, sink_writer::open(&new_filename, true));
        sink_writer::close(outgoing);

        // 3: archive the closed file and enforce quota.
        let size = std::fs::metadata(&old_filename).map(|m| m.len()).unwrap_or(0);
        self.archive.append(OldLogFile {
            filename: old_filename,
            start_unix: old_start.timestamp(),
            end_unix: old_end.timestamp(),
            size_bytes: size,
        });
        self.archive
            .trim(self.max_archive_bytes.load(Ordering::Relaxed));

        // 4: advance.
        self.current_filename = new_filename;
        self.current_start = old_end;
        self.current_end = new_boundary.end;

        // 6: mirror rename chain -- guarded rename, per the §9 design note
        // resolving the source's unconditional-rename open question.
        if self.mirror_enabled {
            if let Some(mirror_sink) = self.mirror.take() {
                sink_writer::close(mirror_sink);
                let mirror_path = codec.mirror_path();
                let previous_path = codec.previous_mirror_path();
                if mirror_path.exists() {
                    if let Err(e) = std::fs::rename(&mirror_path, &previous_path) {
                        eprint_err(ErrorCode::SinkClose, "failed to rotate latest.log to previous.log", &e);
                    }
                }
                self.mirror = Some(sink_writer::open(&mirror_path, false));
            }
        }

        // 7: clear and notify any pending switch.
        if self.switch.is_pending() {
            self.switch.complete();
        }
    }

    /// `spec.md` §4.7.2, transcribed close to the letter: `timeWaitingForSync
    /// == -1` is `None` here, `maxWait == +∞` is `None` here too (the two
    /// distinct "unset" sentinels in the source collapse to one `Option`
    /// since the derivation `maxWait = timeWaitingForSync + flushDelay`
    /// already makes `timeWaitingForSync == -1 <=> maxWait == +∞`).
    fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms.load(Ordering::Relaxed))
    }

    fn wait_for_work(&mut self) -> WaitOutcome {
        let mut state = self.buffer.lock();
        let mut record = state.drain();

        while record.is_none() {
            if state.is_closed() {
                return WaitOutcome::Shutdown;
            }

            let now = Instant::now();
            let flush_delay = self.flush_delay();
            let max_wait = self.time_waiting_for_sync.map(|armed| armed + flush_delay);

            if max_wait.map_or(true, |deadline| now < deadline) {
                let wait_for = match max_wait {
                    None => WAIT_POLL_CAP,
                    Some(deadline) => deadline.saturating_duration_since(now).min(WAIT_POLL_CAP),
                };
                state = self.buffer.wait_timeout(state, wait_for);
                let now = Instant::now();

                if state.bytes() < self.buffer.write_threshold() {
                    if state.bytes() > 0 && max_wait.is_none() {
                        self.time_waiting_for_sync = Some(now);
                    }
                    if state.is_closed() {
                        record = state.drain();
                    }
                } else {
                    record = state.drain();
                }
            }

            if record.is_none() {
                let now = Instant::now();
                if self.time_waiting_for_sync.is_none() {
                    self.time_waiting_for_sync = Some(now);
                }
                let deadline = self.time_waiting_for_sync.expect("just armed above") + flush_delay;
                if now >= deadline {
                    self.time_waiting_for_sync = None;
                    return WaitOutcome::FlushTimeout;
                }
            }
        }

        WaitOutcome::Record(record.expect("loop only exits with a record"))
    }
}

fn current_boundary(boundary: &Boundary, build: u32, field: RotationField) -> CurrentBoundary {
    CurrentBoundary {
        build,
        year: boundary.start.year(),
        month: boundary.start.month(),
        day: boundary.start.day(),
        hour: boundary.start.hour(),
        minute: if field == RotationField::Minute {
            Some(boundary.start.minute())
        } else {
            None
        },
    }
}
