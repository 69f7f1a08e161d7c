//! Opens, writes to, and closes one physical output file (`spec.md` §4.5).
//!
//! Every new file gets a UTF-8 byte-order mark as its first three bytes.
//! Compressed sinks are layered `64 KiB buffer -> gzip -> 512 KiB buffer ->
//! file`, so the gzip stream sees block-sized writes from the caller and the
//! filesystem sees large writes from gzip, instead of either end seeing the
//! caller's per-record granularity.

use crate::diagnostics::{eprint_err, ErrorCode};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BYTE_ORDER_MARK: [u8; 3] = [0xEF, 0xBB, 0xBF];
const OUTER_BUFFER: usize = 64 * 1024;
const INNER_BUFFER: usize = 512 * 1024;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

enum SinkInner {
    Compressed(BufWriter<GzEncoder<BufWriter<File>>>),
    Plain(BufWriter<File>),
}

/// One open output stream backing one physical file.
pub struct Sink {
    inner: SinkInner,
    path: PathBuf,
}

impl Sink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut self.inner {
            SinkInner::Compressed(w) => w.write_all(buf),
            SinkInner::Plain(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            SinkInner::Compressed(w) => w.flush(),
            SinkInner::Plain(w) => w.flush(),
        }
    }
}

/// Opens `path`, truncating any existing file, writes the BOM, and retries
/// on failure with exponential backoff (1s doubling to a 60s cap) forever --
/// there is no give-up, per `spec.md` §4.5/§7.
pub fn open(path: &Path, compress: bool) -> Sink {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match try_open(path, compress) {
            Ok(sink) => return sink,
            Err(e) => {
                eprint_err(
                    ErrorCode::SinkOpen,
                    &format!("failed to open log file {}", path.display()),
                    &e,
                );
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

fn try_open(path: &Path, compress: bool) -> io::Result<Sink> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let inner = if compress {
        let file_buffer = BufWriter::with_capacity(INNER_BUFFER, file);
        let gz = GzEncoder::new(file_buffer, Compression::fast());
        SinkInner::Compressed(BufWriter::with_capacity(OUTER_BUFFER, gz))
    } else {
        SinkInner::Plain(BufWriter::with_capacity(OUTER_BUFFER, file))
    };

    let mut sink = Sink {
        inner,
        path: path.to_path_buf(),
    };
    sink.write_all(&BYTE_ORDER_MARK)?;
    sink.flush()?;
    Ok(sink)
}

/// Writes `bytes` (or, if `None`, just flushes), retrying indefinitely with
/// the same backoff schedule as [`open`] on I/O failure. Never returns an
/// error to the caller -- the writer thread's job is to eventually persist.
pub fn write(sink: &mut Sink, bytes: Option<&[u8]>) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        let result = match bytes {
            Some(buf) => sink.write_all(buf),
            None => sink.flush(),
        };
        match result {
            Ok(()) => return,
            Err(e) => {
                eprint_err(ErrorCode::SinkWrite, "write to log sink failed", &e);
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

/// Flushes and closes `sink`. Unlike [`open`]/[`write`], failures here are
/// logged once and not retried -- the sink is on its way out either way.
pub fn close(sink: Sink) {
    let path = sink.path.clone();
    let result = match sink.inner {
        SinkInner::Compressed(outer) => (|| -> io::Result<()> {
            let gz = outer
                .into_inner()
                .map_err(|e| e.into_error())?;
            let mut file_buffer = gz.finish()?;
            file_buffer.flush()
        })(),
        SinkInner::Plain(mut w) => w.flush(),
    };
    if let Err(e) = result {
        eprint_err(
            ErrorCode::SinkClose,
            &format!("failed to close log file {}", path.display()),
            &e,
        );
    }
}
