//! The ledger of rotated files on disk, with a byte quota (`spec.md` §3,
//! §4.4).

use crate::diagnostics::{eprint_err, eprint_msg, ErrorCode};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One rotated, closed log file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OldLogFile {
    pub filename: PathBuf,
    /// Inclusive start of the window this file covers, as Unix seconds (kept
    /// timezone-free here; callers that need `DateTime<Utc>` reconstruct it).
    pub start_unix: i64,
    /// Exclusive end of the window.
    pub end_unix: i64,
    pub size_bytes: u64,
}

/// Insertion-ordered archive of [`OldLogFile`]s plus a running byte total,
/// guarded by two cooperating mutexes as `spec.md` §4.4/§5 prescribe: `totals`
/// is always acquired before `list`, so a caller that only needs the total
/// (e.g. to decide whether trimming is even necessary) never blocks on the
/// list lock.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    totals: Mutex<u64>,
    list: Mutex<VecDeque<OldLogFile>>,
}

impl ArchiveIndex {
    pub fn new() -> Self {
        Self {
            totals: Mutex::new(0),
            list: Mutex::new(VecDeque::new()),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        *lock_or_recover(&self.totals)
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.list).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `append`: push back, `totalBytes += size`.
    pub fn append(&self, file: OldLogFile) {
        let mut totals = lock_or_recover(&self.totals);
        let mut list = lock_or_recover(&self.list);
        *totals += file.size_bytes;
        list.push_back(file);
    }

    /// `trim()`: evict oldest-first until `totalBytes <= max`, deleting each
    /// evicted file from disk. If the total can't reach zero because the
    /// list is already empty, logs an inconsistency warning and stops
    /// instead of looping forever.
    pub fn trim(&self, max_archive_bytes: u64) {
        let mut totals = lock_or_recover(&self.totals);
        let mut list = lock_or_recover(&self.list);
        while *totals > max_archive_bytes {
            match list.pop_front() {
                Some(oldest) => {
                    if let Err(e) = std::fs::remove_file(&oldest.filename) {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            eprint_err(ErrorCode::Archive, "failed to delete archived log", &e);
                        }
                    }
                    *totals = totals.saturating_sub(oldest.size_bytes);
                }
                None => {
                    if *totals > 0 {
                        eprint_msg(
                            ErrorCode::Archive,
                            "archive byte total is positive but the index is empty",
                        );
                    }
                    break;
                }
            }
        }
    }

    /// `deleteAll`: drain every entry, deleting each file.
    pub fn delete_all(&self) {
        let mut totals = lock_or_recover(&self.totals);
        let mut list = lock_or_recover(&self.list);
        for file in list.drain(..) {
            if let Err(e) = std::fs::remove_file(&file.filename) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    eprint_err(ErrorCode::Archive, "failed to delete archived log", &e);
                }
            }
        }
        *totals = 0;
    }

    /// `snapshot`: a copy, oldest first, for report generation.
    pub fn snapshot(&self) -> Vec<OldLogFile> {
        lock_or_recover(&self.list).iter().cloned().collect()
    }

    /// Removes and returns the entry named `path`, if present. `WriterLoop`
    /// startup uses this as a defensive check for the case where the last
    /// archived entry happens to equal the filename about to become live;
    /// in practice the scanner's collision handling already renamed any such
    /// file away, so this is expected to be a no-op.
    pub fn pop_if_matches(&self, path: &std::path::Path) -> Option<OldLogFile> {
        let mut totals = lock_or_recover(&self.totals);
        let mut list = lock_or_recover(&self.list);
        let position = list.iter().position(|f| f.filename == path)?;
        let removed = list.remove(position)?;
        *totals = totals.saturating_sub(removed.size_bytes);
        Some(removed)
    }

    /// Replaces an entry in place (used by the startup scanner to fix up a
    /// file it had to rename away from a collision).
    pub fn replace(&self, old_filename: &std::path::Path, replacement: OldLogFile) {
        let mut totals = lock_or_recover(&self.totals);
        let mut list = lock_or_recover(&self.list);
        if let Some(entry) = list.iter_mut().find(|f| f.filename == old_filename) {
            *totals = totals.saturating_sub(entry.size_bytes) + replacement.size_bytes;
            *entry = replacement;
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[allow(dead_code)]
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
