//! Rebuilds the [`ArchiveIndex`] from whatever is already on disk, once, at
//! writer startup (`spec.md` §4.3).

use super::index::{ArchiveIndex, OldLogFile};
use crate::diagnostics::{eprint_err, eprint_msg, ErrorCode};
use crate::filename_codec::FileNameCodec;
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

/// The boundary the writer is about to open a live file for, in the plain
/// fields [`crate::filename_codec::FileNameCodec`] encodes.
#[derive(Copy, Clone, Debug)]
pub struct CurrentBoundary {
    pub build: u32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: Option<u32>,
}

/// Runs the one-time startup scan described in `spec.md` §4.3: reconciles
/// the `latest`/`previous` mirror, deletes unrecognizable files under the
/// prefix, rebuilds [`ArchiveIndex`] entries grouped by boundary, resolves a
/// name collision at the about-to-be-opened current filename, and trims the
/// archive to quota.
///
/// Returns the path the writer should open as its fresh primary sink.
pub fn scan(
    directory: &Path,
    base: &str,
    current: CurrentBoundary,
    index: &ArchiveIndex,
    max_archive_bytes: u64,
) -> std::io::Result<std::path::PathBuf> {
    let codec = FileNameCodec::new(directory, base);
    let minute_present = current.minute.is_some();

    reconcile_mirror(&codec);

    if !directory.is_dir() {
        std::fs::create_dir_all(directory)?;
        return Ok(current_path(&codec, current, None));
    }

    // Lexically ordered directory listing (`spec.md` §4.3 step 3), built via
    // `glob` rather than a bare `read_dir` so the scan can be narrowed to a
    // single pattern if a future caller wants partitioned log directories.
    let pattern = directory.join("*").to_string_lossy().into_owned();
    let mut names: Vec<String> = glob::glob(&pattern)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();

    let prefix = format!("{base}-");
    let mirror_name = codec
        .mirror_path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let previous_name = codec
        .previous_mirror_path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut decoded: Vec<(i64, OldLogFile)> = Vec::new();
    let mut ignored = 0usize;

    for name in names {
        if name == mirror_name || name == previous_name {
            continue;
        }
        if !name.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase()) {
            continue;
        }
        let path = directory.join(&name);
        if !name.ends_with(".log.gz") {
            delete_unrecognized(&path);
            continue;
        }
        match codec.decode(&name, minute_present) {
            Ok(parsed) => {
                let start = boundary_start(&parsed, minute_present);
                let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                decoded.push((
                    start,
                    OldLogFile {
                        filename: path,
                        start_unix: start,
                        end_unix: start,
                        size_bytes: size,
                    },
                ));
            }
            Err(_) => {
                ignored += 1;
                delete_unrecognized(&path);
            }
        }
    }
    if ignored > 0 {
        eprint_msg(
            ErrorCode::Scan,
            &format!("deleted {ignored} unrecognizable file(s) under the log prefix"),
        );
    }

    decoded.sort_by(|a, b| a.0.cmp(&b.0));

    let now = Utc::now().timestamp();
    let mut distinct_starts: Vec<i64> = decoded.iter().map(|(s, _)| *s).collect();
    distinct_starts.dedup();

    for (i, start) in distinct_starts.iter().enumerate() {
        let end = distinct_starts.get(i + 1).copied().unwrap_or(now);
        for (s, file) in decoded.iter_mut() {
            if s == start {
                file.end_unix = end;
            }
        }
    }

    for (_, file) in decoded {
        index.append(file);
    }

    let resolved_current = resolve_current_collision(&codec, current, index, minute_present);

    index.trim(max_archive_bytes);

    Ok(resolved_current)
}

fn reconcile_mirror(codec: &FileNameCodec<'_>) {
    let mirror = codec.mirror_path();
    let previous = codec.previous_mirror_path();
    if mirror.exists() {
        if let Err(e) = std::fs::rename(&mirror, &previous) {
            eprint_err(ErrorCode::Scan, "failed to rotate latest.log to previous.log", &e);
        }
    }
}

fn delete_unrecognized(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            eprint_err(ErrorCode::Scan, "failed to delete unrecognizable log file", &e);
        }
    }
}

fn boundary_start(decoded: &crate::filename_codec::DecodedName, _minute_present: bool) -> i64 {
    Utc.with_ymd_and_hms(
        decoded.year,
        decoded.month,
        decoded.day,
        decoded.hour,
        decoded.minute.unwrap_or(0),
        0,
    )
    .single()
    .map(|dt: DateTime<Utc>| dt.timestamp())
    .unwrap_or(0)
}

fn current_path(
    codec: &FileNameCodec<'_>,
    current: CurrentBoundary,
    digit: Option<u32>,
) -> std::path::PathBuf {
    codec.encode(
        current.build,
        current.year,
        current.month,
        current.day,
        current.hour,
        current.minute,
        digit,
        true,
    )
}

/// If a file already exists at the literal filename the writer is about to
/// open, find the lowest free disambiguation digit, rename the existing file
/// out of the way, and update its entry in the index.
fn resolve_current_collision(
    codec: &FileNameCodec<'_>,
    current: CurrentBoundary,
    index: &ArchiveIndex,
    _minute_present: bool,
) -> std::path::PathBuf {
    let bare = current_path(codec, current, None);
    if !bare.exists() {
        return bare;
    }

    let mut digit = 1u32;
    let renamed = loop {
        let candidate = current_path(codec, current, Some(digit));
        if !candidate.exists() {
            break candidate;
        }
        digit += 1;
    };

    if let Err(e) = std::fs::rename(&bare, &renamed) {
        eprint_err(ErrorCode::Scan, "failed to rename colliding current log file", &e);
        return bare;
    }

    let size = std::fs::metadata(&renamed).map(|m| m.len()).unwrap_or(0);
    let start = Utc
        .with_ymd_and_hms(
            current.year,
            current.month,
            current.day,
            current.hour,
            current.minute.unwrap_or(0),
            0,
        )
        .single()
        .map(|dt: DateTime<Utc>| dt.timestamp())
        .unwrap_or(0);
    index.replace(
        &bare,
        OldLogFile {
            filename: renamed,
            start_unix: start,
            end_unix: Utc::now().timestamp(),
            size_bytes: size,
        },
    );

    bare
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn current(year: i32, month: u32, day: u32, hour: u32) -> CurrentBoundary {
        CurrentBoundary {
            build: 1,
            year,
            month,
            day,
            hour,
            minute: None,
        }
    }

    #[test]
    fn empty_directory_yields_empty_index() {
        let dir = TempDir::new().unwrap();
        let index = ArchiveIndex::new();
        let path = scan(dir.path(), "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert!(index.is_empty());
        assert_eq!(path, dir.path().join("node-1-2024-03-15-13.log.gz"));
    }

    #[test]
    fn deletes_files_with_foreign_or_broken_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("node-garbage.log.gz"), b"x").unwrap();
        std::fs::write(dir.path().join("node-1-2024-03-15-12.log"), b"x").unwrap();
        let index = ArchiveIndex::new();
        scan(dir.path(), "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert!(!dir.path().join("node-garbage.log.gz").exists());
        assert!(!dir.path().join("node-1-2024-03-15-12.log").exists());
    }

    #[test]
    fn reconstructs_archive_from_prior_rotated_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("node-1-2024-03-15-11.log.gz"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.path().join("node-1-2024-03-15-12.log.gz"), vec![0u8; 200]).unwrap();
        let index = ArchiveIndex::new();
        scan(dir.path(), "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert_eq!(index.len(), 2);
        let snapshot = index.snapshot();
        assert!(snapshot[0].start_unix < snapshot[1].start_unix);
        assert_eq!(snapshot[0].end_unix, snapshot[1].start_unix);
    }

    #[test]
    fn collision_at_current_filename_renames_with_digit() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("node-1-2024-03-15-13.log.gz"), vec![0u8; 50]).unwrap();
        let index = ArchiveIndex::new();
        let opened = scan(dir.path(), "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert_eq!(opened, dir.path().join("node-1-2024-03-15-13.log.gz"));
        assert!(!opened.exists(), "colliding file should have been renamed away");
        assert!(dir.path().join("node-1-2024-03-15-13-1.log.gz").exists());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn latest_mirror_is_renamed_to_previous_when_present() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("node-latest.log"), b"hello").unwrap();
        let index = ArchiveIndex::new();
        scan(dir.path(), "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert!(!dir.path().join("node-latest.log").exists());
        assert!(dir.path().join("node-previous.log").exists());
    }

    #[test]
    fn missing_directory_is_created_and_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nested/log/dir");
        let index = ArchiveIndex::new();
        let opened = scan(&missing, "node", current(2024, 3, 15, 13), &index, 1_000_000).unwrap();
        assert!(index.is_empty());
        assert!(missing.is_dir());
        assert_eq!(opened, missing.join("node-1-2024-03-15-13.log.gz"));
    }
}
