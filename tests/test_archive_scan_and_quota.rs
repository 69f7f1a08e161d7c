//! `ArchiveScanner` reconstructs the archive from whatever rotated files
//! already exist in the target directory at startup, and the quota from
//! scenario 6 in `spec.md` §8 is enforced immediately during that scan.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use swarmlog::LoggerBuilder;

fn write_fake_rotated_file(path: &std::path::Path, size: usize) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::fast());
    encoder.write_all(&vec![b'x'; size]).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn preexisting_rotated_files_are_picked_up_at_startup() {
    let dir = temp_dir::TempDir::new().unwrap();
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-00.log.gz"), 100);
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-01.log.gz"), 100);

    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .start()
        .unwrap();

    let logs = handle.list_available_logs();
    assert_eq!(logs.len(), 2);
    assert!(guard.close());
}

#[test]
fn archive_quota_trims_oldest_files_first_at_startup() {
    let dir = temp_dir::TempDir::new().unwrap();
    // Each compresses to well under 400 bytes on disk; what matters for the
    // quota is the *compressed file's* size on disk, so just make them
    // distinguishably large.
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-00.log.gz"), 4000);
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-01.log.gz"), 4000);
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-02.log.gz"), 4000);

    let total_before: u64 = ["00", "01", "02"]
        .iter()
        .map(|h| {
            std::fs::metadata(dir.path().join(format!("node-0-2020-01-01-{h}.log.gz")))
                .unwrap()
                .len()
        })
        .sum();

    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .max_archive_bytes(total_before - 1)
        .start()
        .unwrap();

    let logs = handle.list_available_logs();
    assert!(logs.len() < 3, "at least the oldest file should have been evicted");
    assert!(!dir.path().join("node-0-2020-01-01-00.log.gz").exists());
    assert!(guard.close());
}

#[test]
fn delete_all_old_log_files_clears_the_archive_but_not_the_live_file() {
    let dir = temp_dir::TempDir::new().unwrap();
    write_fake_rotated_file(&dir.path().join("node-0-2020-01-01-00.log.gz"), 50);

    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .start()
        .unwrap();

    assert_eq!(handle.list_available_logs().len(), 1);
    handle.delete_all_old_log_files();
    assert_eq!(handle.list_available_logs().len(), 0);
    assert!(!dir.path().join("node-0-2020-01-01-00.log.gz").exists());

    handle.enqueue(b"still alive\n".to_vec());
    assert!(guard.close());
}
