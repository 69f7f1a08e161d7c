//! The uncompressed `latest.log` mirror (`spec.md` §4.7.1 step 6) carries the
//! same records as the primary file, without gzip.

use std::time::Duration;
use swarmlog::LoggerBuilder;

#[test]
fn mirror_file_contains_the_same_records_uncompressed() {
    let dir = temp_dir::TempDir::new().unwrap();
    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .flush_interval(Duration::from_millis(20))
        .mirror_latest(true)
        .start()
        .unwrap();

    handle.enqueue(b"one\n".to_vec());
    handle.enqueue(b"two\n".to_vec());
    assert!(guard.close());

    let mirror_path = dir.path().join("node-latest.log");
    let content = std::fs::read(&mirror_path).unwrap();
    assert_eq!(&content[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(&content[3..], b"one\ntwo\n");
}

#[test]
fn mirror_can_be_disabled() {
    let dir = temp_dir::TempDir::new().unwrap();
    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .flush_interval(Duration::from_millis(20))
        .mirror_latest(false)
        .start()
        .unwrap();

    handle.enqueue(b"line\n".to_vec());
    assert!(guard.close());

    assert!(!dir.path().join("node-latest.log").exists());
}
