//! `switchBaseFilename`/`waitForSwitch` (`spec.md` §6): a cross-thread
//! request to rename the base path, applied at the writer's next rotation
//! check rather than synchronously.

use std::time::Duration;
use swarmlog::LoggerBuilder;

#[test]
fn switch_moves_subsequent_output_to_the_new_base() {
    let dir = temp_dir::TempDir::new().unwrap();
    let (handle, mut guard) = LoggerBuilder::new(dir.path(), "node")
        .rotate_interval("HOUR")
        .flush_interval(Duration::from_millis(20))
        .start()
        .unwrap();

    handle.switch_base_filename(dir.path().join("renamed"));
    handle.wait_for_switch();

    handle.enqueue(b"after switch\n".to_vec());
    assert!(guard.close());

    let old_base_files: Vec<_> = glob::glob(&dir.path().join("node-*.log.gz").to_string_lossy())
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    let new_base_files: Vec<_> = glob::glob(&dir.path().join("renamed-*.log.gz").to_string_lossy())
        .unwrap()
        .filter_map(Result::ok)
        .collect();

    assert_eq!(new_base_files.len(), 1, "the post-switch file should use the new base");
    assert_eq!(
        old_base_files.len(),
        1,
        "the pre-switch file should have been archived by the rotation the switch piggybacks on"
    );
}
