//! Forces fast rotation with a short interval and a small archive quota, then
//! switches the base filename mid-run, mirroring the operations a
//! long-running node would perform without restarting the process.

use std::thread::sleep;
use std::time::Duration;
use swarmlog::LoggerBuilder;

fn main() -> Result<(), swarmlog::LogWriterError> {
    let (handle, mut guard) = LoggerBuilder::new("log_files", "node")
        .rotate_interval("MINUTE")
        .max_archive_bytes(8 * 1024 * 1024)
        .flush_interval(Duration::from_millis(200))
        .start()?;

    for step in 0..5 {
        handle.enqueue(format!("before switch {step}\n").into_bytes());
        sleep(Duration::from_millis(200));
    }

    handle.switch_base_filename("log_files/node-secondary".into());
    handle.wait_for_switch();

    for step in 0..5 {
        handle.enqueue(format!("after switch {step}\n").into_bytes());
        sleep(Duration::from_millis(200));
    }

    for report in handle.list_available_logs() {
        println!("{} ({} bytes)", report.filename.display(), report.size_bytes);
    }

    guard.close();
    Ok(())
}
