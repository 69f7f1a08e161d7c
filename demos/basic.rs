//! Minimal end-to-end usage: start a logger, enqueue a few records from
//! more than one thread, and shut down cleanly on the way out.

use std::thread;
use std::time::Duration;
use swarmlog::LoggerBuilder;

fn main() -> Result<(), swarmlog::LogWriterError> {
    let (handle, guard) = LoggerBuilder::new("log_files", "node")
        .rotate_interval("HOUR")
        .max_buffer_bytes(16 * 1024 * 1024)
        .start()?;

    let producer = {
        let handle = handle.clone();
        thread::spawn(move || {
            for step in 0..10 {
                handle.enqueue(format!("step {step}\n").into_bytes());
                thread::sleep(Duration::from_millis(50));
            }
        })
    };
    producer.join().expect("producer thread should not panic");

    let mut guard = guard;
    if !guard.close() {
        eprintln!("writer did not confirm drain within the shutdown deadline");
    }
    Ok(())
}
