//! Shutdown handshake invoked from outside the writer thread (`spec.md`
//! §4.8): flip `closed`, wait up to a deadline for the writer to drain and
//! confirm, then return whether it made it in time.

use crate::buffer::BoundedLogBuffer;
use std::time::{Duration, Instant};

/// How long [`close_and_wait`] will wait for the writer thread to drain the
/// buffer and acknowledge before giving up.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// Signals the writer thread to shut down and waits for it to finish
/// draining, or for `deadline` to expire, whichever comes first.
///
/// Returns `true` if the writer confirmed `closedFinished` within the
/// deadline, `false` if the deadline elapsed first (any records still
/// queued at that point are lost -- this is the only place loss beyond the
/// buffer's overflow policy can happen, per `spec.md` §5's cancellation
/// model).
pub fn close_and_wait(buffer: &BoundedLogBuffer, deadline: Duration) -> bool {
    let mut state = buffer.lock();
    state.set_closed();
    buffer.notify_all();

    let start = Instant::now();
    loop {
        if state.is_closed_finished() {
            return true;
        }
        let elapsed = start.elapsed();
        if elapsed >= deadline {
            return false;
        }
        state = buffer.wait_timeout(state, deadline - elapsed);
    }
}
