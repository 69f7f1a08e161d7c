//! The one-shot cross-thread request to change the base log path at the
//! next rotation check (`spec.md` §3, §6: `switchBaseFilename`/`waitForSwitch`).

use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

struct State {
    pending_base_filename: Option<PathBuf>,
    switched: bool,
}

/// Guarded by its own lock (`switchLock`), always acquired before
/// `bufferLock` per `spec.md` §5's fixed acquisition order.
pub struct SwitchRequest {
    state: Mutex<State>,
    condvar: Condvar,
}

impl SwitchRequest {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                pending_base_filename: None,
                switched: true,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Requests that the writer switch to `new_base` at its next rotation
    /// check. Producer-facing; safe from any thread.
    pub fn switch_base_filename(&self, new_base: PathBuf) {
        let mut state = self.lock();
        state.pending_base_filename = Some(new_base);
        state.switched = false;
    }

    /// Blocks the caller until the writer thread has picked up and applied a
    /// pending switch, or returns immediately if none is outstanding.
    pub fn wait_for_switch(&self) {
        let mut state = self.lock();
        while !state.switched {
            state = match self.condvar.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Same as [`wait_for_switch`](Self::wait_for_switch) but bounded, for
    /// callers (tests, diagnostics) that must not block indefinitely.
    pub fn wait_for_switch_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.lock();
        let deadline = std::time::Instant::now() + timeout;
        while !state.switched {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return state.switched;
            }
            state = match self.condvar.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Called only by `WriterLoop`: takes the pending base filename (if any)
    /// without clearing the `switched` flag -- that happens once rotation
    /// has actually applied it, via [`complete`](Self::complete).
    pub fn peek_pending(&self) -> Option<PathBuf> {
        self.lock().pending_base_filename.clone()
    }

    pub fn is_pending(&self) -> bool {
        !self.lock().switched
    }

    /// Called by `WriterLoop` once the switch has taken effect: clears the
    /// pending path and wakes every `waitForSwitch` caller.
    pub fn complete(&self) {
        let mut state = self.lock();
        state.pending_base_filename = None;
        state.switched = true;
        self.condvar.notify_all();
    }
}

impl Default for SwitchRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fresh_request_has_nothing_pending() {
        let req = SwitchRequest::new();
        assert!(!req.is_pending());
        assert_eq!(req.peek_pending(), None);
    }

    #[test]
    fn switch_then_complete_wakes_waiter() {
        let req = Arc::new(SwitchRequest::new());
        req.switch_base_filename(PathBuf::from("/var/log/other"));
        assert!(req.is_pending());

        let waiter = {
            let req = Arc::clone(&req);
            std::thread::spawn(move || req.wait_for_switch_timeout(Duration::from_secs(5)))
        };

        std::thread::sleep(Duration::from_millis(20));
        req.complete();
        assert!(waiter.join().unwrap());
        assert!(!req.is_pending());
    }

    #[test]
    fn wait_for_switch_timeout_returns_false_when_nothing_happens() {
        let req = SwitchRequest::new();
        req.switch_base_filename(PathBuf::from("/var/log/other"));
        assert!(!req.wait_for_switch_timeout(Duration::from_millis(50)));
    }
}
