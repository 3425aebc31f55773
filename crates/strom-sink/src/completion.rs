//! Write-once completion cells.
//!
//! Every enqueued unit carries a [`Completer`] and hands the producer the
//! matching [`CompletionHandle`]. The cell transitions exactly once, from
//! pending to either completed or cancelled, and never back. A completer
//! dropped while the cell is still pending cancels it, so a unit that is
//! discarded during shutdown never strands a waiting producer.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

enum State<T> {
    Pending,
    Completed(T),
    /// The value was moved out by `wait`.
    Taken,
    Cancelled,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    signal: Condvar,
}

/// Creates a linked completer/handle pair around one pending cell.
pub fn completion<T>() -> (Completer<T>, CompletionHandle<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending),
        signal: Condvar::new(),
    });
    (
        Completer {
            shared: Arc::clone(&shared),
        },
        CompletionHandle { shared },
    )
}

/// The producing side of a completion cell, owned by the worker.
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Completer<T> {
    /// Fulfils the cell. Returns `false` if the handle already cancelled it,
    /// in which case the value is dropped.
    pub fn complete(self, value: T) -> bool {
        let mut state = self.shared.state.lock().expect("completion lock poisoned");
        if matches!(*state, State::Pending) {
            *state = State::Completed(value);
            self.shared.signal.notify_all();
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("completion lock poisoned"),
            State::Cancelled
        )
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().expect("completion lock poisoned");
        if matches!(*state, State::Pending) {
            *state = State::Cancelled;
            self.shared.signal.notify_all();
        }
    }
}

/// Outcome observed by a waiting producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Waited<T> {
    Completed(T),
    Cancelled,
}

impl<T> Waited<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Waited::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Waited::Completed(value) => Some(value),
            Waited::Cancelled => None,
        }
    }
}

/// The consuming side of a completion cell, held by the producer.
pub struct CompletionHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> CompletionHandle<T> {
    /// Cancels a still-pending cell. Returns `false` if the worker already
    /// completed or another path already cancelled it.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.state.lock().expect("completion lock poisoned");
        if matches!(*state, State::Pending) {
            *state = State::Cancelled;
            self.shared.signal.notify_all();
            true
        } else {
            false
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("completion lock poisoned"),
            State::Completed(_) | State::Taken
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("completion lock poisoned"),
            State::Cancelled
        )
    }

    /// Blocks until the cell settles and consumes the handle.
    pub fn wait(self) -> Waited<T> {
        let mut state = self.shared.state.lock().expect("completion lock poisoned");
        loop {
            match std::mem::replace(&mut *state, State::Taken) {
                State::Completed(value) => return Waited::Completed(value),
                State::Cancelled => {
                    *state = State::Cancelled;
                    return Waited::Cancelled;
                }
                State::Pending => {
                    *state = State::Pending;
                    state = self
                        .shared
                        .signal
                        .wait(state)
                        .expect("completion lock poisoned");
                }
                State::Taken => unreachable!("completion value taken twice"),
            }
        }
    }

    /// Like [`wait`](CompletionHandle::wait), but gives the handle back if
    /// the cell is still pending when the timeout elapses.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Waited<T>, CompletionHandle<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().expect("completion lock poisoned");
        loop {
            match std::mem::replace(&mut *state, State::Taken) {
                State::Completed(value) => return Ok(Waited::Completed(value)),
                State::Cancelled => {
                    *state = State::Cancelled;
                    return Ok(Waited::Cancelled);
                }
                State::Pending => {
                    *state = State::Pending;
                    let now = Instant::now();
                    if now >= deadline {
                        drop(state);
                        return Err(self);
                    }
                    let (guard, _) = self
                        .shared
                        .signal
                        .wait_timeout(state, deadline - now)
                        .expect("completion lock poisoned");
                    state = guard;
                }
                State::Taken => unreachable!("completion value taken twice"),
            }
        }
    }
}

// Manual impl: a derive would demand `T: Debug`, and the value itself is
// not part of the handle's observable state anyway.
impl<T> fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.shared.state.lock().expect("completion lock poisoned") {
            State::Pending => "pending",
            State::Completed(_) => "completed",
            State::Taken => "taken",
            State::Cancelled => "cancelled",
        };
        f.debug_struct("CompletionHandle")
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn complete_then_wait() {
        let (completer, handle) = completion();
        assert!(!handle.is_done());
        assert!(completer.complete(42));
        assert!(handle.is_done());
        assert_eq!(handle.wait(), Waited::Completed(42));
    }

    #[test]
    fn cancel_wins_over_late_complete() {
        let (completer, handle) = completion();
        assert!(handle.cancel());
        assert!(completer.is_cancelled());
        assert!(!completer.complete(1));
        assert_eq!(handle.wait(), Waited::Cancelled);
    }

    #[test]
    fn complete_wins_over_late_cancel() {
        let (completer, handle) = completion();
        assert!(completer.complete("done"));
        assert!(!handle.cancel());
        assert_eq!(handle.wait(), Waited::Completed("done"));
    }

    #[test]
    fn dropping_pending_completer_cancels() {
        let (completer, handle) = completion::<u32>();
        drop(completer);
        assert!(handle.is_cancelled());
        assert_eq!(handle.wait(), Waited::Cancelled);
    }

    #[test]
    fn wait_blocks_until_completed() {
        let (completer, handle) = completion();
        let waiter = thread::spawn(move || handle.wait());
        thread::sleep(Duration::from_millis(20));
        completer.complete(7u64);
        assert_eq!(waiter.join().unwrap(), Waited::Completed(7));
    }

    // `T` carries no Debug impl on purpose.
    struct Opaque;

    #[test]
    fn handle_debug_reports_state_without_requiring_debug_values() {
        let (completer, handle) = completion::<Opaque>();
        assert!(format!("{handle:?}").contains("pending"));
        completer.complete(Opaque);
        assert!(format!("{handle:?}").contains("completed"));
    }

    #[test]
    fn wait_timeout_returns_the_handle_while_pending() {
        let (completer, handle) = completion::<u8>();
        let handle = handle
            .wait_timeout(Duration::from_millis(10))
            .expect_err("cell must still be pending");
        completer.complete(9);
        assert_eq!(
            handle.wait_timeout(Duration::from_secs(5)).ok(),
            Some(Waited::Completed(9))
        );
    }
}
