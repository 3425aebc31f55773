//! One-way pool lifecycle.

use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const STOPPING: u8 = 1;
const STOPPED: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Stopping,
    Stopped,
}

/// Shared pool state, advancing strictly Running -> Stopping -> Stopped.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Lifecycle {
        Lifecycle {
            state: AtomicU8::new(RUNNING),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => LifecycleState::Running,
            STOPPING => LifecycleState::Stopping,
            _ => LifecycleState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// First caller wins; every later call is a no-op returning `false`.
    pub fn signal_stop(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, STOPPING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn mark_stopped(&self) {
        let _ = self.state.compare_exchange(
            STOPPING,
            STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

impl Default for Lifecycle {
    fn default() -> Lifecycle {
        Lifecycle::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_way() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_running());
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        assert!(lifecycle.signal_stop());
        assert!(!lifecycle.signal_stop());
        assert_eq!(lifecycle.state(), LifecycleState::Stopping);

        lifecycle.mark_stopped();
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert!(!lifecycle.is_running());
    }

    #[test]
    fn mark_stopped_requires_stopping_first() {
        let lifecycle = Lifecycle::new();
        lifecycle.mark_stopped();
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }
}
