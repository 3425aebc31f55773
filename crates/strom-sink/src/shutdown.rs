//! Ordered, failure-isolated shutdown.
//!
//! A [`ShutdownSequence`] runs named steps in registration order. A step
//! that fails or panics is logged and the sequence moves on, so one broken
//! resource never blocks the release of the rest.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

struct Step {
    name: &'static str,
    action: Box<dyn FnOnce() -> anyhow::Result<()> + Send>,
}

#[derive(Default)]
pub struct ShutdownSequence {
    steps: Vec<Step>,
}

impl ShutdownSequence {
    pub fn new() -> ShutdownSequence {
        ShutdownSequence { steps: Vec::new() }
    }

    pub fn step(
        mut self,
        name: &'static str,
        action: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> ShutdownSequence {
        self.steps.push(Step {
            name,
            action: Box::new(action),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step and returns how many failed.
    pub fn run(self) -> usize {
        let mut failed = 0;
        for step in self.steps {
            tracing::info!(step = step.name, "running shutdown step");
            match catch_unwind(AssertUnwindSafe(step.action)) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(step = step.name, %error, "shutdown step failed");
                    failed += 1;
                }
                Err(_) => {
                    tracing::error!(step = step.name, "shutdown step panicked");
                    failed += 1;
                }
            }
        }
        failed
    }

    /// Like [`run`](ShutdownSequence::run), warning when the whole sequence
    /// overruns `budget`.
    pub fn run_within(self, budget: Duration) -> usize {
        let started = Instant::now();
        let failed = self.run();
        let elapsed = started.elapsed();
        if elapsed > budget {
            tracing::warn!(?elapsed, ?budget, "shutdown exceeded its budget");
        }
        failed
    }
}
