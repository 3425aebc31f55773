//! The pluggable backend-delivery contract.

use crate::error::BackendFailure;

/// Delivery statistics for one processed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenderStat {
    /// Records accepted by the backend.
    pub processed: u64,
    /// Records the sender chose not to deliver (filtered, oversized, ...).
    pub dropped: u64,
}

impl SenderStat {
    pub fn new(processed: u64, dropped: u64) -> SenderStat {
        SenderStat { processed, dropped }
    }

    /// A stat where every record was processed.
    pub fn processed(count: u64) -> SenderStat {
        SenderStat {
            processed: count,
            dropped: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.processed + self.dropped
    }
}

/// A backend sender owned by exactly one worker for its lifetime.
///
/// `process` either delivers the whole batch and reports statistics, or
/// fails with the designated recoverable [`BackendFailure`]. Senders are
/// never shared between threads, so internal state (connections, buffers)
/// needs no synchronization. Any panic escaping `process` is fatal to the
/// process (see the worker pool).
pub trait BulkSender<V>: Send {
    fn process(&mut self, records: &[V]) -> Result<SenderStat, BackendFailure>;
}
