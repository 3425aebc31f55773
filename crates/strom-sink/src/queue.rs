//! Bounded handoff between producers and the sender pool.
//!
//! A [`BulkQueue`] wraps one bounded MPMC channel of [`RunUnit`]s. Producers
//! block in `enqueue` when the channel is full, which is the engine's only
//! backpressure mechanism, or use `try_enqueue` to get the batch back
//! immediately instead of waiting.

use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::completion::{completion, Completer, CompletionHandle};
use crate::error::BackendFailure;
use crate::sender::SenderStat;

/// Accumulated records awaiting one delivery run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordStorage<V> {
    records: Vec<V>,
}

impl<V> RecordStorage<V> {
    pub fn new() -> RecordStorage<V> {
        RecordStorage {
            records: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> RecordStorage<V> {
        RecordStorage {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, record: V) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[V] {
        &self.records
    }

    pub fn into_records(self) -> Vec<V> {
        self.records
    }
}

impl<V> From<Vec<V>> for RecordStorage<V> {
    fn from(records: Vec<V>) -> RecordStorage<V> {
        RecordStorage { records }
    }
}

/// What a successful delivery run produced.
#[derive(Debug)]
pub struct RunResult<V> {
    /// The storage handed back for reuse.
    pub storage: RecordStorage<V>,
    /// Sender-reported statistics.
    pub stat: SenderStat,
    /// Wall time spent inside the sender.
    pub elapsed: Duration,
}

pub type DeliveryOutcome<V> = Result<RunResult<V>, BackendFailure>;
pub type DeliveryHandle<V> = CompletionHandle<DeliveryOutcome<V>>;

/// One unit of work travelling from a producer to a worker.
pub struct RunUnit<K, V> {
    key: K,
    storage: RecordStorage<V>,
    completer: Completer<DeliveryOutcome<V>>,
}

impl<K, V> RunUnit<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn records(&self) -> &[V] {
        self.storage.records()
    }

    /// True once the producer gave up on this unit.
    pub fn is_cancelled(&self) -> bool {
        self.completer.is_cancelled()
    }

    pub(crate) fn into_parts(self) -> (K, RecordStorage<V>, Completer<DeliveryOutcome<V>>) {
        (self.key, self.storage, self.completer)
    }
}

/// Returned by `try_enqueue` when the queue is at capacity; carries the
/// rejected batch back to the caller.
#[derive(Debug)]
pub struct QueueFull<K, V> {
    pub key: K,
    pub storage: RecordStorage<V>,
}

impl<K, V> fmt::Display for QueueFull<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bulk queue is full")
    }
}

impl<K: fmt::Debug, V: fmt::Debug> std::error::Error for QueueFull<K, V> {}

/// Bounded queue of run units keyed by destination.
pub struct BulkQueue<K, V> {
    units_tx: Sender<RunUnit<K, V>>,
    units_rx: Receiver<RunUnit<K, V>>,
}

impl<K, V> BulkQueue<K, V> {
    pub fn bounded(capacity: usize) -> BulkQueue<K, V> {
        let (units_tx, units_rx) = crossbeam_channel::bounded(capacity);
        BulkQueue { units_tx, units_rx }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.units_tx.capacity()
    }

    pub fn len(&self) -> usize {
        self.units_tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units_tx.is_empty()
    }

    /// Hands a batch to the pool, blocking while the queue is full.
    pub fn enqueue(&self, key: K, storage: RecordStorage<V>) -> DeliveryHandle<V> {
        let (completer, handle) = completion();
        let unit = RunUnit {
            key,
            storage,
            completer,
        };
        // The queue holds its own receiver, so the channel cannot disconnect
        // while `&self` is alive.
        self.units_tx
            .send(unit)
            .expect("queue channel disconnected");
        handle
    }

    /// Non-blocking variant; gives the batch back when the queue is full.
    pub fn try_enqueue(
        &self,
        key: K,
        storage: RecordStorage<V>,
    ) -> Result<DeliveryHandle<V>, QueueFull<K, V>> {
        let (completer, handle) = completion();
        let unit = RunUnit {
            key,
            storage,
            completer,
        };
        match self.units_tx.try_send(unit) {
            Ok(()) => Ok(handle),
            Err(TrySendError::Full(unit)) | Err(TrySendError::Disconnected(unit)) => {
                let (key, storage, completer) = unit.into_parts();
                // Settle the cell so the paired handle never dangles pending.
                drop(completer);
                Err(QueueFull { key, storage })
            }
        }
    }

    pub(crate) fn receiver(&self) -> Receiver<RunUnit<K, V>> {
        self.units_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Waited;

    #[test]
    fn enqueued_unit_reaches_the_receiver() {
        let queue: BulkQueue<&str, u32> = BulkQueue::bounded(4);
        let handle = queue.enqueue("stream-a", vec![1, 2, 3].into());
        assert_eq!(queue.len(), 1);

        let unit = queue.receiver().recv().unwrap();
        assert_eq!(*unit.key(), "stream-a");
        assert_eq!(unit.records(), &[1, 2, 3]);
        assert!(!unit.is_cancelled());

        let (_, storage, completer) = unit.into_parts();
        let count = storage.len() as u64;
        completer.complete(Ok(RunResult {
            storage,
            stat: SenderStat::processed(count),
            elapsed: Duration::ZERO,
        }));

        match handle.wait() {
            Waited::Completed(Ok(result)) => {
                assert_eq!(result.stat.processed, 3);
                assert_eq!(result.storage.into_records(), vec![1, 2, 3]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn try_enqueue_gives_the_batch_back_when_full() {
        let queue: BulkQueue<u8, u8> = BulkQueue::bounded(1);
        let _pending = queue.try_enqueue(0, vec![1].into()).unwrap();

        let rejected = queue.try_enqueue(1, vec![9, 9].into()).unwrap_err();
        assert_eq!(rejected.key, 1);
        assert_eq!(rejected.storage.records(), &[9, 9]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn cancelled_unit_is_observable_by_the_worker() {
        let queue: BulkQueue<(), u8> = BulkQueue::bounded(1);
        let handle = queue.enqueue((), vec![5].into());
        handle.cancel();

        let unit = queue.receiver().recv().unwrap();
        assert!(unit.is_cancelled());
    }
}
