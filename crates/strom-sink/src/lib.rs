//! Bulk delivery engine for the Strom event-streaming platform.
//!
//! Producers accumulate records into batches and enqueue them as run units
//! on a bounded queue; a fixed pool of OS threads drains the queue and hands
//! each batch to a pluggable [`BulkSender`]. Every unit carries a write-once
//! completion cell, so the producer can block on, poll, or abandon the
//! outcome of any individual batch.
//!
//! # Architecture
//!
//! - **BulkQueue / RunUnit**: bounded MPMC handoff; a full queue blocks
//!   producers, which is the engine's backpressure
//! - **Completer / CompletionHandle**: one settled outcome per unit, never
//!   two, even across cancellation and shutdown races
//! - **SenderPool**: fixed worker threads, one sender instance each; backend
//!   failures are per-unit errors, panics abort the process
//! - **Lifecycle / ShutdownSequence**: one-way Running -> Stopping ->
//!   Stopped, with log-and-continue teardown of the surrounding resources

pub mod completion;
pub mod config;
pub mod error;
pub mod pool;
pub mod queue;
pub mod sender;
pub mod shutdown;
pub mod status;

pub use completion::{completion, Completer, CompletionHandle, Waited};
pub use config::SinkConfig;
pub use error::{BackendFailure, SinkError, SinkResult};
pub use pool::SenderPool;
pub use queue::{BulkQueue, DeliveryHandle, DeliveryOutcome, QueueFull, RecordStorage, RunResult, RunUnit};
pub use sender::{BulkSender, SenderStat};
pub use shutdown::ShutdownSequence;
pub use status::{Lifecycle, LifecycleState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct CountingSender {
        processed: Arc<AtomicU64>,
    }

    impl BulkSender<String> for CountingSender {
        fn process(&mut self, records: &[String]) -> Result<SenderStat, BackendFailure> {
            self.processed
                .fetch_add(records.len() as u64, Ordering::SeqCst);
            Ok(SenderStat::processed(records.len() as u64))
        }
    }

    fn batch(prefix: &str, size: usize) -> RecordStorage<String> {
        (0..size).map(|i| format!("{prefix}-{i}")).collect::<Vec<_>>().into()
    }

    #[test]
    fn every_enqueued_unit_completes() {
        let config = SinkConfig::default();
        let queue: BulkQueue<String, String> = BulkQueue::bounded(config.queue_capacity);
        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(2, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();

        let handles: Vec<DeliveryHandle<String>> = (0..10)
            .map(|i| queue.enqueue(format!("stream-{i}"), batch("rec", 3)))
            .collect();

        let mut delivered = 0u64;
        for handle in handles {
            match handle.wait() {
                Waited::Completed(Ok(result)) => {
                    assert_eq!(result.stat.processed, 3);
                    assert_eq!(result.storage.len(), 3);
                    delivered += result.stat.processed;
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(delivered, 30);
        assert_eq!(processed.load(Ordering::SeqCst), 30);

        pool.stop();
        assert_eq!(pool.state(), LifecycleState::Stopped);
    }

    #[test]
    fn backpressure_blocks_until_the_pool_drains() {
        // Capacity one and no pool yet: the second blocking enqueue must
        // park the producer thread until a worker frees a slot.
        let queue: Arc<BulkQueue<u32, String>> = Arc::new(BulkQueue::bounded(1));
        let first = queue.enqueue(0, batch("a", 1));

        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || producer_queue.enqueue(1, batch("b", 1)));
        thread::sleep(Duration::from_millis(30));
        assert!(!producer.is_finished());

        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(1, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();

        let second = producer.join().unwrap();
        assert!(first.wait().completed().unwrap().is_ok());
        assert!(second.wait().completed().unwrap().is_ok());
        assert_eq!(processed.load(Ordering::SeqCst), 2);
        pool.stop();
    }

    #[test]
    fn stress_many_producers_small_queue() {
        let queue: Arc<BulkQueue<usize, String>> = Arc::new(BulkQueue::bounded(4));
        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(3, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let handles: Vec<_> = (0..50)
                        .map(|i| queue.enqueue(p * 100 + i, batch("r", 2)))
                        .collect();
                    let mut delivered = 0u64;
                    for handle in handles {
                        match handle.wait() {
                            Waited::Completed(Ok(result)) => delivered += result.stat.processed,
                            other => panic!("unexpected outcome: {other:?}"),
                        }
                    }
                    delivered
                })
            })
            .collect();
        let delivered: u64 = producers.into_iter().map(|p| p.join().unwrap()).sum();

        assert_eq!(delivered, 400);
        assert_eq!(processed.load(Ordering::SeqCst), 400);
        pool.stop();
    }

    struct FlakySender;

    impl BulkSender<String> for FlakySender {
        fn process(&mut self, records: &[String]) -> Result<SenderStat, BackendFailure> {
            if records.iter().any(|r| r.contains("poison")) {
                return Err(BackendFailure::new("backend rejected the batch"));
            }
            Ok(SenderStat::processed(records.len() as u64))
        }
    }

    #[test]
    fn backend_failure_settles_only_its_own_unit() {
        let queue: BulkQueue<&str, String> = BulkQueue::bounded(4);
        let mut pool = SenderPool::new(1, &queue, || FlakySender);
        pool.start().unwrap();

        let bad = queue.enqueue("bad", vec!["poison-pill".to_string()].into());
        let good = queue.enqueue("good", batch("ok", 2));

        match bad.wait() {
            Waited::Completed(Err(failure)) => {
                assert_eq!(failure.reason(), "backend rejected the batch");
                assert_eq!(
                    failure.to_string(),
                    "backend service failed: backend rejected the batch"
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        match good.wait() {
            Waited::Completed(Ok(result)) => assert_eq!(result.stat.processed, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        pool.stop();
    }

    #[test]
    fn cancelled_units_are_never_processed() {
        let queue: BulkQueue<u8, String> = BulkQueue::bounded(4);
        let doomed = queue.enqueue(0, batch("skip", 5));
        let kept = queue.enqueue(1, batch("keep", 1));
        assert!(doomed.cancel());

        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(1, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();

        assert!(kept.wait().completed().unwrap().is_ok());
        assert_eq!(processed.load(Ordering::SeqCst), 1);
        assert!(doomed.is_cancelled());
        pool.stop();
    }

    #[test]
    fn shutdown_leaves_queued_units_cancelled_once_dropped() {
        let queue: BulkQueue<u8, String> = BulkQueue::bounded(8);
        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(1, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();

        let served = queue.enqueue(0, batch("served", 1));
        assert!(served.wait().completed().unwrap().is_ok());

        pool.stop();
        assert_eq!(pool.state(), LifecycleState::Stopped);

        // Enqueued after stop: stays in the channel until both the queue and
        // the pool's receiver drop, then the unit's completer cancels the cell.
        let orphan = queue.try_enqueue(1, batch("late", 1)).unwrap();
        drop(pool);
        drop(queue);
        assert!(orphan.wait().is_cancelled());
        assert_eq!(processed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_sequence_releases_engine_resources_in_order() {
        let queue: BulkQueue<u8, String> = BulkQueue::bounded(2);
        let processed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&processed);
        let mut pool = SenderPool::new(2, &queue, move || CountingSender {
            processed: Arc::clone(&counter),
        });
        pool.start().unwrap();
        let handle = queue.enqueue(0, batch("r", 4));
        assert!(handle.wait().completed().unwrap().is_ok());

        let config = SinkConfig::default();
        let failed = ShutdownSequence::new()
            .step("stop sender pool", move || {
                pool.stop();
                Ok(())
            })
            .step("release bulk queue", move || {
                drop(queue);
                Ok(())
            })
            .run_within(config.shutdown_timeout);
        assert_eq!(failed, 0);
    }

    mod events_as_records {
        use super::*;
        use strom_protocol::{Event, EventBuilder, EventReader, TagFilter, Variant};

        struct EventCountingSender {
            bytes_seen: Arc<AtomicU64>,
        }

        impl BulkSender<Event> for EventCountingSender {
            fn process(&mut self, records: &[Event]) -> Result<SenderStat, BackendFailure> {
                for event in records {
                    // Re-read each event from its raw bytes, the way a real
                    // backend sender frames them onto the wire.
                    let decoded = EventReader::single(event.bytes(), TagFilter::none())
                        .read()
                        .map_err(|e| BackendFailure::new(e.to_string()))?;
                    if decoded.id() != event.id() {
                        return Err(BackendFailure::new("identifier drift"));
                    }
                    self.bytes_seen
                        .fetch_add(event.bytes().len() as u64, Ordering::SeqCst);
                }
                Ok(SenderStat::processed(records.len() as u64))
            }
        }

        #[test]
        fn delivers_wire_events_end_to_end() {
            let events: Vec<Event> = (0..6)
                .map(|i| {
                    EventBuilder::new()
                        .timestamp(1_000_000 + i)
                        .tag("source", Variant::of_string("ingest-gw"))
                        .tag("sequence", Variant::of_long(i))
                        .build()
                        .unwrap()
                })
                .collect();
            let total_bytes: u64 = events.iter().map(|e| e.bytes().len() as u64).sum();

            let queue: BulkQueue<&str, Event> = BulkQueue::bounded(4);
            let bytes_seen = Arc::new(AtomicU64::new(0));
            let counter = Arc::clone(&bytes_seen);
            let mut pool = SenderPool::new(2, &queue, move || EventCountingSender {
                bytes_seen: Arc::clone(&counter),
            });
            pool.start().unwrap();

            let handle = queue.enqueue("events", events.into());
            match handle.wait() {
                Waited::Completed(Ok(result)) => {
                    assert_eq!(result.stat.processed, 6);
                    assert_eq!(result.stat.dropped, 0);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(bytes_seen.load(Ordering::SeqCst), total_bytes);
            pool.stop();
        }
    }
}
