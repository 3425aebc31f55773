//! Fixed pool of sender worker threads.
//!
//! Each worker owns one [`BulkSender`] instance produced by the pool's
//! factory and loops: take the next run unit, skip it if the producer
//! already cancelled, otherwise hand the records to the sender and settle
//! the unit's completion cell with the outcome. A [`BackendFailure`] from
//! the sender completes the unit with an error and the worker carries on;
//! any panic aborts the whole process, because a silently shrunk pool is
//! worse than a restart.
//!
//! # Architecture
//!
//! - workers receive from the queue's channel and from a zero-capacity stop
//!   channel; dropping the stop sender wakes every blocked worker at once
//! - a unit dequeued after the stop signal is dropped, which cancels its
//!   completion cell, so producers always observe an outcome
//! - `stop` is idempotent and joins every worker before marking the pool
//!   stopped

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::error::{SinkError, SinkResult};
use crate::queue::{BulkQueue, RunResult, RunUnit};
use crate::sender::BulkSender;
use crate::status::{Lifecycle, LifecycleState};

type SenderFactory<V> = Arc<dyn Fn() -> Box<dyn BulkSender<V>> + Send + Sync>;

pub struct SenderPool<K, V> {
    pool_size: usize,
    units: Receiver<RunUnit<K, V>>,
    factory: SenderFactory<V>,
    lifecycle: Arc<Lifecycle>,
    stop_tx: Option<Sender<()>>,
    stop_rx: Receiver<()>,
    workers: Vec<JoinHandle<()>>,
}

impl<K, V> SenderPool<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    /// Builds a pool of `pool_size` workers draining `queue`. The factory is
    /// invoked once per worker, on that worker's own thread.
    pub fn new<S, F>(pool_size: usize, queue: &BulkQueue<K, V>, factory: F) -> SenderPool<K, V>
    where
        S: BulkSender<V> + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
        SenderPool {
            pool_size,
            units: queue.receiver(),
            factory: Arc::new(move || Box::new(factory())),
            lifecycle: Arc::new(Lifecycle::new()),
            stop_tx: Some(stop_tx),
            stop_rx,
            workers: Vec::new(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Spawns the worker threads. Fails if the pool was already started.
    pub fn start(&mut self) -> SinkResult<()> {
        if !self.workers.is_empty() {
            return Err(SinkError::AlreadyStarted);
        }
        for index in 0..self.pool_size {
            let units = self.units.clone();
            let stop = self.stop_rx.clone();
            let lifecycle = Arc::clone(&self.lifecycle);
            let factory = Arc::clone(&self.factory);
            let handle = thread::Builder::new()
                .name(format!("sender-pool-{index}"))
                .spawn(move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        let sender = factory();
                        worker_loop(index, &units, &stop, &lifecycle, sender);
                    }));
                    if outcome.is_err() {
                        tracing::error!(worker = index, "sender worker panicked, aborting");
                        std::process::abort();
                    }
                })?;
            self.workers.push(handle);
        }
        tracing::info!(pool_size = self.pool_size, "sender pool started");
        Ok(())
    }

    /// Signals stop, wakes blocked workers, and joins them all. Units left
    /// in the queue stay there; units already dequeued but not yet running
    /// are cancelled.
    pub fn stop(&mut self) {
        if !self.lifecycle.signal_stop() {
            return;
        }
        self.stop_tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("sender worker terminated abnormally");
            }
        }
        self.lifecycle.mark_stopped();
        tracing::info!("sender pool stopped");
    }
}

impl<K, V> Drop for SenderPool<K, V> {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            if self.lifecycle.signal_stop() {
                self.stop_tx.take();
            }
            for worker in self.workers.drain(..) {
                let _ = worker.join();
            }
            self.lifecycle.mark_stopped();
        }
    }
}

fn worker_loop<K, V>(
    index: usize,
    units: &Receiver<RunUnit<K, V>>,
    stop: &Receiver<()>,
    lifecycle: &Lifecycle,
    mut sender: Box<dyn BulkSender<V>>,
) {
    while lifecycle.is_running() {
        crossbeam_channel::select! {
            recv(units) -> unit => {
                let Ok(unit) = unit else { break };
                if !lifecycle.is_running() {
                    // Dropping the unit cancels its cell; the producer sees
                    // a settled outcome instead of a hang.
                    break;
                }
                dispatch(sender.as_mut(), unit);
            }
            recv(stop) -> _ => break,
        }
    }
    tracing::debug!(worker = index, "sender worker exiting");
}

fn dispatch<K, V>(sender: &mut dyn BulkSender<V>, unit: RunUnit<K, V>) {
    if unit.is_cancelled() {
        tracing::debug!("skipping cancelled run unit");
        return;
    }
    let (_key, storage, completer) = unit.into_parts();
    let started = Instant::now();
    match sender.process(storage.records()) {
        Ok(stat) => {
            completer.complete(Ok(RunResult {
                storage,
                stat,
                elapsed: started.elapsed(),
            }));
        }
        Err(failure) => {
            tracing::warn!(%failure, "bulk sender reported a backend failure");
            completer.complete(Err(failure));
        }
    }
}
