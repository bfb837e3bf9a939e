//! Worker runtime - the bus-to-command-queue contract.
//!
//! A worker is two long-lived tasks around one bounded command queue:
//!
//! ```text
//!                 ┌──────────────────────────────────────┐
//!                 │              Worker                  │
//! EventBus ──────►│ dispatcher: map_event() ──► CQ       │
//!                 │                             │        │
//!                 │                             ▼        │
//!                 │ processor:  process() (serial)       │
//!                 └──────────────────────────────────────┘
//! ```
//!
//! [`Worker::map_event`] runs on the dispatcher task for every bus
//! message; it is synchronous, non-blocking and is the only path from
//! the bus into the command queue. The processor drains the queue
//! serially, so all worker state is mutated from a single task and the
//! worker needs no locks of its own. After each command the processor
//! yields, keeping one long-running command from starving its peers on
//! the same executor.
//!
//! The queue is bounded; overflowing it means a worker's processor has
//! fallen 200 commands behind its dispatcher, which is a programmer
//! error and panics rather than silently dropping work.

use crate::bus::EventBus;
use pact_event::Message;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Command queue capacity for every worker.
pub const COMMAND_QUEUE_CAPACITY: usize = 200;

/// A bus-driven worker.
///
/// Implementations define their command vocabulary, the translation
/// from bus messages into commands, and the serial command processor.
pub trait Worker: Send + 'static {
    /// Typed commands consumed by this worker's processor.
    type Command: Send + std::fmt::Debug + 'static;

    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Translates a bus message into at most one command.
    ///
    /// Runs on the dispatcher task; must not block. Messages that do
    /// not concern this worker map to `None`.
    fn map_event(message: &Message) -> Option<Self::Command>;

    /// Handles one command.
    ///
    /// Runs on the processor task; this is the only place worker
    /// state is mutated.
    fn process(&mut self, command: Self::Command) -> impl Future<Output = ()> + Send;
}

/// Spawns workers onto the tokio runtime.
pub struct WorkerRuntime;

impl WorkerRuntime {
    /// Starts `worker` against `bus` and returns a handle to its two
    /// tasks.
    ///
    /// The worker stops when every clone of the bus is dropped: the
    /// dispatcher ends, the queue closes, and the processor finishes
    /// whatever commands remain.
    pub fn spawn<W: Worker>(mut worker: W, bus: &EventBus) -> WorkerHandle {
        let name = worker.name();
        let mut subscription = bus.subscribe();
        let (command_tx, mut command_rx) = mpsc::channel::<W::Command>(COMMAND_QUEUE_CAPACITY);

        let dispatcher = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let Some(command) = W::map_event(&message) else {
                    continue;
                };
                match command_tx.try_send(command) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                    Err(mpsc::error::TrySendError::Full(command)) => {
                        panic!(
                            "worker {}: command queue overflow, dropping {:?}",
                            name, command
                        );
                    }
                }
            }
            debug!(worker = name, "dispatcher stopped");
        });

        let processor = tokio::spawn(async move {
            info!(worker = name, "processor started");
            while let Some(command) = command_rx.recv().await {
                debug!(worker = name, ?command, "processing command");
                worker.process(command).await;
                // cooperative hint between commands
                tokio::task::yield_now().await;
            }
            info!(worker = name, "processor stopped");
        });

        WorkerHandle {
            name,
            dispatcher,
            processor,
        }
    }
}

/// Handle to a spawned worker's tasks.
pub struct WorkerHandle {
    name: &'static str,
    dispatcher: JoinHandle<()>,
    processor: JoinHandle<()>,
}

impl WorkerHandle {
    /// The worker's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Aborts both tasks immediately.
    pub fn abort(&self) {
        self.dispatcher.abort();
        self.processor.abort();
    }

    /// Waits for the worker to finish.
    ///
    /// Returns the first task failure (panic or abort), aborting the
    /// peer task when one fails.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        if let Err(err) = self.dispatcher.await {
            self.processor.abort();
            return Err(err);
        }
        self.processor.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_event::EventId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts policy-file messages; everything else is ignored.
    struct CountingWorker {
        seen: Arc<AtomicUsize>,
    }

    #[derive(Debug)]
    struct CountCommand;

    impl Worker for CountingWorker {
        type Command = CountCommand;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn map_event(message: &Message) -> Option<CountCommand> {
            match message.event_id() {
                EventId::NewPolicy => Some(CountCommand),
                _ => None,
            }
        }

        async fn process(&mut self, _command: CountCommand) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Accepts one command, then parks forever.
    struct StuckWorker;

    #[derive(Debug)]
    struct StuckCommand;

    impl Worker for StuckWorker {
        type Command = StuckCommand;

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn map_event(message: &Message) -> Option<StuckCommand> {
            match message.event_id() {
                EventId::NewPolicy => Some(StuckCommand),
                _ => None,
            }
        }

        async fn process(&mut self, _command: StuckCommand) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn commands_flow_from_bus_to_processor() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let handle = WorkerRuntime::spawn(
            CountingWorker {
                seen: Arc::clone(&seen),
            },
            &bus,
        );

        for i in 0..5 {
            bus.publish(Message::policy_created(format!("p-{}", i)));
        }
        // unrelated message is ignored
        bus.publish(Message::edge_registered("dev", "tok"));

        drop(bus);
        handle.join().await.expect("worker should end cleanly");
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn queue_overflow_panics_the_dispatcher() {
        let bus = EventBus::new();
        let handle = WorkerRuntime::spawn(StuckWorker, &bus);

        // One command occupies the processor forever; the queue holds
        // COMMAND_QUEUE_CAPACITY more; the next one overflows.
        for i in 0..COMMAND_QUEUE_CAPACITY + 10 {
            bus.publish(Message::policy_created(format!("p-{}", i)));
        }

        let err = handle.join().await.expect_err("dispatcher should panic");
        assert!(err.is_panic());
    }

    #[tokio::test]
    async fn worker_drains_queue_after_bus_drop() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let handle = WorkerRuntime::spawn(
            CountingWorker {
                seen: Arc::clone(&seen),
            },
            &bus,
        );

        bus.publish(Message::policy_created("p-1"));
        bus.publish(Message::policy_created("p-2"));
        drop(bus);

        handle.join().await.expect("worker should end cleanly");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
