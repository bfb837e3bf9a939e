//! Runtime layer of the PACT edge agent.
//!
//! This crate wires the value and adapter crates into running
//! machinery:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Value Layer                              │
//! │  pact-types / pact-event                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Adapter Layer                             │
//! │  pact-store / pact-protocol / pact-registry                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │              Runtime Layer (THIS CRATE)                      │
//! │  bus/        : EventBus, BusSubscription                    │
//! │  worker/     : Worker trait, WorkerRuntime, command queues  │
//! │  governance/ : reconciler, command processor, cancellation  │
//! │  config/     : PactConfig, ConfigLoader                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Worker Model
//!
//! Every internal component is a worker: a bus subscription feeding a
//! bounded command queue, drained serially by a processor task. The
//! event handler translates bus messages into typed commands and does
//! nothing else, so all state mutation happens on the processor and
//! workers need no locks of their own.
//!
//! # Governance
//!
//! The [`GovernanceWorker`] owns the agreement state machine: a
//! 10-second reconciler loop that finalizes or times out pending
//! agreements, plus a command processor that reacts to container,
//! artifact-fetch and user events with the ordered cancellation
//! pipeline.

mod bus;
mod config;
pub mod governance;
mod worker;

pub use bus::{BusSubscription, EventBus};
pub use config::{ConfigError, ConfigLoader, PactConfig};
pub use governance::{GovernanceCommand, GovernanceHandle, GovernanceWorker};
pub use worker::{Worker, WorkerHandle, WorkerRuntime, COMMAND_QUEUE_CAPACITY};
