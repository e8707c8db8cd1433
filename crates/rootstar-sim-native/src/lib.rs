//! Rootstar Sim Native - Host runtime for the brainwave simulator
//!
//! This crate drives the pure pipeline from `rootstar-sim-core` on a
//! schedule and delivers the results:
//! - Tick scheduling against an injectable timer and wall clock
//! - Ordered, failure-isolated fan-out to subscribers
//! - A tokio service with a command channel for async hosts
//! - Session tracking, chart history and storage records
//!
//! # Modules
//!
//! - [`simulator`]: Scheduler/publisher and its builder
//! - [`timer`]: Tick timer capability (real, manual, absent)
//! - [`service`]: Async command-driven simulator task
//! - [`session`]: Session tracking and aggregate statistics
//! - [`history`]: Bounded band history for charts
//! - [`record`]: Flattened per-tick storage rows
//! - [`error`]: Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod history;
pub mod record;
pub mod service;
pub mod session;
pub mod simulator;
pub mod timer;

// Re-export key types
pub use error::{
    DeliveryResult, RecordError, ServiceError, SimulatorError, SimulatorResult, SubscriberError,
    TimerError,
};
pub use history::{WaveHistory, WavePoint, DEFAULT_HISTORY_LEN};
pub use record::MetricRecord;
pub use service::{
    channel_subscriber, SimulatorCommand, SimulatorHandle, SimulatorService, SimulatorStatus,
};
pub use session::{SessionStats, SessionStatus, SessionSummary, SessionTracker};
pub use simulator::{
    Lifecycle, MetricsCallback, Simulator, SimulatorBuilder, SimulatorStats, SubscriptionId,
};
pub use timer::{ManualClock, ManualTimer, MonotonicTimer, NoTimer, TickTimer};

// Re-export core types used across the public API
pub use rootstar_sim_core::{BrainMetrics, EegSample, ParameterUpdate, SimulatorConfig, TargetState};
