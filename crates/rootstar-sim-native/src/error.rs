//! Error types for the native simulator runtime
//!
//! Error types for scheduling, subscriber delivery, the async service and
//! persistence records using `thiserror`.

use rootstar_sim_core::SimError;
use thiserror::Error;

/// Simulator control errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    /// Configuration or state input rejected by the core
    #[error("Invalid simulator input: {0}")]
    Invalid(#[from] SimError),
}

/// Tick timer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The host offers no timer capability
    #[error("Timer capability unavailable on this host")]
    Unsupported,
}

/// Errors a subscriber may report back to the publisher.
///
/// Every variant is logged and isolated to the reporting subscriber.
/// [`SubscriberError::Disconnected`] additionally removes the subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// The subscriber failed to process the metrics
    #[error("Subscriber failed: {reason}")]
    Failed {
        /// Failure reason
        reason: String,
    },

    /// The subscriber could not keep up and dropped the metrics
    #[error("Subscriber queue full, metrics dropped")]
    Backpressure,

    /// The subscriber's consumer is gone
    #[error("Subscriber disconnected")]
    Disconnected,
}

impl SubscriberError {
    /// Convenience constructor for [`SubscriberError::Failed`]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { reason: reason.into() }
    }
}

/// Async service errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The service task has shut down
    #[error("Simulator service closed")]
    Closed,

    /// The simulator rejected the command
    #[error(transparent)]
    Simulator(#[from] SimulatorError),
}

/// Persistence record errors
#[derive(Error, Debug)]
pub enum RecordError {
    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for simulator operations
pub type SimulatorResult<T> = Result<T, SimulatorError>;

/// Result type for subscriber callbacks
pub type DeliveryResult = Result<(), SubscriberError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
