//! Error types for the Rootstar simulator core
//!
//! Errors here work in `no_std` environments. Rejected names are captured in
//! a fixed-capacity `heapless::String` so no allocation is needed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a rejected target state name.
pub const MAX_STATE_NAME_LEN: usize = 32;

/// Errors raised by configuration and target state parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimError {
    /// Target state name did not match any known variant
    UnknownTargetState {
        /// The rejected name (truncated to [`MAX_STATE_NAME_LEN`])
        name: heapless::String<MAX_STATE_NAME_LEN>,
    },
    /// Noise level must be finite and non-negative
    InvalidNoiseLevel {
        /// The rejected value
        value: f64,
    },
    /// Amplitude scale must be finite and strictly positive
    InvalidAmplitudeScale {
        /// The rejected value
        value: f64,
    },
    /// Tick interval must be strictly positive
    InvalidTickInterval {
        /// The rejected interval in milliseconds
        interval_ms: u64,
    },
}

impl SimError {
    /// Build an [`SimError::UnknownTargetState`] from arbitrary input,
    /// truncating the name if it does not fit.
    pub fn unknown_state(input: &str) -> Self {
        let mut name = heapless::String::new();
        for c in input.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self::UnknownTargetState { name }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTargetState { name } => {
                write!(f, "Unknown target state: {name:?}")
            }
            Self::InvalidNoiseLevel { value } => {
                write!(f, "Invalid noise level {value}: must be finite and >= 0")
            }
            Self::InvalidAmplitudeScale { value } => {
                write!(f, "Invalid amplitude scale {value}: must be finite and > 0")
            }
            Self::InvalidTickInterval { interval_ms } => {
                write!(f, "Invalid tick interval {interval_ms}ms: must be > 0")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SimError {}

/// Result type for core operations
pub type SimResult<T> = Result<T, SimError>;
