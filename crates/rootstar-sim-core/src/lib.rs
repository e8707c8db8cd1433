//! Rootstar Sim Core - `no_std` compatible brainwave synthesis and metrics
//!
//! This crate provides the deterministic part of the Rootstar brainwave
//! simulator. It is designed to work in `no_std` environments as well as
//! `std` environments and performs no I/O.
//!
//! # Pipeline
//!
//! ```text
//! tick n → WaveformGenerator → StateModulator → MetricCalculator → BrainMetrics
//! ```
//!
//! # Modules
//!
//! - [`types`]: Bands, samples, target states, configuration, metrics
//! - [`waveform`]: Raw multi-band sample synthesis
//! - [`modulation`]: Target-state gain profiles
//! - [`metrics`]: Ratio and clamped score derivation
//! - [`reaction`]: Metric to visual parameter mapping
//! - [`error`]: Configuration and parsing errors
//!
//! # Features
//!
//! - `std`: Enable standard library support
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::mock::StepRng;
//! use rootstar_sim_core::{MetricCalculator, StateModulator, TargetState, WaveformGenerator};
//!
//! let mut rng = StepRng::new(0, 0);
//! let raw = WaveformGenerator::new().generate(0, 0.0, 0, &mut rng);
//! let modulated = StateModulator::new().apply(&raw, TargetState::Neutral, 1.0);
//! let metrics = MetricCalculator::new().compute(&modulated, TargetState::Neutral, 0);
//!
//! assert_eq!(metrics.alpha_theta, 1.0);
//! assert_eq!(metrics.coherence, 0.5);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
pub mod metrics;
pub mod modulation;
pub mod reaction;
pub mod types;
pub mod waveform;

// Re-export commonly used types at crate root
pub use error::{SimError, SimResult};
pub use metrics::{clamp_score, safe_magnitude, CoherenceProfile, MetricCalculator};
pub use modulation::{BandGains, StateModulator, GAIN_TABLE_VERSION};
pub use reaction::{ReactionParams, SignatureTier};
pub use types::{
    BrainMetrics, EegBand, EegSample, ParameterUpdate, SimulatorConfig, TargetState,
};
pub use waveform::{BandWaveform, WaveformGenerator};
