//! Target-state band modulation
//!
//! Every state has a fixed gain per band. The gains below are part of the
//! simulator's observable behavior: changing any of them shifts every
//! downstream score, so a change must come with a new [`GAIN_TABLE_VERSION`].

use serde::{Deserialize, Serialize};

use crate::types::{EegBand, EegSample, TargetState};

/// Version of the gain table; bump whenever a gain changes.
pub const GAIN_TABLE_VERSION: u32 = 1;

/// Per-band multipliers for one target state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandGains {
    /// Delta gain
    pub delta: f64,
    /// Theta gain
    pub theta: f64,
    /// Alpha gain
    pub alpha: f64,
    /// Beta gain
    pub beta: f64,
    /// Gamma gain
    pub gamma: f64,
}

impl BandGains {
    /// Identity gains (NEUTRAL)
    pub const IDENTITY: Self = Self::new(1.0, 1.0, 1.0, 1.0, 1.0);

    /// Build a gain set in [`EegBand::ALL`] order
    #[must_use]
    pub const fn new(delta: f64, theta: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { delta, theta, alpha, beta, gamma }
    }

    /// Gain profile of a target state
    #[must_use]
    pub const fn for_state(state: TargetState) -> Self {
        match state {
            TargetState::Neutral => Self::IDENTITY,
            TargetState::DeepMeditation => Self::new(1.2, 2.5, 1.5, 0.3, 0.5),
            TargetState::Relaxation => Self::new(0.8, 1.3, 2.2, 0.4, 0.6),
            TargetState::Focus => Self::new(0.5, 0.6, 0.7, 2.0, 1.5),
            TargetState::FlowState => Self::new(0.6, 0.8, 1.2, 1.8, 1.7),
        }
    }

    /// Gain applied to a single band
    #[inline]
    #[must_use]
    pub const fn gain(&self, band: EegBand) -> f64 {
        match band {
            EegBand::Delta => self.delta,
            EegBand::Theta => self.theta,
            EegBand::Alpha => self.alpha,
            EegBand::Beta => self.beta,
            EegBand::Gamma => self.gamma,
        }
    }
}

/// Rescales raw samples toward the active target state.
#[derive(Copy, Clone, Debug, Default)]
pub struct StateModulator;

impl StateModulator {
    /// Create a modulator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply the state's gains and then the global amplitude scale to every
    /// band. The timestamp is left untouched.
    #[must_use]
    pub fn apply(&self, sample: &EegSample, state: TargetState, amplitude_scale: f64) -> EegSample {
        let gains = BandGains::for_state(state);
        sample.map_bands(|band, value| value * gains.gain(band) * amplitude_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: EegSample = EegSample::from_bands([1.0; 5], 99);

    #[test]
    fn test_neutral_is_identity() {
        let sample = EegSample::from_bands([0.3, -0.2, 0.9, -0.6, 0.1], 7);
        let out = StateModulator::new().apply(&sample, TargetState::Neutral, 1.0);
        assert_eq!(out, sample);
    }

    #[test]
    fn test_gain_table() {
        let modulator = StateModulator::new();
        let expected = [
            (TargetState::Neutral, [1.0, 1.0, 1.0, 1.0, 1.0]),
            (TargetState::DeepMeditation, [1.2, 2.5, 1.5, 0.3, 0.5]),
            (TargetState::Relaxation, [0.8, 1.3, 2.2, 0.4, 0.6]),
            (TargetState::Focus, [0.5, 0.6, 0.7, 2.0, 1.5]),
            (TargetState::FlowState, [0.6, 0.8, 1.2, 1.8, 1.7]),
        ];

        for (state, gains) in expected {
            let out = modulator.apply(&UNIT, state, 1.0);
            assert_eq!(out.bands(), gains, "gains for {state}");
        }
        assert_eq!(GAIN_TABLE_VERSION, 1, "gain table changed without a version bump");
    }

    #[test]
    fn test_amplitude_scale_applies_after_gains() {
        let sample = EegSample::from_bands([0.5, -0.5, 0.25, 2.0, -1.0], 1);
        let out = StateModulator::new().apply(&sample, TargetState::Focus, 3.0);
        let gains = BandGains::for_state(TargetState::Focus);

        for band in EegBand::ALL {
            assert_eq!(out.band(band), sample.band(band) * gains.gain(band) * 3.0);
        }
        assert_eq!(out.timestamp_ms, 1);
    }

    #[test]
    fn test_timestamp_untouched_by_scale() {
        let out = StateModulator::new().apply(&UNIT, TargetState::Relaxation, 10.0);
        assert_eq!(out.timestamp_ms, UNIT.timestamp_ms);
    }
}
