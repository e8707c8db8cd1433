//! Core types for the Rootstar brainwave simulator
//!
//! This module provides the data model shared by every tier:
//! - EEG frequency bands and per-tick band samples
//! - Target mental states the simulation modulates toward
//! - Simulator configuration and partial parameter updates
//! - The derived metric record emitted once per tick

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

// ============================================================================
// EEG Frequency Bands
// ============================================================================

/// Standard EEG frequency band definitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    /// Delta: 0.5-4 Hz (deep sleep)
    Delta,
    /// Theta: 4-8 Hz (drowsiness, memory)
    Theta,
    /// Alpha: 8-13 Hz (relaxed, eyes closed)
    Alpha,
    /// Beta: 13-30 Hz (active thinking)
    Beta,
    /// Gamma: 30-100 Hz (cognitive processing)
    Gamma,
}

impl EegBand {
    /// All bands in ascending frequency order
    pub const ALL: [Self; 5] = [Self::Delta, Self::Theta, Self::Alpha, Self::Beta, Self::Gamma];

    /// Get the physiological frequency range for this band (low, high) in Hz
    #[inline]
    #[must_use]
    pub const fn range_hz(self) -> (f32, f32) {
        match self {
            Self::Delta => (0.5, 4.0),
            Self::Theta => (4.0, 8.0),
            Self::Alpha => (8.0, 13.0),
            Self::Beta => (13.0, 30.0),
            Self::Gamma => (30.0, 100.0),
        }
    }

    /// Get the band name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Delta => "Delta",
            Self::Theta => "Theta",
            Self::Alpha => "Alpha",
            Self::Beta => "Beta",
            Self::Gamma => "Gamma",
        }
    }

    /// Position of this band inside [`EegBand::ALL`]
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// EEG Sample
// ============================================================================

/// One multi-band amplitude sample, produced once per tick.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct EegSample {
    /// Delta band amplitude
    #[serde(rename = "deltaWave")]
    pub delta: f64,
    /// Theta band amplitude
    #[serde(rename = "thetaWave")]
    pub theta: f64,
    /// Alpha band amplitude
    #[serde(rename = "alphaWave")]
    pub alpha: f64,
    /// Beta band amplitude
    #[serde(rename = "betaWave")]
    pub beta: f64,
    /// Gamma band amplitude
    #[serde(rename = "gammaWave")]
    pub gamma: f64,
    /// Capture time in milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

impl EegSample {
    /// Build a sample from band amplitudes in [`EegBand::ALL`] order.
    #[inline]
    #[must_use]
    pub const fn from_bands(bands: [f64; 5], timestamp_ms: u64) -> Self {
        Self {
            delta: bands[0],
            theta: bands[1],
            alpha: bands[2],
            beta: bands[3],
            gamma: bands[4],
            timestamp_ms,
        }
    }

    /// Band amplitudes in [`EegBand::ALL`] order.
    #[inline]
    #[must_use]
    pub const fn bands(&self) -> [f64; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    /// Amplitude of a single band
    #[inline]
    #[must_use]
    pub const fn band(&self, band: EegBand) -> f64 {
        match band {
            EegBand::Delta => self.delta,
            EegBand::Theta => self.theta,
            EegBand::Alpha => self.alpha,
            EegBand::Beta => self.beta,
            EegBand::Gamma => self.gamma,
        }
    }

    /// Return a copy with every band transformed, timestamp untouched.
    #[must_use]
    pub fn map_bands(&self, mut f: impl FnMut(EegBand, f64) -> f64) -> Self {
        let mut bands = self.bands();
        for band in EegBand::ALL {
            bands[band.index()] = f(band, bands[band.index()]);
        }
        Self::from_bands(bands, self.timestamp_ms)
    }
}

// ============================================================================
// Target State
// ============================================================================

/// Mental state the simulation modulates toward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    /// Balanced baseline
    #[default]
    Neutral,
    /// High theta, moderate alpha, low beta
    DeepMeditation,
    /// High alpha, low beta, moderate theta
    Relaxation,
    /// High beta, moderate gamma, lower alpha
    Focus,
    /// Balanced beta-gamma with high coherence
    FlowState,
}

impl TargetState {
    /// Every state, in the order presented to users
    pub const ALL: [Self; 5] = [
        Self::Neutral,
        Self::DeepMeditation,
        Self::Relaxation,
        Self::Focus,
        Self::FlowState,
    ];

    /// Canonical identifier (`DEEP_MEDITATION` style)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::DeepMeditation => "DEEP_MEDITATION",
            Self::Relaxation => "RELAXATION",
            Self::Focus => "FOCUS",
            Self::FlowState => "FLOW_STATE",
        }
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::DeepMeditation => "Deep Meditation",
            Self::Relaxation => "Relaxation",
            Self::Focus => "Focus",
            Self::FlowState => "Flow State",
        }
    }

    /// Short description of the dominant band pattern
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Neutral => "Baseline state",
            Self::DeepMeditation => "High Theta, Alpha",
            Self::Relaxation => "High Alpha, low Beta",
            Self::Focus => "High Beta, Gamma",
            Self::FlowState => "Balanced Beta-Gamma",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetState {
    type Err = SimError;

    /// Parse a state name. Case is ignored and `-`, `_` or spaces may
    /// separate words, so `FLOW_STATE`, `flow-state` and `Flow State` all
    /// resolve to [`TargetState::FlowState`]. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| names_match(state.name(), trimmed))
            .ok_or_else(|| SimError::unknown_state(s))
    }
}

fn names_match(canonical: &str, input: &str) -> bool {
    let normalized = input
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_uppercase() });
    canonical.chars().eq(normalized)
}

// ============================================================================
// Configuration
// ============================================================================

/// Default jitter magnitude
pub const DEFAULT_NOISE_LEVEL: f64 = 0.1;

/// Default global amplitude factor
pub const DEFAULT_AMPLITUDE_SCALE: f64 = 1.0;

/// Default tick cadence in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Simulator configuration, read fresh at the start of every tick.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorConfig {
    /// Active target state
    pub target_state: TargetState,
    /// Jitter magnitude; each band receives uniform noise in `[-0.5, 0.5] * noise_level`
    pub noise_level: f64,
    /// Global multiplier applied to every band after state gains
    pub amplitude_scale: f64,
    /// Default tick cadence used by `start_default`
    pub tick_interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target_state: TargetState::Neutral,
            noise_level: DEFAULT_NOISE_LEVEL,
            amplitude_scale: DEFAULT_AMPLITUDE_SCALE,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl SimulatorConfig {
    /// Check every field against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        validate_noise_level(self.noise_level)?;
        validate_amplitude_scale(self.amplitude_scale)?;
        validate_tick_interval(self.tick_interval_ms)
    }

    /// Apply a partial update. Nothing changes unless every supplied value
    /// is valid.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value in the update.
    pub fn apply(&mut self, update: ParameterUpdate) -> SimResult<()> {
        if let Some(noise) = update.noise_level {
            validate_noise_level(noise)?;
        }
        if let Some(scale) = update.amplitude_scale {
            validate_amplitude_scale(scale)?;
        }

        if let Some(noise) = update.noise_level {
            self.noise_level = noise;
        }
        if let Some(scale) = update.amplitude_scale {
            self.amplitude_scale = scale;
        }
        Ok(())
    }
}

/// Partial parameter update; `None` leaves the field unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterUpdate {
    /// New noise level
    pub noise_level: Option<f64>,
    /// New amplitude scale
    pub amplitude_scale: Option<f64>,
}

impl ParameterUpdate {
    /// Update only the noise level
    #[must_use]
    pub const fn noise_level(value: f64) -> Self {
        Self { noise_level: Some(value), amplitude_scale: None }
    }

    /// Update only the amplitude scale
    #[must_use]
    pub const fn amplitude_scale(value: f64) -> Self {
        Self { noise_level: None, amplitude_scale: Some(value) }
    }
}

fn validate_noise_level(value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidNoiseLevel { value })
    }
}

fn validate_amplitude_scale(value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidAmplitudeScale { value })
    }
}

/// Reject a zero tick interval.
///
/// # Errors
///
/// Returns [`SimError::InvalidTickInterval`] when `interval_ms` is zero.
pub fn validate_tick_interval(interval_ms: u64) -> SimResult<()> {
    if interval_ms > 0 {
        Ok(())
    } else {
        Err(SimError::InvalidTickInterval { interval_ms })
    }
}

// ============================================================================
// Brain Metrics
// ============================================================================

/// Metrics derived from one modulated sample. Emitted once per tick and
/// never mutated afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainMetrics {
    /// The modulated sample the metrics were derived from
    #[serde(rename = "eegData")]
    pub sample: EegSample,
    /// Alpha/theta ratio (relaxation indicator)
    pub alpha_theta: f64,
    /// (Beta + gamma)/alpha ratio (focus indicator)
    pub beta_gamma_alpha: f64,
    /// Synthetic synchrony in `[0, 1]`
    pub coherence: f64,
    /// Focus score in `[0, 100]`
    pub focus_score: f64,
    /// Calm score in `[0, 100]`
    pub calm_score: f64,
    /// Meditation depth in `[0, 100]`
    pub meditation_depth: f64,
    /// Composite headline score in `[0, 100]`
    pub energetic_signature: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eeg_band_ranges() {
        let (delta_low, delta_high) = EegBand::Delta.range_hz();
        let (theta_low, _) = EegBand::Theta.range_hz();

        assert!((delta_low - 0.5).abs() < 0.001);
        assert!((delta_high - theta_low).abs() < 0.001);
    }

    #[test]
    fn test_band_accessors_follow_all_order() {
        let sample = EegSample::from_bands([1.0, 2.0, 3.0, 4.0, 5.0], 42);
        for (i, band) in EegBand::ALL.into_iter().enumerate() {
            assert_eq!(band.index(), i);
            assert_eq!(sample.band(band), sample.bands()[i]);
        }
    }

    #[test]
    fn test_map_bands_keeps_timestamp() {
        let sample = EegSample::from_bands([1.0; 5], 1234);
        let doubled = sample.map_bands(|_, v| v * 2.0);
        assert_eq!(doubled.bands(), [2.0; 5]);
        assert_eq!(doubled.timestamp_ms, 1234);
    }

    #[test]
    fn test_target_state_parse() {
        assert_eq!("FLOW_STATE".parse::<TargetState>(), Ok(TargetState::FlowState));
        assert_eq!("deep-meditation".parse::<TargetState>(), Ok(TargetState::DeepMeditation));
        assert_eq!(" Flow State ".parse::<TargetState>(), Ok(TargetState::FlowState));
        assert_eq!("neutral".parse::<TargetState>(), Ok(TargetState::Neutral));
    }

    #[test]
    fn test_target_state_rejects_unknown() {
        let err = "HYPERFOCUS".parse::<TargetState>().unwrap_err();
        assert_eq!(err, SimError::unknown_state("HYPERFOCUS"));
        assert!("".parse::<TargetState>().is_err());
    }

    #[test]
    fn test_target_state_name_round_trip() {
        for state in TargetState::ALL {
            assert_eq!(state.name().parse::<TargetState>(), Ok(state));
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.target_state, TargetState::Neutral);
        assert!((config.noise_level - 0.1).abs() < f64::EPSILON);
        assert!((config.amplitude_scale - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut config = SimulatorConfig::default();
        config.apply(ParameterUpdate::amplitude_scale(2.5)).unwrap();
        assert!((config.amplitude_scale - 2.5).abs() < f64::EPSILON);
        assert!((config.noise_level - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_is_atomic_on_error() {
        let mut config = SimulatorConfig::default();
        let update = ParameterUpdate { noise_level: Some(0.5), amplitude_scale: Some(0.0) };
        assert_eq!(config.apply(update), Err(SimError::InvalidAmplitudeScale { value: 0.0 }));
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimulatorConfig::default();
        config.noise_level = -0.1;
        assert!(matches!(config.validate(), Err(SimError::InvalidNoiseLevel { .. })));

        let mut config = SimulatorConfig::default();
        config.amplitude_scale = f64::NAN;
        assert!(matches!(config.validate(), Err(SimError::InvalidAmplitudeScale { .. })));

        let mut config = SimulatorConfig::default();
        config.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidTickInterval { .. })));
    }

    #[test]
    fn test_metrics_serialize_camel_case() {
        let json = serde_json::to_value(BrainMetrics::default()).unwrap();
        assert!(json.get("eegData").and_then(|d| d.get("alphaWave")).is_some());
        assert!(json.get("betaGammaAlpha").is_some());
        assert!(json.get("energeticSignature").is_some());
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"targetState":"FOCUS","noiseLevel":0.0}"#).unwrap();
        assert_eq!(config.target_state, TargetState::Focus);
        assert_eq!(config.noise_level, 0.0);
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }
}
