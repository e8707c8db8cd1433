//! Ratio and score derivation
//!
//! All outputs are recomputed from the current sample alone. The only input
//! carried across ticks is the tick counter, which drives the coherence
//! oscillation.
//!
//! | output | formula | range |
//! |---|---|---|
//! | alpha/theta | `safe_alpha / safe_theta` | unbounded |
//! | (beta+gamma)/alpha | `(safe_beta + safe_gamma) / safe_alpha` | unbounded |
//! | coherence | `base + sin(n * freq) * amp` | `[0, 1]` |
//! | focus | `bga*20 + coherence*30 + safe_beta*25` | `[0, 100]` |
//! | calm | `at*25 + safe_alpha*35 + (1 - safe_beta)*40` | `[0, 100]` |
//! | meditation | `safe_theta*40 + safe_alpha*30 + coherence*30` | `[0, 100]` |
//! | energetic | `focus*0.3 + calm*0.3 + meditation*0.25 + coherence*25` | `[0, 100]` |

use crate::types::{BrainMetrics, EegSample, TargetState};

/// Floor applied to band magnitudes before they enter a ratio
pub const MIN_BAND_MAGNITUDE: f64 = 0.001;

/// Upper bound of every score
pub const SCORE_MAX: f64 = 100.0;

/// Magnitude of a band, floored at [`MIN_BAND_MAGNITUDE`].
#[inline]
#[must_use]
pub fn safe_magnitude(value: f64) -> f64 {
    libm::fabs(value).max(MIN_BAND_MAGNITUDE)
}

/// Clamp into `[lo, hi]`, mapping NaN to `lo`.
#[inline]
#[must_use]
pub fn clamp_range(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Clamp a score into `[0, 100]`
#[inline]
#[must_use]
pub fn clamp_score(value: f64) -> f64 {
    clamp_range(value, 0.0, SCORE_MAX)
}

/// Sinusoidal coherence wobble around a state-specific baseline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoherenceProfile {
    /// Baseline coherence
    pub base: f64,
    /// Oscillation amplitude
    pub amplitude: f64,
    /// Oscillation frequency per tick
    pub frequency: f64,
}

impl CoherenceProfile {
    /// Profile for a target state
    #[must_use]
    pub const fn for_state(state: TargetState) -> Self {
        match state {
            TargetState::FlowState => Self { base: 0.8, amplitude: 0.15, frequency: 0.005 },
            TargetState::DeepMeditation => Self { base: 0.7, amplitude: 0.2, frequency: 0.003 },
            TargetState::Focus => Self { base: 0.6, amplitude: 0.15, frequency: 0.007 },
            TargetState::Neutral | TargetState::Relaxation => {
                Self { base: 0.5, amplitude: 0.1, frequency: 0.004 }
            }
        }
    }

    /// Coherence at tick `n`, clamped to `[0, 1]`
    #[must_use]
    pub fn at(&self, tick: u64) -> f64 {
        let raw = self.base + libm::sin(tick as f64 * self.frequency) * self.amplitude;
        clamp_range(raw, 0.0, 1.0)
    }
}

/// Derives behavioral scores from modulated samples.
#[derive(Copy, Clone, Debug, Default)]
pub struct MetricCalculator;

impl MetricCalculator {
    /// Create a calculator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compute the full metric record for one tick.
    #[must_use]
    pub fn compute(&self, sample: &EegSample, state: TargetState, tick: u64) -> BrainMetrics {
        let safe_alpha = safe_magnitude(sample.alpha);
        let safe_theta = safe_magnitude(sample.theta);
        let safe_beta = safe_magnitude(sample.beta);
        let safe_gamma = safe_magnitude(sample.gamma);

        let alpha_theta = safe_alpha / safe_theta;
        let beta_gamma_alpha = (safe_beta + safe_gamma) / safe_alpha;

        let coherence = CoherenceProfile::for_state(state).at(tick);

        let focus_score =
            clamp_score(beta_gamma_alpha * 20.0 + coherence * 30.0 + safe_beta * 25.0);
        let calm_score =
            clamp_score(alpha_theta * 25.0 + safe_alpha * 35.0 + (1.0 - safe_beta) * 40.0);
        let meditation_depth =
            clamp_score(safe_theta * 40.0 + safe_alpha * 30.0 + coherence * 30.0);
        let energetic_signature = clamp_score(
            focus_score * 0.3 + calm_score * 0.3 + meditation_depth * 0.25 + coherence * 25.0,
        );

        BrainMetrics {
            sample: *sample,
            alpha_theta,
            beta_gamma_alpha,
            coherence,
            focus_score,
            calm_score,
            meditation_depth,
            energetic_signature,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn assert_bounded(m: &BrainMetrics) {
        assert!((0.0..=1.0).contains(&m.coherence), "coherence {}", m.coherence);
        for score in [m.focus_score, m.calm_score, m.meditation_depth, m.energetic_signature] {
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn test_zero_sample_neutral_tick_zero() {
        let sample = EegSample::from_bands([0.0; 5], 0);
        let m = MetricCalculator::new().compute(&sample, TargetState::Neutral, 0);

        assert_eq!(m.alpha_theta, 1.0);
        assert_eq!(m.beta_gamma_alpha, 2.0);
        assert_eq!(m.coherence, 0.5);

        let s = 0.001;
        let focus = 2.0 * 20.0 + 0.5 * 30.0 + s * 25.0;
        let calm = 1.0 * 25.0 + s * 35.0 + (1.0 - s) * 40.0;
        let meditation = s * 40.0 + s * 30.0 + 0.5 * 30.0;
        let energetic = focus * 0.3 + calm * 0.3 + meditation * 0.25 + 0.5 * 25.0;

        assert_eq!(m.focus_score, focus);
        assert_eq!(m.calm_score, calm);
        assert_eq!(m.meditation_depth, meditation);
        assert_eq!(m.energetic_signature, energetic);
        assert!((m.focus_score - 55.025).abs() < 1e-9);
        assert!((m.calm_score - 64.995).abs() < 1e-9);
        assert!((m.meditation_depth - 15.07).abs() < 1e-9);
        assert!((m.energetic_signature - 52.2735).abs() < 1e-9);
    }

    #[test]
    fn test_ratios_use_floored_magnitudes() {
        let sample = EegSample::from_bands([0.0, -0.4, 0.2, -0.0001, 0.3], 0);
        let m = MetricCalculator::new().compute(&sample, TargetState::Focus, 10);

        assert_eq!(m.alpha_theta, 0.2 / 0.4);
        assert_eq!(m.beta_gamma_alpha, (0.001 + 0.3) / 0.2);
    }

    #[test]
    fn test_coherence_profiles() {
        let cases = [
            (TargetState::FlowState, 0.8, 0.15, 0.005),
            (TargetState::DeepMeditation, 0.7, 0.2, 0.003),
            (TargetState::Focus, 0.6, 0.15, 0.007),
            (TargetState::Relaxation, 0.5, 0.1, 0.004),
            (TargetState::Neutral, 0.5, 0.1, 0.004),
        ];
        for (state, base, amp, freq) in cases {
            let profile = CoherenceProfile::for_state(state);
            assert_eq!(profile, CoherenceProfile { base, amplitude: amp, frequency: freq });
            for tick in [0_u64, 1, 314, 1_000, 99_999] {
                let expected = (base + (tick as f64 * freq).sin() * amp).clamp(0.0, 1.0);
                assert!((profile.at(tick) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_scores_clamped_for_extreme_inputs() {
        let calc = MetricCalculator::new();
        let extremes = [
            [1e9, -1e9, 1e-12, 1e9, 1e9],
            [0.0, 1e12, 0.0, 0.0, 0.0],
            [-5.0, 0.0, -1e6, 1e6, -1e6],
            [f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX],
            [f64::INFINITY, f64::INFINITY, f64::INFINITY, f64::INFINITY, f64::INFINITY],
        ];
        for bands in extremes {
            for state in TargetState::ALL {
                let m = calc.compute(&EegSample::from_bands(bands, 0), state, 5);
                assert_bounded(&m);
            }
        }
    }

    #[test]
    fn test_scores_bounded_for_random_samples() {
        let calc = MetricCalculator::new();
        let mut rng = SmallRng::seed_from_u64(2024);
        for tick in 0..5_000_u64 {
            let bands: [f64; 5] = core::array::from_fn(|_| rng.gen_range(-50.0..50.0));
            let state = TargetState::ALL[(tick % 5) as usize];
            assert_bounded(&calc.compute(&EegSample::from_bands(bands, 0), state, tick));
        }
    }

    #[test]
    fn test_clamp_range_maps_nan_to_floor() {
        assert_eq!(clamp_range(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp_score(150.0), 100.0);
        assert_eq!(clamp_score(-3.0), 0.0);
    }

    #[test]
    fn test_sample_is_carried_through() {
        let sample = EegSample::from_bands([0.1, 0.2, 0.3, 0.4, 0.5], 77);
        let m = MetricCalculator::new().compute(&sample, TargetState::Relaxation, 3);
        assert_eq!(m.sample, sample);
    }
}
