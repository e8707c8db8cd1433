//! Deterministic multi-band waveform synthesis
//!
//! Each band is a sinusoid of the tick counter plus bounded uniform jitter:
//!
//! ```text
//! band(n) = sin(n * 0.01 * f_band) * a_band + U(-0.5, 0.5) * noise_level
//! ```

use rand::Rng;

use crate::types::{EegBand, EegSample};

/// Conversion from tick counter to synthesis time
pub const TIME_STEP: f64 = 0.01;

/// Fixed synthesis constants for one band.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BandWaveform {
    /// Frequency multiplier applied to synthesis time
    pub frequency: f64,
    /// Peak amplitude of the sinusoid
    pub amplitude: f64,
}

impl BandWaveform {
    /// Synthesis constants for a band
    #[must_use]
    pub const fn for_band(band: EegBand) -> Self {
        match band {
            EegBand::Delta => Self { frequency: 0.5, amplitude: 0.8 },
            EegBand::Theta => Self { frequency: 1.2, amplitude: 0.7 },
            EegBand::Alpha => Self { frequency: 2.5, amplitude: 0.9 },
            EegBand::Beta => Self { frequency: 4.0, amplitude: 0.6 },
            EegBand::Gamma => Self { frequency: 8.0, amplitude: 0.4 },
        }
    }

    /// Noise-free value at synthesis time `t`
    #[inline]
    #[must_use]
    pub fn value_at(self, t: f64) -> f64 {
        libm::sin(t * self.frequency) * self.amplitude
    }
}

/// Produces one raw sample per tick.
///
/// The generator holds no state of its own; the tick counter and random
/// source are supplied by the caller so identical inputs give identical
/// output.
#[derive(Copy, Clone, Debug, Default)]
pub struct WaveformGenerator;

impl WaveformGenerator {
    /// Create a generator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate the raw sample for tick `n`.
    ///
    /// One jitter value is drawn per band, in [`EegBand::ALL`] order, even
    /// when `noise_level` is zero so the random stream advances identically
    /// regardless of configuration.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        tick: u64,
        noise_level: f64,
        timestamp_ms: u64,
        rng: &mut R,
    ) -> EegSample {
        let t = tick as f64 * TIME_STEP;
        let mut bands = [0.0; 5];
        for band in EegBand::ALL {
            let jitter = rng.gen_range(-0.5_f64..=0.5) * noise_level;
            bands[band.index()] = BandWaveform::for_band(band).value_at(t) + jitter;
        }
        EegSample::from_bands(bands, timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_tick_zero_is_silent_without_noise() {
        let mut rng = SmallRng::seed_from_u64(7);
        let sample = WaveformGenerator::new().generate(0, 0.0, 0, &mut rng);
        assert_eq!(sample.bands(), [0.0; 5]);
    }

    #[test]
    fn test_noise_free_generation_is_deterministic() {
        let generator = WaveformGenerator::new();
        let mut rng_a = SmallRng::seed_from_u64(1);
        let mut rng_b = SmallRng::seed_from_u64(99);

        for tick in [1, 17, 250, 10_000] {
            let a = generator.generate(tick, 0.0, 5, &mut rng_a);
            let b = generator.generate(tick, 0.0, 5, &mut rng_b);
            for (x, y) in a.bands().iter().zip(b.bands().iter()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_band_formula() {
        let mut rng = SmallRng::seed_from_u64(3);
        let tick = 123;
        let sample = WaveformGenerator::new().generate(tick, 0.0, 0, &mut rng);
        let t = tick as f64 * 0.01;

        let expected = [
            (t * 0.5).sin() * 0.8,
            (t * 1.2).sin() * 0.7,
            (t * 2.5).sin() * 0.9,
            (t * 4.0).sin() * 0.6,
            (t * 8.0).sin() * 0.4,
        ];
        for (got, want) in sample.bands().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_jitter_is_bounded() {
        let generator = WaveformGenerator::new();
        let mut rng = SmallRng::seed_from_u64(11);
        let noise = 2.0;

        for tick in 0..2_000 {
            let sample = generator.generate(tick, noise, 0, &mut rng);
            let t = tick as f64 * TIME_STEP;
            for band in EegBand::ALL {
                let clean = BandWaveform::for_band(band).value_at(t);
                let jitter = sample.band(band) - clean;
                assert!(jitter.abs() <= 0.5 * noise + 1e-12, "jitter {jitter} out of range");
            }
        }
    }

    #[test]
    fn test_timestamp_is_passed_through() {
        let mut rng = SmallRng::seed_from_u64(0);
        let sample = WaveformGenerator::new().generate(4, 0.1, 1_700_000_000_000, &mut rng);
        assert_eq!(sample.timestamp_ms, 1_700_000_000_000);
    }
}
