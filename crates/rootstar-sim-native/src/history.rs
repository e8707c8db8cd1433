//! Rolling band history for charting

use std::collections::VecDeque;

use rootstar_sim_core::{BrainMetrics, EegBand, EegSample};
use serde::{Deserialize, Serialize};

/// Points kept by [`WaveHistory::default`], one chart window
pub const DEFAULT_HISTORY_LEN: usize = 100;

/// One chart point: the five band amplitudes at a timestamp
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePoint {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Delta amplitude
    pub delta: f64,
    /// Theta amplitude
    pub theta: f64,
    /// Alpha amplitude
    pub alpha: f64,
    /// Beta amplitude
    pub beta: f64,
    /// Gamma amplitude
    pub gamma: f64,
}

impl From<&EegSample> for WavePoint {
    fn from(sample: &EegSample) -> Self {
        Self {
            timestamp: sample.timestamp_ms,
            delta: sample.delta,
            theta: sample.theta,
            alpha: sample.alpha,
            beta: sample.beta,
            gamma: sample.gamma,
        }
    }
}

/// Bounded FIFO of [`WavePoint`]s. The oldest point is evicted once full.
#[derive(Clone, Debug)]
pub struct WaveHistory {
    points: VecDeque<WavePoint>,
    capacity: usize,
}

impl WaveHistory {
    /// Create a history holding at most `capacity` points (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the sample carried by one tick's metrics
    pub fn push(&mut self, metrics: &BrainMetrics) {
        self.push_sample(&metrics.sample);
    }

    /// Append a raw sample
    pub fn push_sample(&mut self, sample: &EegSample) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(WavePoint::from(sample));
    }

    /// Points currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum points held
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent point
    #[must_use]
    pub fn latest(&self) -> Option<&WavePoint> {
        self.points.back()
    }

    /// Points oldest first
    pub fn iter(&self) -> impl Iterator<Item = &WavePoint> {
        self.points.iter()
    }

    /// Values of one band, oldest first
    #[must_use]
    pub fn band_series(&self, band: EegBand) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| match band {
                EegBand::Delta => p.delta,
                EegBand::Theta => p.theta,
                EegBand::Alpha => p.alpha,
                EegBand::Beta => p.beta,
                EegBand::Gamma => p.gamma,
            })
            .collect()
    }

    /// Drop every point
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for WaveHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
