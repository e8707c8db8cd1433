//! Mapping from metrics to visual parameters
//!
//! Renderers read one [`BrainMetrics`] per tick and drive model motion,
//! colour and glow from it. The mapping lives here so every frontend reacts
//! the same way.

use serde::{Deserialize, Serialize};

use crate::metrics::clamp_score;
use crate::types::BrainMetrics;

/// Coarse band of the energetic signature, used for gauge colouring.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignatureTier {
    /// Below 25
    Low,
    /// 25 to 50
    Moderate,
    /// 50 to 75
    High,
    /// 75 and above
    Peak,
}

impl SignatureTier {
    /// Classify an energetic signature value
    #[must_use]
    pub fn classify(value: f64) -> Self {
        let value = clamp_score(value);
        if value < 25.0 {
            Self::Low
        } else if value < 50.0 {
            Self::Moderate
        } else if value < 75.0 {
            Self::High
        } else {
            Self::Peak
        }
    }
}

/// Per-frame visual parameters derived from one metric record.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionParams {
    /// Rotation about the vertical axis, radians per second
    pub rotation_rate_y: f64,
    /// Rotation about the horizontal axis, radians per second
    pub rotation_rate_x: f64,
    /// Uniform model scale
    pub scale: f64,
    /// HSL hue in `[0, 0.7]`
    pub hue: f64,
    /// HSL saturation in `[0.8, 1.0]`
    pub saturation: f64,
    /// HSL lightness in `[0.4, 0.9]`
    pub lightness: f64,
    /// Emissive glow intensity in `[0, 0.3]`
    pub emissive_intensity: f64,
    /// Gauge tier of the energetic signature
    pub tier: SignatureTier,
}

impl ReactionParams {
    /// Derive visual parameters from metrics
    #[must_use]
    pub fn from_metrics(metrics: &BrainMetrics) -> Self {
        let energetic = metrics.energetic_signature;
        let coherence = metrics.coherence;

        Self {
            rotation_rate_y: metrics.focus_score / 1000.0,
            rotation_rate_x: metrics.calm_score / 2000.0,
            scale: 0.8 + energetic / 500.0,
            hue: energetic / 100.0 * 0.7,
            saturation: 0.8 + coherence * 0.2,
            lightness: 0.4 + energetic / 200.0,
            emissive_intensity: coherence * 0.3,
            tier: SignatureTier::classify(energetic),
        }
    }
}
