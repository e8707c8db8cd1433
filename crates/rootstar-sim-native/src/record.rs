//! Flattened per-tick metric rows for storage collaborators.
//!
//! Storage accepts a flat JSON object per tick. Absent or `null` numeric
//! fields are read as 0 and no range checks are applied on the way in.
//! JSON has no infinity, so an overflowed value is written as `null` and
//! reads back as 0.

use rootstar_sim_core::{BrainMetrics, EegSample};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;

/// One stored metric row
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricRecord {
    /// Owning session, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Milliseconds since the Unix epoch
    #[serde(deserialize_with = "null_as_zero")]
    pub timestamp: u64,
    /// Delta amplitude
    #[serde(deserialize_with = "null_as_zero")]
    pub delta_wave: f64,
    /// Theta amplitude
    #[serde(deserialize_with = "null_as_zero")]
    pub theta_wave: f64,
    /// Alpha amplitude
    #[serde(deserialize_with = "null_as_zero")]
    pub alpha_wave: f64,
    /// Beta amplitude
    #[serde(deserialize_with = "null_as_zero")]
    pub beta_wave: f64,
    /// Gamma amplitude
    #[serde(deserialize_with = "null_as_zero")]
    pub gamma_wave: f64,
    /// Alpha/theta ratio
    #[serde(deserialize_with = "null_as_zero")]
    pub alpha_theta: f64,
    /// (Beta + gamma)/alpha ratio
    #[serde(deserialize_with = "null_as_zero")]
    pub beta_gamma_alpha: f64,
    /// Coherence
    #[serde(deserialize_with = "null_as_zero")]
    pub coherence: f64,
    /// Energetic signature
    #[serde(deserialize_with = "null_as_zero")]
    pub energetic_signature: f64,
    /// Focus score
    #[serde(deserialize_with = "null_as_zero")]
    pub focus_score: f64,
    /// Calm score
    #[serde(deserialize_with = "null_as_zero")]
    pub calm_score: f64,
    /// Meditation depth
    #[serde(deserialize_with = "null_as_zero")]
    pub meditation_depth: f64,
}

fn null_as_zero<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MetricRecord {
    /// Flatten one tick's metrics
    #[must_use]
    pub fn from_metrics(metrics: &BrainMetrics, session_id: Option<Uuid>) -> Self {
        let s = &metrics.sample;
        Self {
            session_id,
            timestamp: s.timestamp_ms,
            delta_wave: s.delta,
            theta_wave: s.theta,
            alpha_wave: s.alpha,
            beta_wave: s.beta,
            gamma_wave: s.gamma,
            alpha_theta: metrics.alpha_theta,
            beta_gamma_alpha: metrics.beta_gamma_alpha,
            coherence: metrics.coherence,
            energetic_signature: metrics.energetic_signature,
            focus_score: metrics.focus_score,
            calm_score: metrics.calm_score,
            meditation_depth: metrics.meditation_depth,
        }
    }

    /// Rebuild the metric record
    #[must_use]
    pub fn to_metrics(&self) -> BrainMetrics {
        BrainMetrics {
            sample: EegSample::from_bands(
                [self.delta_wave, self.theta_wave, self.alpha_wave, self.beta_wave, self.gamma_wave],
                self.timestamp,
            ),
            alpha_theta: self.alpha_theta,
            beta_gamma_alpha: self.beta_gamma_alpha,
            coherence: self.coherence,
            focus_score: self.focus_score,
            calm_score: self.calm_score,
            meditation_depth: self.meditation_depth,
            energetic_signature: self.energetic_signature,
        }
    }

    /// Encode as a JSON object
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> RecordResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON object
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> RecordResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
