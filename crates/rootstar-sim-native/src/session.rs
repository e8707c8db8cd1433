//! Session tracking
//!
//! A session spans one run of the simulator toward a target state. The
//! tracker folds each emitted [`BrainMetrics`] into peak and running-average
//! energetic signature; finishing it yields a [`SessionSummary`] suitable for
//! persistence. [`SessionStats`] aggregates a history of summaries.

use rootstar_sim_core::{BrainMetrics, TargetState};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Session lifecycle status
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Still recording
    #[default]
    Active,
    /// Ended normally
    Completed,
    /// Ended early by the user
    Interrupted,
    /// Ended by a failure
    Error,
}

/// Accumulates metrics for one session.
#[derive(Clone, Debug)]
pub struct SessionTracker {
    id: Uuid,
    target_state: TargetState,
    model_used: Option<String>,
    started_at_ms: u64,
    last_sample_ms: Option<u64>,
    samples: u64,
    peak_energetic: f64,
    energetic_sum: f64,
}

impl SessionTracker {
    /// Open a session with a fresh random id
    #[must_use]
    pub fn new(target_state: TargetState, started_at_ms: u64) -> Self {
        Self::with_id(Uuid::new_v4(), target_state, started_at_ms)
    }

    /// Open a session with a known id
    #[must_use]
    pub fn with_id(id: Uuid, target_state: TargetState, started_at_ms: u64) -> Self {
        debug!(session = %id, state = %target_state, "Session opened");
        Self {
            id,
            target_state,
            model_used: None,
            started_at_ms,
            last_sample_ms: None,
            samples: 0,
            peak_energetic: 0.0,
            energetic_sum: 0.0,
        }
    }

    /// Attach the name of the model shown during the session
    #[must_use]
    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.model_used = Some(name.into());
        self
    }

    /// Fold one tick's metrics into the session
    pub fn record(&mut self, metrics: &BrainMetrics) {
        let energetic = metrics.energetic_signature;
        self.samples += 1;
        self.energetic_sum += energetic;
        self.peak_energetic = self.peak_energetic.max(energetic);
        self.last_sample_ms = Some(metrics.sample.timestamp_ms);
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Target state the session was opened for
    #[must_use]
    pub fn target_state(&self) -> TargetState {
        self.target_state
    }

    /// Metrics recorded so far
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Highest energetic signature seen, 0 before the first sample
    #[must_use]
    pub fn peak_energetic(&self) -> f64 {
        self.peak_energetic
    }

    /// Mean energetic signature, 0 before the first sample
    #[must_use]
    pub fn average_energetic(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.energetic_sum / self.samples as f64
        }
    }

    /// Summary of the session while it is still active
    #[must_use]
    pub fn snapshot(&self) -> SessionSummary {
        let until = self.last_sample_ms.unwrap_or(self.started_at_ms);
        self.summarize(SessionStatus::Active, None, until)
    }

    /// Close the session
    #[must_use]
    pub fn finish(self, status: SessionStatus, ended_at_ms: u64) -> SessionSummary {
        let summary = self.summarize(status, Some(ended_at_ms), ended_at_ms);
        debug!(
            session = %summary.id,
            status = ?summary.status,
            samples = summary.samples,
            "Session closed"
        );
        summary
    }

    fn summarize(&self, status: SessionStatus, ended_at_ms: Option<u64>, until_ms: u64) -> SessionSummary {
        SessionSummary {
            id: self.id,
            target_state: self.target_state,
            status,
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_secs: until_ms.saturating_sub(self.started_at_ms) / 1000,
            samples: self.samples,
            peak_energetic_score: self.peak_energetic,
            average_energetic_score: self.average_energetic(),
            model_used: self.model_used.clone(),
            notes: None,
        }
    }
}

/// Persisted summary of one session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id
    pub id: Uuid,
    /// Target state the session ran toward
    pub target_state: TargetState,
    /// Final or current status
    pub status: SessionStatus,
    /// Start time in milliseconds since the Unix epoch
    pub started_at_ms: u64,
    /// End time, unset while active
    pub ended_at_ms: Option<u64>,
    /// Whole seconds between start and end
    pub duration_secs: u64,
    /// Metrics recorded
    pub samples: u64,
    /// Highest energetic signature
    pub peak_energetic_score: f64,
    /// Mean energetic signature
    pub average_energetic_score: f64,
    /// Model shown during the session
    pub model_used: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl SessionSummary {
    /// Attach notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Aggregate statistics over many sessions
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Number of sessions
    pub total_sessions: usize,
    /// Mean session duration in seconds
    pub average_duration_secs: f64,
    /// Highest peak energetic signature across sessions
    pub best_energetic_score: f64,
    /// Most frequently chosen target state; ties go to the earlier state in
    /// [`TargetState::ALL`]
    pub favorite_target_state: Option<TargetState>,
    /// Sum of session durations in seconds
    pub total_time_secs: u64,
}

impl SessionStats {
    /// Aggregate a list of session summaries
    #[must_use]
    pub fn from_sessions(sessions: &[SessionSummary]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }

        let total_time_secs: u64 = sessions.iter().map(|s| s.duration_secs).sum();
        let best_energetic_score = sessions
            .iter()
            .map(|s| s.peak_energetic_score)
            .fold(0.0, f64::max);

        let mut counts = [0_usize; TargetState::ALL.len()];
        for session in sessions {
            if let Some(i) = TargetState::ALL.iter().position(|s| *s == session.target_state) {
                counts[i] += 1;
            }
        }
        let favorite_target_state = counts
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ if count > 0 => Some((i, count)),
                _ => best,
            })
            .map(|(i, _)| TargetState::ALL[i]);

        Self {
            total_sessions: sessions.len(),
            average_duration_secs: total_time_secs as f64 / sessions.len() as f64,
            best_energetic_score,
            favorite_target_state,
            total_time_secs,
        }
    }
}
