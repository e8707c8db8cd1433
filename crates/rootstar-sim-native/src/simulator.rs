//! Brainwave simulator: tick scheduling and metric fan-out
//!
//! # Tick Pipeline
//!
//! ```text
//! TickTimer due → n += 1 → WaveformGenerator → StateModulator → MetricCalculator
//!                                                                    ↓
//!                                              subscribers (registration order)
//! ```
//!
//! Configuration is copied at the start of each tick, so `set_state` and
//! `set_parameters` take effect on the next tick and never alter one in
//! progress. A failing or panicking subscriber is logged and skipped; the
//! remaining subscribers still receive the metrics.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rootstar_sim_core::types::validate_tick_interval;
use rootstar_sim_core::{
    BrainMetrics, MetricCalculator, ParameterUpdate, SimulatorConfig, StateModulator,
    TargetState, WaveformGenerator,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DeliveryResult, SimulatorResult, SubscriberError};
use crate::timer::{MonotonicTimer, TickTimer};

/// Boxed metrics consumer
pub type MetricsCallback = Box<dyn FnMut(&BrainMetrics) -> DeliveryResult + Send>;

/// Token returned by [`Simulator::subscribe`], used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Scheduler lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Not ticking
    #[default]
    Idle,
    /// Ticking on a repeating schedule
    Running,
}

/// Delivery counters
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorStats {
    /// Ticks executed
    pub ticks: u64,
    /// Successful subscriber deliveries
    pub deliveries: u64,
    /// Deliveries that returned an error or panicked
    pub failed_deliveries: u64,
    /// Subscribers removed after reporting a disconnect
    pub dropped_subscribers: u64,
}

struct Subscription {
    id: SubscriptionId,
    callback: MetricsCallback,
}

/// Brainwave simulator instance.
///
/// Each instance owns its configuration, tick counter, random source and
/// subscriber list. Nothing is shared between instances.
pub struct Simulator {
    /// Configuration read at the start of every tick
    config: SimulatorConfig,
    /// Current lifecycle state
    lifecycle: Lifecycle,
    /// Active tick period while running
    interval: Option<Duration>,
    /// Tick counter, incremented before each tick body
    tick: u64,
    /// Waveform synthesis
    generator: WaveformGenerator,
    /// State gain application
    modulator: StateModulator,
    /// Score derivation
    calculator: MetricCalculator,
    /// Jitter source
    rng: StdRng,
    /// Tick schedule and wall clock
    timer: Box<dyn TickTimer>,
    /// Registered consumers in registration order
    subscribers: Vec<Subscription>,
    /// Next subscription id
    next_subscription: u64,
    /// Delivery counters
    stats: SimulatorStats,
    /// Metrics from the most recent tick
    last_metrics: Option<BrainMetrics>,
}

impl Simulator {
    /// Create a simulator with default configuration and a real-time timer
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            SimulatorConfig::default(),
            Box::new(MonotonicTimer::new()),
            StdRng::from_entropy(),
        )
    }

    /// Create with custom configuration and a real-time timer
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_config(config: SimulatorConfig) -> SimulatorResult<Self> {
        SimulatorBuilder::new().config(config).build()
    }

    /// Create with default configuration driven by the given timer
    #[must_use]
    pub fn with_timer(timer: impl TickTimer + 'static) -> Self {
        Self::from_parts(SimulatorConfig::default(), Box::new(timer), StdRng::from_entropy())
    }

    /// Create with a seeded jitter source and a real-time timer
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_parts(
            SimulatorConfig::default(),
            Box::new(MonotonicTimer::new()),
            StdRng::seed_from_u64(seed),
        )
    }

    fn from_parts(config: SimulatorConfig, timer: Box<dyn TickTimer>, rng: StdRng) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Idle,
            interval: None,
            tick: 0,
            generator: WaveformGenerator::new(),
            modulator: StateModulator::new(),
            calculator: MetricCalculator::new(),
            rng,
            timer,
            subscribers: Vec::new(),
            next_subscription: 0,
            stats: SimulatorStats::default(),
            last_metrics: None,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin periodic emission every `interval_ms` milliseconds.
    ///
    /// Calling `start` while already running changes nothing. If the timer
    /// reports that the host cannot schedule ticks, a warning is logged and
    /// the simulator stays idle.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval_ms` is zero.
    pub fn start(&mut self, interval_ms: u64) -> SimulatorResult<()> {
        if self.is_running() {
            debug!("Simulator already running, start ignored");
            return Ok(());
        }
        validate_tick_interval(interval_ms)?;

        let interval = Duration::from_millis(interval_ms);
        if let Err(e) = self.timer.arm(interval) {
            warn!(error = %e, "Simulator cannot start without a timer");
            return Ok(());
        }

        self.lifecycle = Lifecycle::Running;
        self.interval = Some(interval);
        info!(
            interval_ms,
            state = %self.config.target_state,
            "Simulator started"
        );
        Ok(())
    }

    /// Start using the configured `tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured interval is zero.
    pub fn start_default(&mut self) -> SimulatorResult<()> {
        self.start(self.config.tick_interval_ms)
    }

    /// Halt emission. Once this returns no further ticks run until the next
    /// `start`. Calling `stop` while idle changes nothing.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.timer.disarm();
        self.lifecycle = Lifecycle::Idle;
        self.interval = None;
        info!(ticks = self.tick, "Simulator stopped");
    }

    /// Whether the simulator is ticking
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Current lifecycle state
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Active tick period, if running
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Select the target state; effective from the next tick
    pub fn set_state(&mut self, state: TargetState) {
        if state != self.config.target_state {
            debug!(from = %self.config.target_state, to = %state, "Target state changed");
        }
        self.config.target_state = state;
    }

    /// Parse and select a target state by name
    ///
    /// # Errors
    ///
    /// Returns an error for names that match no state; the active state is
    /// left unchanged.
    pub fn set_state_named(&mut self, name: &str) -> SimulatorResult<TargetState> {
        let state = name.parse::<TargetState>()?;
        self.set_state(state);
        Ok(state)
    }

    /// Active target state
    #[must_use]
    pub fn state(&self) -> TargetState {
        self.config.target_state
    }

    /// Update noise level and/or amplitude scale; effective from the next tick
    ///
    /// # Errors
    ///
    /// Returns an error if any supplied value is invalid, in which case no
    /// field is changed.
    pub fn set_parameters(&mut self, update: ParameterUpdate) -> SimulatorResult<()> {
        self.config.apply(update)?;
        debug!(
            noise_level = self.config.noise_level,
            amplitude_scale = self.config.amplitude_scale,
            "Parameters updated"
        );
        Ok(())
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    /// Register a metrics consumer. Consumers are called in registration
    /// order on every tick.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&BrainMetrics) -> DeliveryResult + Send + 'static,
    {
        self.subscribe_boxed(Box::new(callback))
    }

    /// Register an already boxed consumer
    pub fn subscribe_boxed(&mut self, callback: MetricsCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscription { id, callback });
        debug!(subscription = %id, "Subscriber registered");
        id
    }

    /// Remove a consumer. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        let removed = self.subscribers.len() != before;
        if removed {
            debug!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    /// Number of registered consumers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ========================================================================
    // Ticking
    // ========================================================================

    /// Run every tick the timer reports as due. Returns the number of ticks
    /// executed; always zero while idle.
    pub fn poll(&mut self) -> usize {
        if !self.is_running() {
            return 0;
        }

        let due = self.timer.take_due();
        for _ in 0..due {
            self.run_tick();
        }
        usize::try_from(due).unwrap_or(usize::MAX)
    }

    /// Time until the next tick, or `None` while idle
    #[must_use]
    pub fn until_next_tick(&self) -> Option<Duration> {
        if self.is_running() {
            self.timer.until_next()
        } else {
            None
        }
    }

    /// Ticks executed so far
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Delivery counters
    #[must_use]
    pub fn stats(&self) -> SimulatorStats {
        self.stats
    }

    /// Metrics from the most recent tick
    #[must_use]
    pub fn last_metrics(&self) -> Option<&BrainMetrics> {
        self.last_metrics.as_ref()
    }

    fn run_tick(&mut self) {
        self.tick += 1;
        let config = self.config;
        let timestamp_ms = self.timer.now_ms();

        let raw = self
            .generator
            .generate(self.tick, config.noise_level, timestamp_ms, &mut self.rng);
        let modulated = self
            .modulator
            .apply(&raw, config.target_state, config.amplitude_scale);
        let metrics = self
            .calculator
            .compute(&modulated, config.target_state, self.tick);

        self.stats.ticks += 1;
        self.deliver(&metrics);
        self.last_metrics = Some(metrics);
    }

    fn deliver(&mut self, metrics: &BrainMetrics) {
        let mut disconnected = Vec::new();

        for subscription in &mut self.subscribers {
            let callback = &mut subscription.callback;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(metrics)));

            match outcome {
                Ok(Ok(())) => self.stats.deliveries += 1,
                Ok(Err(SubscriberError::Disconnected)) => disconnected.push(subscription.id),
                Ok(Err(e)) => {
                    self.stats.failed_deliveries += 1;
                    warn!(subscription = %subscription.id, error = %e, "Error in subscriber callback");
                }
                Err(_) => {
                    self.stats.failed_deliveries += 1;
                    warn!(subscription = %subscription.id, "Subscriber callback panicked");
                }
            }
        }

        if !disconnected.is_empty() {
            self.subscribers.retain(|s| !disconnected.contains(&s.id));
            self.stats.dropped_subscribers += disconnected.len() as u64;
            info!(count = disconnected.len(), "Removed disconnected subscribers");
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .field("interval", &self.interval)
            .field("tick", &self.tick)
            .field("subscribers", &self.subscribers.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Simulator builder for custom timers, seeds and configuration
pub struct SimulatorBuilder {
    config: SimulatorConfig,
    timer: Option<Box<dyn TickTimer>>,
    seed: Option<u64>,
}

impl SimulatorBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SimulatorConfig::default(),
            timer: None,
            seed: None,
        }
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial target state
    #[must_use]
    pub fn target_state(mut self, state: TargetState) -> Self {
        self.config.target_state = state;
        self
    }

    /// Set the noise level
    #[must_use]
    pub fn noise_level(mut self, noise_level: f64) -> Self {
        self.config.noise_level = noise_level;
        self
    }

    /// Set the amplitude scale
    #[must_use]
    pub fn amplitude_scale(mut self, amplitude_scale: f64) -> Self {
        self.config.amplitude_scale = amplitude_scale;
        self
    }

    /// Set the default tick interval
    #[must_use]
    pub fn tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.tick_interval_ms = interval_ms;
        self
    }

    /// Inject a timer
    #[must_use]
    pub fn timer(mut self, timer: impl TickTimer + 'static) -> Self {
        self.timer = Some(Box::new(timer));
        self
    }

    /// Seed the jitter source for reproducible output
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the simulator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn build(self) -> SimulatorResult<Simulator> {
        self.config.validate()?;

        let timer = self
            .timer
            .unwrap_or_else(|| Box::new(MonotonicTimer::new()));
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Simulator::from_parts(self.config, timer, rng))
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rootstar_sim_core::{BandGains, SimError};

    use super::*;
    use crate::error::SimulatorError;
    use crate::timer::{ManualClock, ManualTimer, NoTimer};

    fn manual_simulator() -> (Simulator, ManualClock) {
        let (timer, clock) = ManualTimer::new(1_700_000_000_000);
        let sim = SimulatorBuilder::new()
            .timer(timer)
            .seed(42)
            .build()
            .unwrap();
        (sim, clock)
    }

    fn collector(sim: &mut Simulator) -> (SubscriptionId, Arc<Mutex<Vec<BrainMetrics>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = sim.subscribe(move |m: &BrainMetrics| {
            sink.lock().unwrap().push(*m);
            Ok(())
        });
        (id, seen)
    }

    #[test]
    fn test_simulator_creation() {
        let sim = Simulator::new();
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.lifecycle(), Lifecycle::Idle);
        assert_eq!(sim.state(), TargetState::Neutral);
    }

    #[test]
    fn test_convenience_constructors() {
        let (timer, clock) = ManualTimer::new(0);
        let mut sim = Simulator::with_timer(timer);
        sim.start(10).unwrap();
        clock.advance_ms(10);
        assert_eq!(sim.poll(), 1);

        let seeded = Simulator::with_seed(3);
        assert_eq!(seeded.config(), &SimulatorConfig::default());

        let focus = SimulatorConfig { target_state: TargetState::Focus, ..SimulatorConfig::default() };
        assert_eq!(Simulator::with_config(focus).unwrap().state(), TargetState::Focus);
    }

    #[test]
    fn test_idle_simulator_never_ticks() {
        let (mut sim, clock) = manual_simulator();
        let (_, seen) = collector(&mut sim);
        clock.advance_ms(1_000);
        assert_eq!(sim.poll(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ticks_follow_interval() {
        let (mut sim, clock) = manual_simulator();
        let (_, seen) = collector(&mut sim);
        sim.start(100).unwrap();

        clock.advance_ms(99);
        assert_eq!(sim.poll(), 0);
        clock.advance_ms(401);
        assert_eq!(sim.poll(), 5);

        assert_eq!(sim.tick_count(), 5);
        assert_eq!(seen.lock().unwrap().len(), 5);
        assert_eq!(sim.stats().deliveries, 5);
    }

    #[test]
    fn test_start_twice_does_not_double_schedule() {
        let (mut sim, clock) = manual_simulator();
        let (_, seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(50);
        sim.start(10).unwrap();
        assert_eq!(sim.interval(), Some(Duration::from_millis(100)));

        clock.advance_ms(50);
        assert_eq!(sim.poll(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_halts_delivery() {
        let (mut sim, clock) = manual_simulator();
        let (_, seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(200);
        assert_eq!(sim.poll(), 2);

        sim.stop();
        assert!(!sim.is_running());
        clock.advance_ms(1_000);
        assert_eq!(sim.poll(), 0);
        assert_eq!(seen.lock().unwrap().len(), 2);

        sim.stop();
        assert_eq!(sim.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn test_restart_resumes_counter() {
        let (mut sim, clock) = manual_simulator();
        sim.start(10).unwrap();
        clock.advance_ms(30);
        sim.poll();
        sim.stop();

        sim.start(10).unwrap();
        clock.advance_ms(10);
        sim.poll();
        assert_eq!(sim.tick_count(), 4);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let (mut sim, _) = manual_simulator();
        assert_eq!(
            sim.start(0),
            Err(SimulatorError::Invalid(SimError::InvalidTickInterval { interval_ms: 0 }))
        );
        assert!(!sim.is_running());
    }

    #[test]
    fn test_start_without_timer_is_noop() {
        let mut sim = SimulatorBuilder::new().timer(NoTimer).build().unwrap();
        assert!(sim.start(100).is_ok());
        assert!(!sim.is_running());
        assert_eq!(sim.poll(), 0);
        assert_eq!(sim.until_next_tick(), None);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (mut sim, clock) = manual_simulator();
        let (first, first_seen) = collector(&mut sim);
        let (_, second_seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(100);
        sim.poll();

        assert!(sim.unsubscribe(first));
        assert!(!sim.unsubscribe(first));
        clock.advance_ms(300);
        sim.poll();

        assert_eq!(first_seen.lock().unwrap().len(), 1);
        assert_eq!(second_seen.lock().unwrap().len(), 4);
        assert_eq!(sim.subscriber_count(), 1);
    }

    #[test]
    fn test_failing_subscribers_are_isolated() {
        let (mut sim, clock) = manual_simulator();
        sim.subscribe(|_: &BrainMetrics| Err(SubscriberError::failed("storage offline")));
        sim.subscribe(|_: &BrainMetrics| -> DeliveryResult { panic!("renderer crashed") });
        let (_, seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(300);
        assert_eq!(sim.poll(), 3);

        assert_eq!(seen.lock().unwrap().len(), 3);
        let stats = sim.stats();
        assert_eq!(stats.failed_deliveries, 6);
        assert_eq!(stats.deliveries, 3);
        assert_eq!(sim.subscriber_count(), 3);
    }

    #[test]
    fn test_disconnected_subscriber_removed() {
        let (mut sim, clock) = manual_simulator();
        sim.subscribe(|_: &BrainMetrics| Err(SubscriberError::Disconnected));
        let (_, seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(200);
        sim.poll();

        assert_eq!(sim.subscriber_count(), 1);
        assert_eq!(sim.stats().dropped_subscribers, 1);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let (mut sim, clock) = manual_simulator();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["storage", "renderer", "chart"] {
            let order = Arc::clone(&order);
            sim.subscribe(move |_: &BrainMetrics| {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }

        sim.start(100).unwrap();
        clock.advance_ms(100);
        sim.poll();

        assert_eq!(*order.lock().unwrap(), vec!["storage", "renderer", "chart"]);
    }

    #[test]
    fn test_state_change_applies_next_tick() {
        let (timer, clock) = ManualTimer::new(0);
        let mut sim = SimulatorBuilder::new()
            .timer(timer)
            .noise_level(0.0)
            .seed(1)
            .build()
            .unwrap();
        let (_, seen) = collector(&mut sim);

        sim.start(100).unwrap();
        clock.advance_ms(100);
        sim.poll();
        sim.set_state(TargetState::Focus);
        clock.advance_ms(100);
        sim.poll();

        let seen = seen.lock().unwrap();
        let neutral_coherence = seen[0].coherence;
        let focus = &seen[1];
        assert!((neutral_coherence - (0.5 + (1.0_f64 * 0.004).sin() * 0.1)).abs() < 1e-12);
        assert!((focus.coherence - (0.6 + (2.0_f64 * 0.007).sin() * 0.15)).abs() < 1e-12);

        let t = 2.0 * 0.01;
        let gains = BandGains::for_state(TargetState::Focus);
        assert!((focus.sample.beta - (t * 4.0_f64).sin() * 0.6 * gains.beta).abs() < 1e-12);
    }

    #[test]
    fn test_set_state_named() {
        let (mut sim, _) = manual_simulator();
        assert_eq!(sim.set_state_named("flow-state"), Ok(TargetState::FlowState));
        assert!(sim.set_state_named("euphoria").is_err());
        assert_eq!(sim.state(), TargetState::FlowState);
    }

    #[test]
    fn test_set_parameters_partial_and_atomic() {
        let (mut sim, _) = manual_simulator();
        sim.set_parameters(ParameterUpdate::noise_level(0.3)).unwrap();
        assert!((sim.config().noise_level - 0.3).abs() < f64::EPSILON);
        assert!((sim.config().amplitude_scale - 1.0).abs() < f64::EPSILON);

        let bad = ParameterUpdate { noise_level: Some(0.0), amplitude_scale: Some(-1.0) };
        assert!(sim.set_parameters(bad).is_err());
        assert!((sim.config().noise_level - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timestamps_come_from_timer_clock() {
        let (mut sim, clock) = manual_simulator();
        sim.start(100).unwrap();
        clock.advance_ms(100);
        sim.poll();
        let metrics = sim.last_metrics().copied().unwrap();
        assert_eq!(metrics.sample.timestamp_ms, 1_700_000_000_100);
    }

    #[test]
    fn test_seeded_simulators_match() {
        let run = || {
            let (mut sim, clock) = manual_simulator();
            let (_, seen) = collector(&mut sim);
            sim.set_state(TargetState::DeepMeditation);
            sim.start(100).unwrap();
            clock.advance_ms(1_000);
            sim.poll();
            let out = seen.lock().unwrap().clone();
            out
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_emitted_metrics_bounded_under_heavy_noise() {
        let (timer, clock) = ManualTimer::new(0);
        let mut sim = SimulatorBuilder::new()
            .timer(timer)
            .noise_level(25.0)
            .amplitude_scale(40.0)
            .seed(9)
            .build()
            .unwrap();
        let (_, seen) = collector(&mut sim);

        for state in TargetState::ALL {
            sim.set_state(state);
            sim.start(1).unwrap();
            clock.advance_ms(400);
            sim.poll();
            sim.stop();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2_000);
        for m in seen.iter() {
            assert!((0.0..=1.0).contains(&m.coherence));
            for score in [m.focus_score, m.calm_score, m.meditation_depth, m.energetic_signature] {
                assert!((0.0..=100.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        assert!(SimulatorBuilder::new().amplitude_scale(0.0).build().is_err());
        assert!(SimulatorBuilder::new().noise_level(-1.0).build().is_err());
        assert!(SimulatorBuilder::new().tick_interval_ms(0).build().is_err());
    }

    #[test]
    fn test_start_default_uses_config_interval() {
        let (timer, _) = ManualTimer::new(0);
        let mut sim = SimulatorBuilder::new()
            .timer(timer)
            .tick_interval_ms(250)
            .build()
            .unwrap();
        sim.start_default().unwrap();
        assert_eq!(sim.interval(), Some(Duration::from_millis(250)));
    }
}
