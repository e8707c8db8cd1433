//! Async simulator service.
//!
//! Runs a [`Simulator`] on its own tokio task and exposes it through a
//! cloneable [`SimulatorHandle`]. Commands and ticks are processed one at a
//! time on the task, so once an awaited `stop` returns no further metrics are
//! produced until the next `start`.
//!
//! # Example
//!
//! ```rust,ignore
//! use rootstar_sim_native::{Simulator, SimulatorService};
//!
//! let (handle, task) = SimulatorService::spawn(Simulator::new());
//! let (_id, mut metrics) = handle.subscribe_channel(64).await?;
//! handle.start(100).await?;
//!
//! while let Some(m) = metrics.recv().await {
//!     println!("energetic signature {:.1}", m.energetic_signature);
//! }
//! ```

use std::time::Duration;

use rootstar_sim_core::{BrainMetrics, ParameterUpdate, SimulatorConfig, TargetState};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{DeliveryResult, ServiceError, ServiceResult, SimulatorResult, SubscriberError};
use crate::simulator::{Lifecycle, MetricsCallback, Simulator, SimulatorStats, SubscriptionId};

/// Capacity of the command queue
const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Build a callback that forwards metrics into a bounded channel.
///
/// A full channel reports [`SubscriberError::Backpressure`] and the tick is
/// dropped for this subscriber. A dropped receiver reports
/// [`SubscriberError::Disconnected`].
#[must_use]
pub fn channel_subscriber(capacity: usize) -> (MetricsCallback, mpsc::Receiver<BrainMetrics>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let callback: MetricsCallback = Box::new(move |metrics: &BrainMetrics| {
        tx.try_send(*metrics).map_err(|e| match e {
            TrySendError::Full(_) => SubscriberError::Backpressure,
            TrySendError::Closed(_) => SubscriberError::Disconnected,
        })
    });
    (callback, rx)
}

/// Snapshot of the running service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorStatus {
    /// Lifecycle state
    pub lifecycle: Lifecycle,
    /// Active target state
    pub state: TargetState,
    /// Current configuration
    pub config: SimulatorConfig,
    /// Ticks executed
    pub ticks: u64,
    /// Registered subscribers
    pub subscribers: usize,
    /// Delivery counters
    pub stats: SimulatorStats,
}

impl SimulatorStatus {
    fn capture(simulator: &Simulator) -> Self {
        Self {
            lifecycle: simulator.lifecycle(),
            state: simulator.state(),
            config: *simulator.config(),
            ticks: simulator.tick_count(),
            subscribers: simulator.subscriber_count(),
            stats: simulator.stats(),
        }
    }
}

/// Command sent to the service task
pub enum SimulatorCommand {
    /// Start ticking; `None` uses the configured interval
    Start {
        /// Tick period in milliseconds
        interval_ms: Option<u64>,
        /// Result channel
        reply: oneshot::Sender<SimulatorResult<()>>,
    },
    /// Stop ticking
    Stop {
        /// Acknowledgement channel
        reply: oneshot::Sender<()>,
    },
    /// Change the target state
    SetState {
        /// New state
        state: TargetState,
        /// Acknowledgement channel
        reply: oneshot::Sender<()>,
    },
    /// Update noise level and/or amplitude scale
    SetParameters {
        /// Partial update
        update: ParameterUpdate,
        /// Result channel
        reply: oneshot::Sender<SimulatorResult<()>>,
    },
    /// Register a subscriber
    Subscribe {
        /// Consumer callback
        callback: MetricsCallback,
        /// Assigned id
        reply: oneshot::Sender<SubscriptionId>,
    },
    /// Remove a subscriber
    Unsubscribe {
        /// Subscription to remove
        id: SubscriptionId,
        /// Whether it was registered
        reply: oneshot::Sender<bool>,
    },
    /// Query a status snapshot
    Status {
        /// Snapshot channel
        reply: oneshot::Sender<SimulatorStatus>,
    },
    /// Stop and end the task
    Shutdown,
}

/// Owns the service task
pub struct SimulatorService;

impl SimulatorService {
    /// Spawn the service on the current tokio runtime.
    ///
    /// The join handle resolves to the simulator once the service shuts down,
    /// either through [`SimulatorHandle::shutdown`] or because every handle
    /// was dropped.
    pub fn spawn(simulator: Simulator) -> (SimulatorHandle, JoinHandle<Simulator>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let task = tokio::spawn(Self::run(simulator, command_rx));
        (SimulatorHandle { command_tx }, task)
    }

    async fn run(
        mut simulator: Simulator,
        mut command_rx: mpsc::Receiver<SimulatorCommand>,
    ) -> Simulator {
        info!("Simulator service started");

        loop {
            let next_tick = simulator.until_next_tick();

            tokio::select! {
                biased;

                command = command_rx.recv() => match command {
                    Some(SimulatorCommand::Shutdown) | None => break,
                    Some(command) => Self::handle(&mut simulator, command),
                },

                () = wait_for_tick(next_tick) => {
                    simulator.poll();
                }
            }
        }

        simulator.stop();
        info!(ticks = simulator.tick_count(), "Simulator service stopped");
        simulator
    }

    fn handle(simulator: &mut Simulator, command: SimulatorCommand) {
        match command {
            SimulatorCommand::Start { interval_ms, reply } => {
                let result = match interval_ms {
                    Some(interval_ms) => simulator.start(interval_ms),
                    None => simulator.start_default(),
                };
                let _ = reply.send(result);
            }
            SimulatorCommand::Stop { reply } => {
                simulator.stop();
                let _ = reply.send(());
            }
            SimulatorCommand::SetState { state, reply } => {
                simulator.set_state(state);
                let _ = reply.send(());
            }
            SimulatorCommand::SetParameters { update, reply } => {
                let _ = reply.send(simulator.set_parameters(update));
            }
            SimulatorCommand::Subscribe { callback, reply } => {
                let id = simulator.subscribe_boxed(callback);
                let _ = reply.send(id);
            }
            SimulatorCommand::Unsubscribe { id, reply } => {
                let _ = reply.send(simulator.unsubscribe(id));
            }
            SimulatorCommand::Status { reply } => {
                let _ = reply.send(SimulatorStatus::capture(simulator));
            }
            SimulatorCommand::Shutdown => {}
        }
    }
}

async fn wait_for_tick(next_tick: Option<Duration>) {
    match next_tick {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// Cloneable control handle for a running [`SimulatorService`]
#[derive(Clone, Debug)]
pub struct SimulatorHandle {
    command_tx: mpsc::Sender<SimulatorCommand>,
}

impl SimulatorHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SimulatorCommand,
    ) -> ServiceResult<T> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }

    /// Start ticking every `interval_ms` milliseconds
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero or the service has shut down.
    pub async fn start(&self, interval_ms: u64) -> ServiceResult<()> {
        self.request(|reply| SimulatorCommand::Start { interval_ms: Some(interval_ms), reply })
            .await??;
        Ok(())
    }

    /// Start ticking at the configured interval
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn start_default(&self) -> ServiceResult<()> {
        self.request(|reply| SimulatorCommand::Start { interval_ms: None, reply })
            .await??;
        Ok(())
    }

    /// Stop ticking. No metrics are produced after this resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn stop(&self) -> ServiceResult<()> {
        self.request(|reply| SimulatorCommand::Stop { reply }).await
    }

    /// Change the target state
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn set_state(&self, state: TargetState) -> ServiceResult<()> {
        debug!(%state, "Requesting state change");
        self.request(|reply| SimulatorCommand::SetState { state, reply }).await
    }

    /// Update noise level and/or amplitude scale
    ///
    /// # Errors
    ///
    /// Returns an error if a value is invalid or the service has shut down.
    pub async fn set_parameters(&self, update: ParameterUpdate) -> ServiceResult<()> {
        self.request(|reply| SimulatorCommand::SetParameters { update, reply })
            .await??;
        Ok(())
    }

    /// Register a callback subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn subscribe<F>(&self, callback: F) -> ServiceResult<SubscriptionId>
    where
        F: FnMut(&BrainMetrics) -> DeliveryResult + Send + 'static,
    {
        let callback: MetricsCallback = Box::new(callback);
        self.request(|reply| SimulatorCommand::Subscribe { callback, reply }).await
    }

    /// Register a subscriber that forwards metrics into a bounded channel.
    ///
    /// When the channel is full the tick's metrics are dropped for this
    /// subscriber only. Dropping the receiver removes the subscription on
    /// the next tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn subscribe_channel(
        &self,
        capacity: usize,
    ) -> ServiceResult<(SubscriptionId, mpsc::Receiver<BrainMetrics>)> {
        let (callback, rx) = channel_subscriber(capacity);
        let id = self
            .request(|reply| SimulatorCommand::Subscribe { callback, reply })
            .await?;
        Ok((id, rx))
    }

    /// Remove a subscriber; `false` if it was not registered
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> ServiceResult<bool> {
        self.request(|reply| SimulatorCommand::Unsubscribe { id, reply }).await
    }

    /// Current status snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the service has shut down.
    pub async fn status(&self) -> ServiceResult<SimulatorStatus> {
        self.request(|reply| SimulatorCommand::Status { reply }).await
    }

    /// Stop the simulator and end the service task
    ///
    /// # Errors
    ///
    /// Returns an error if the service has already shut down.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        self.command_tx
            .send(SimulatorCommand::Shutdown)
            .await
            .map_err(|_| ServiceError::Closed)
    }
}
