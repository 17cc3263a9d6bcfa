//! Heartbeat monitor
//!
//! One periodic timer per concept, with sweeps run off the socket workers.
//! Each tick takes a snapshot of the registry, so no registry lock is held
//! while closing, then closes every connection whose last ping/pong is
//! older than the timeout. Survivors are pinged so that live clients answer
//! with a pong before the next tick.
//!
//! Closing races safely with in-flight sends: sending on a closed connection
//! is a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::concept::LoadBalanceConcept;
use crate::connection::GOING_AWAY;
use crate::message::Message;
use crate::utils::error::SendError;

pub const HEARTBEAT_TIMEOUT_REASON: &str = "heartbeat timeout";

/// Counts observed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub alive: usize,
    pub closed: usize,
}

#[derive(Debug)]
pub struct HeartbeatMonitor {
    concept: Arc<LoadBalanceConcept>,
    period: Duration,
    timeout: Duration,
    logger_enabled: bool,
    ping_enabled: bool,
}

impl HeartbeatMonitor {
    pub fn new(concept: Arc<LoadBalanceConcept>, period: Duration, timeout: Duration) -> Self {
        Self {
            concept,
            period,
            timeout,
            logger_enabled: true,
            ping_enabled: true,
        }
    }

    /// Toggles the per-tick summary log line.
    pub fn with_logger(mut self, enabled: bool) -> Self {
        self.logger_enabled = enabled;
        self
    }

    /// Toggles pinging the connections that survive a sweep.
    pub fn with_ping(mut self, enabled: bool) -> Self {
        self.ping_enabled = enabled;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sweep(&self) -> SweepSummary {
        self.sweep_at(chrono::Utc::now().timestamp_millis())
    }

    /// One sweep against an explicit clock, in milliseconds since the epoch.
    pub fn sweep_at(&self, now: i64) -> SweepSummary {
        let timeout = i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX);
        let snapshot = self.concept.registry().snapshot();
        let mut summary = SweepSummary {
            total: snapshot.len(),
            ..SweepSummary::default()
        };

        for connection in snapshot {
            let id = connection.id().to_string();

            if !connection.is_alive() {
                if self.concept.close(&id, "connection closed") {
                    summary.closed += 1;
                }
                continue;
            }

            if now.saturating_sub(connection.last_heartbeat()) > timeout {
                debug!("Connection {} missed its heartbeat", id);
                if self
                    .concept
                    .close_with_code(&id, GOING_AWAY, HEARTBEAT_TIMEOUT_REASON)
                {
                    summary.closed += 1;
                }
                continue;
            }

            if self.ping_enabled {
                if let Err(SendError::Transport(cause)) = connection.send(&Message::ping(Vec::new())) {
                    self.concept.on_error(&id, cause);
                    summary.closed += 1;
                    continue;
                }
            }
            summary.alive += 1;
        }

        if self.logger_enabled {
            info!(
                "Heartbeat on {}: total {}, alive {}, closed {}",
                self.concept.identity().instance_id(),
                summary.total,
                summary.alive,
                summary.closed
            );
        }
        summary
    }

    /// Runs the sweep every `period`.
    ///
    /// The timer lives on its own task and each sweep runs on the blocking
    /// pool, so listener callbacks and close I/O never occupy the workers
    /// driving the sockets. A sweep finishes before the next tick starts.
    pub fn spawn(self) -> JoinHandle<()> {
        let monitor = Arc::new(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let sweeper = monitor.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || sweeper.sweep()).await {
                    warn!("Heartbeat sweep aborted: {e}");
                }
            }
        })
    }
}
