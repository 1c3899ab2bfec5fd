//! Message loop over a running graph
//!
//! Pulls messages off the graph's channel until an error or end-of-stream
//! arrives, or until the cancellation token fires. Each wait is bounded by
//! `poll_interval` so cancellation is noticed promptly.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use super::backend::MessageSource;
use super::health::RunHealth;
use super::types::{GraphState, Message};

/// Default upper bound for a single wait on the channel
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    EndOfStream,
    /// A stage reported a fatal processing error
    Error {
        origin: String,
        reason: String,
        debug: Option<String>,
    },
    Cancelled,
}

impl LoopOutcome {
    /// Process exit code for this outcome
    ///
    /// Runtime errors are handled shutdowns, not crashes.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoopOutcome::EndOfStream | LoopOutcome::Error { .. } => 0,
            LoopOutcome::Cancelled => 130,
        }
    }
}

pub struct EventLoop {
    poll_interval: Duration,
    cancel: CancellationToken,
    health: Arc<RunHealth>,
    /// Last state the graph itself reported
    graph_state: GraphState,
}

impl EventLoop {
    pub fn new(poll_interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            poll_interval,
            cancel,
            health: Arc::new(RunHealth::new()),
            graph_state: GraphState::Null,
        }
    }

    pub fn health(&self) -> Arc<RunHealth> {
        self.health.clone()
    }

    pub fn graph_state(&self) -> GraphState {
        self.graph_state
    }

    /// Consume messages until a terminal condition
    ///
    /// Nothing is taken off the channel once the loop has terminated.
    pub fn run<M: MessageSource>(&mut self, messages: &mut M) -> LoopOutcome {
        loop {
            if self.cancel.is_cancelled() {
                info!("Cancellation requested, leaving the event loop");
                return LoopOutcome::Cancelled;
            }

            let Some(message) = messages.pop(self.poll_interval) else {
                continue;
            };

            if let Some(outcome) = self.dispatch(message) {
                return outcome;
            }
        }
    }

    /// Handle one message, returning the outcome if it ends the loop
    pub fn dispatch(&mut self, message: Message) -> Option<LoopOutcome> {
        self.health.record_message();
        debug!("Received {} message from {}", message.kind(), message.origin());

        match message {
            Message::Error {
                origin,
                reason,
                debug,
            } => {
                error!("Error received from element {}: {}", origin, reason);
                error!(
                    "Debugging information: {}",
                    debug.as_deref().unwrap_or("none")
                );
                Some(LoopOutcome::Error {
                    origin: origin.name().to_string(),
                    reason,
                    debug,
                })
            }
            Message::EndOfStream { .. } => {
                info!("End-Of-Stream reached.");
                Some(LoopOutcome::EndOfStream)
            }
            Message::StateChanged {
                origin, old, new, ..
            } => {
                if origin.is_graph() {
                    info!("Pipeline state changed from {} to {}", old, new);
                    self.graph_state = new;
                    self.health.record_graph_state_change();
                } else {
                    debug!("{} changed state from {} to {}", origin, old, new);
                }
                None
            }
            Message::Other { origin, kind } => {
                warn!("Unexpected message received: {} from {}", kind, origin);
                self.health.record_unexpected_message();
                None
            }
        }
    }
}
