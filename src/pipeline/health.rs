//! Health counters for a pipeline run

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the pad-added callback and the event loop
///
/// The resolver runs on a framework streaming thread while the event loop
/// runs on the foreground thread, so every field is atomic.
#[derive(Default)]
pub struct RunHealth {
    /// Pads announced by the source stage
    pub pads_discovered: AtomicU64,

    /// Pads linked to the entry stage
    pub pads_linked: AtomicU64,

    /// Pads skipped (wrong type, untyped, entry already linked)
    pub pads_ignored: AtomicU64,

    /// Link attempts the framework refused
    pub link_failures: AtomicU64,

    /// Messages taken off the channel
    pub messages: AtomicU64,

    /// State changes posted by the graph itself
    pub graph_state_changes: AtomicU64,

    /// Messages the loop did not expect
    pub unexpected_messages: AtomicU64,
}

impl RunHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pad_discovered(&self) {
        self.pads_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pad_linked(&self) {
        self.pads_linked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pad_ignored(&self) {
        self.pads_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_failure(&self) {
        self.link_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_graph_state_change(&self) {
        self.graph_state_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unexpected_message(&self) {
        self.unexpected_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pads_discovered(&self) -> u64 {
        self.pads_discovered.load(Ordering::Relaxed)
    }

    pub fn pads_linked(&self) -> u64 {
        self.pads_linked.load(Ordering::Relaxed)
    }

    pub fn pads_ignored(&self) -> u64 {
        self.pads_ignored.load(Ordering::Relaxed)
    }

    pub fn link_failures(&self) -> u64 {
        self.link_failures.load(Ordering::Relaxed)
    }

    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    pub fn graph_state_changes(&self) -> u64 {
        self.graph_state_changes.load(Ordering::Relaxed)
    }

    pub fn unexpected_messages(&self) -> u64 {
        self.unexpected_messages.load(Ordering::Relaxed)
    }

    /// Get a summary of health metrics
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            pads_discovered: self.pads_discovered(),
            pads_linked: self.pads_linked(),
            pads_ignored: self.pads_ignored(),
            link_failures: self.link_failures(),
            messages: self.messages(),
            graph_state_changes: self.graph_state_changes(),
            unexpected_messages: self.unexpected_messages(),
        }
    }

    /// Conditions worth reporting once the run is over
    pub fn alerts(&self) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();

        if self.pads_linked() == 0 {
            alerts.push(HealthAlert::NoStreamLinked {
                discovered: self.pads_discovered(),
            });
        }

        let failures = self.link_failures();
        if failures > 0 {
            alerts.push(HealthAlert::LinkFailures { count: failures });
        }

        let unexpected = self.unexpected_messages();
        if unexpected > 0 {
            alerts.push(HealthAlert::UnexpectedMessages { count: unexpected });
        }

        alerts
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSummary {
    pub pads_discovered: u64,
    pub pads_linked: u64,
    pub pads_ignored: u64,
    pub link_failures: u64,
    pub messages: u64,
    pub graph_state_changes: u64,
    pub unexpected_messages: u64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Health: {} pads ({} linked, {} ignored, {} failed), {} messages ({} graph state changes, {} unexpected)",
            self.pads_discovered,
            self.pads_linked,
            self.pads_ignored,
            self.link_failures,
            self.messages,
            self.graph_state_changes,
            self.unexpected_messages
        )
    }
}

/// Health alert types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthAlert {
    /// No source pad ever reached the entry stage; the graph stalls
    NoStreamLinked { discovered: u64 },

    /// The framework refused one or more dynamic links
    LinkFailures { count: u64 },

    /// Messages slipped past the channel filter
    UnexpectedMessages { count: u64 },
}

impl std::fmt::Display for HealthAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthAlert::NoStreamLinked { discovered } => {
                write!(f, "No stream linked ({} pads discovered)", discovered)
            }
            HealthAlert::LinkFailures { count } => {
                write!(f, "Dynamic link failures: {}", count)
            }
            HealthAlert::UnexpectedMessages { count } => {
                write!(f, "Unexpected messages: {}", count)
            }
        }
    }
}
