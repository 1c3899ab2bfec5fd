//! Pipeline orchestration layer
//!
//! The media framework does the actual demuxing, decoding, scaling,
//! encoding and sending. This module only decides what the graph looks like
//! and watches it run:
//! - Declaration: stages, their properties and the static links between them
//! - Construction: creating the graph and activating it, or tearing it down on failure
//! - Dynamic linking: connecting the source's runtime pads to the fixed chain
//! - Observation: draining the graph's message channel until a terminal message
//!
//! # Architecture
//!
//! The framework is reached through the traits in [`backend`]:
//! - `Backend` creates graphs and stages
//! - `Graph` adds, links and activates stages and exposes the message channel
//! - `EntryPad` is the input the dynamic link targets
//! - `MessageSource` is the channel the event loop drains with a bounded wait
//!
//! The resolver runs on framework streaming threads; everything else runs on
//! the caller's thread.

pub mod backend;
pub mod builder;
pub mod event_loop;
pub mod health;
pub mod link;
pub mod session;
pub mod stage;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{Backend, EntryPad, Graph, MessageSource};
pub use builder::{ActiveGraph, build};
pub use event_loop::{DEFAULT_POLL_INTERVAL, EventLoop, LoopOutcome};
pub use health::{HealthAlert, HealthSummary, RunHealth};
pub use link::{LinkOutcome, LinkResolver, LinkState, PadDiscovered};
pub use session::{RunReport, run};
pub use stage::{CapsSpec, DynamicLinkSpec, GraphSpec, PropertyValue, StageKind, StageSpec};
pub use state::Lifecycle;
pub use types::{GraphState, MediaKind, Message, Origin};
