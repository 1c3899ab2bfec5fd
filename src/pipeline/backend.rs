//! Seam between the orchestration logic and the media framework
//!
//! The builder, resolver and event loop only talk to these traits. The
//! GStreamer implementation lives in `crate::gist`; tests use an in-memory
//! backend.

use std::sync::Arc;
use std::time::Duration;

use super::link::LinkResolver;
use super::stage::StageSpec;
use super::types::{GraphState, Message};

/// Factory for graphs and stages
pub trait Backend {
    type Stage: Clone;
    type Graph: Graph<Stage = Self::Stage>;

    /// Create an empty graph, `None` if the framework refuses
    fn new_graph(&self, name: &str) -> Option<Self::Graph>;

    /// Instantiate and configure one stage, `None` if the factory is missing
    fn make_stage(&self, spec: &StageSpec) -> Option<Self::Stage>;
}

/// A graph of stages owned by the framework
pub trait Graph {
    type Stage;
    type Messages: MessageSource;

    fn name(&self) -> String;

    fn add(&self, stage: &Self::Stage) -> Result<(), String>;

    /// Link `upstream`'s output to `downstream`'s input
    fn link(&self, upstream: &Self::Stage, downstream: &Self::Stage) -> Result<(), String>;

    /// Route every pad `source` announces at runtime through `resolver`
    /// towards `entry`'s input pad
    fn connect_dynamic(
        &self,
        source: &Self::Stage,
        entry: &Self::Stage,
        resolver: Arc<LinkResolver>,
    ) -> Result<(), String>;

    /// Request a state change; returns once the request is accepted
    fn set_state(&self, state: GraphState) -> Result<(), String>;

    /// Observation channel of the graph
    fn messages(&self) -> Option<Self::Messages>;
}

/// The graph's message channel
pub trait MessageSource {
    /// Wait at most `timeout` for the next message
    fn pop(&mut self, timeout: Duration) -> Option<Message>;
}

/// Input pad of the stage fed by dynamic links
pub trait EntryPad {
    /// Output pad type that can be linked into this pad
    type Peer;

    fn is_linked(&self) -> bool;

    fn link_from(&self, peer: &Self::Peer) -> Result<(), String>;
}
