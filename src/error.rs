//! Errors raised while assembling and activating a graph

use thiserror::Error;

use crate::pipeline::GraphState;

#[derive(Debug, Error)]
pub enum BuildError {
    /// `diagnostic` has one digit per slot, graph first then stages in
    /// declaration order; `1` marks a slot that failed to construct.
    #[error("not all elements could be created: {} ({diagnostic})", .failed.join(", "))]
    StageConstruction {
        failed: Vec<String>,
        diagnostic: String,
    },

    #[error("stage '{0}' is declared more than once")]
    DuplicateStage(String),

    #[error("stage '{0}' is not declared")]
    UnknownStage(String),

    #[error("stage '{stage}' could not be added to the graph: {reason}")]
    Add { stage: String, reason: String },

    #[error("elements '{upstream}' and '{downstream}' could not be linked")]
    StaticLink {
        upstream: String,
        downstream: String,
    },

    #[error("pad-added handler could not be installed on '{source_stage}': {reason}")]
    DynamicLink {
        source_stage: String,
        reason: String,
    },

    #[error("unable to set the graph to the {target} state: {reason}")]
    StateChange { target: GraphState, reason: String },

    #[error("graph '{0}' exposes no message channel")]
    MessageChannel(String),
}
