//! Graph construction
//!
//! Turns a [`GraphSpec`] into a running graph: create every stage, add them
//! to a fresh graph, establish the static links, hook the dynamic link on
//! the source and request the playing state. Any failure tears the partial
//! graph down before returning.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use super::backend::{Backend, Graph};
use super::health::RunHealth;
use super::link::LinkResolver;
use super::stage::GraphSpec;
use super::state::Lifecycle;
use super::types::GraphState;
use crate::error::BuildError;

/// Owns a graph from creation to teardown
///
/// Teardown (request the null state, then release the graph) runs exactly
/// once: either through [`ActiveGraph::teardown`] or when the guard drops.
pub struct ActiveGraph<G: Graph> {
    graph: Option<G>,
    stages: Vec<G::Stage>,
    resolver: Option<Arc<LinkResolver>>,
    lifecycle: Lifecycle,
}

impl<G: Graph> ActiveGraph<G> {
    fn new(graph: G) -> Self {
        Self {
            graph: Some(graph),
            stages: Vec::new(),
            resolver: None,
            lifecycle: Lifecycle::Created,
        }
    }

    pub fn graph(&self) -> Option<&G> {
        self.graph.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn stages(&self) -> &[G::Stage] {
        &self.stages
    }

    /// Resolver handling the source's runtime pads, if the graph has one
    pub fn resolver(&self) -> Option<&Arc<LinkResolver>> {
        self.resolver.as_ref()
    }

    /// Hand out the message channel and enter the draining phase
    pub fn messages(&mut self) -> Option<G::Messages> {
        let messages = self.graph.as_ref()?.messages()?;
        self.advance(Lifecycle::Draining);
        Some(messages)
    }

    /// Deactivate and release the graph
    pub fn teardown(mut self) {
        self.release();
    }

    fn advance(&mut self, next: Lifecycle) {
        if !self.lifecycle.can_transition_to(&next) {
            warn!("Ignoring lifecycle transition {} -> {}", self.lifecycle, next);
            return;
        }
        debug!("Graph lifecycle {} -> {}", self.lifecycle, next);
        self.lifecycle = next;
    }

    fn release(&mut self) {
        if self.lifecycle.is_torn_down() {
            return;
        }
        let Some(graph) = self.graph.take() else {
            return;
        };

        if let Err(e) = graph.set_state(GraphState::Null) {
            error!("Failed to deactivate graph '{}': {}", graph.name(), e);
        }
        self.stages.clear();
        self.resolver = None;
        self.advance(Lifecycle::TornDown);
        info!("Graph '{}' released", graph.name());
    }
}

impl<G: Graph> Drop for ActiveGraph<G> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Build and activate the graph described by `spec`
///
/// Returns once the playing state has been requested; the framework
/// confirms it later with a state-changed message.
pub fn build<B: Backend>(
    backend: &B,
    spec: &GraphSpec,
    health: Arc<RunHealth>,
) -> Result<ActiveGraph<B::Graph>, BuildError> {
    spec.validate()?;

    let graph = backend.new_graph(&spec.name);
    let stages: Vec<Option<B::Stage>> = spec
        .stages
        .iter()
        .map(|stage| backend.make_stage(stage))
        .collect();

    let graph = match graph {
        Some(graph) if stages.iter().all(Option::is_some) => graph,
        graph => {
            let err = construction_error(spec, graph.is_none(), &stages);
            // a partially constructed graph is torn down with its guard
            drop(graph.map(ActiveGraph::new));
            return Err(err);
        }
    };
    let mut active = ActiveGraph::new(graph);
    active.stages = stages.into_iter().flatten().collect();

    populate(&mut active, spec, health)?;
    active.advance(Lifecycle::Populated);

    if let Some(graph) = active.graph() {
        graph
            .set_state(GraphState::Playing)
            .map_err(|reason| BuildError::StateChange {
                target: GraphState::Playing,
                reason,
            })?;
    }
    active.advance(Lifecycle::Active {
        activated_at: Instant::now(),
    });

    info!(
        "Graph '{}' started: {} stages, {} static links",
        spec.name,
        spec.stages.len(),
        spec.links.len()
    );
    Ok(active)
}

fn construction_error<S>(spec: &GraphSpec, graph_failed: bool, stages: &[Option<S>]) -> BuildError {
    let slots: Vec<(bool, &String)> = std::iter::once((graph_failed, &spec.name))
        .chain(
            stages
                .iter()
                .zip(&spec.stages)
                .map(|(stage, declared)| (stage.is_none(), &declared.name)),
        )
        .collect();

    let diagnostic = slots
        .iter()
        .map(|(failed, _)| if *failed { '1' } else { '0' })
        .collect();
    let failed = slots
        .iter()
        .filter(|(failed, _)| *failed)
        .map(|(_, name)| (*name).clone())
        .collect();

    BuildError::StageConstruction { failed, diagnostic }
}

fn populate<G: Graph>(
    active: &mut ActiveGraph<G>,
    spec: &GraphSpec,
    health: Arc<RunHealth>,
) -> Result<(), BuildError> {
    let Some(graph) = active.graph.as_ref() else {
        return Ok(());
    };
    let stages = &active.stages;
    let stage = |name: &str| {
        spec.position(name)
            .and_then(|i| stages.get(i))
            .ok_or_else(|| BuildError::UnknownStage(name.to_string()))
    };

    for (handle, declared) in stages.iter().zip(&spec.stages) {
        graph.add(handle).map_err(|reason| BuildError::Add {
            stage: declared.name.clone(),
            reason,
        })?;
    }

    for (upstream, downstream) in &spec.links {
        graph
            .link(stage(upstream)?, stage(downstream)?)
            .map_err(|reason| {
                debug!("Link {} -> {} refused: {}", upstream, downstream, reason);
                BuildError::StaticLink {
                    upstream: upstream.clone(),
                    downstream: downstream.clone(),
                }
            })?;
    }

    if let Some(dynamic) = &spec.dynamic {
        let resolver = Arc::new(LinkResolver::new(dynamic.media_prefix.clone(), health));
        graph
            .connect_dynamic(
                stage(&dynamic.source)?,
                stage(&dynamic.entry)?,
                resolver.clone(),
            )
            .map_err(|reason| BuildError::DynamicLink {
                source_stage: dynamic.source.clone(),
                reason,
            })?;
        active.resolver = Some(resolver);
    }

    Ok(())
}
