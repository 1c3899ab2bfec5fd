//! In-memory backend for tests
//!
//! Records every call the orchestration makes and plays back pads and
//! messages the way the framework would.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::backend::{Backend, EntryPad, Graph, MessageSource};
use super::link::{LinkOutcome, LinkResolver, PadDiscovered};
use super::stage::StageSpec;
use super::types::{GraphState, Message};

/// Input pad that accepts a single peer
#[derive(Default)]
pub(crate) struct MockPad {
    peer: Mutex<Option<String>>,
    attempts: AtomicUsize,
    refuse: bool,
}

impl MockPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked_to(peer: &str) -> Self {
        Self {
            peer: Mutex::new(Some(peer.to_string())),
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn peer(&self) -> Option<String> {
        self.peer.lock().unwrap().clone()
    }

    pub fn link_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EntryPad for MockPad {
    type Peer = String;

    fn is_linked(&self) -> bool {
        self.peer.lock().unwrap().is_some()
    }

    fn link_from(&self, peer: &String) -> Result<(), String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err("incompatible caps".to_string());
        }
        let mut current = self.peer.lock().unwrap();
        if current.is_some() {
            return Err("pad was already linked".to_string());
        }
        *current = Some(peer.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct MockStage {
    pub name: String,
    pub sink: Arc<MockPad>,
}

/// Everything the orchestration did to the backend
#[derive(Default)]
pub(crate) struct Recorder {
    pub added: Mutex<Vec<String>>,
    pub links: Mutex<Vec<(String, String)>>,
    pub dynamic: Mutex<Vec<(String, String)>>,
    pub states: Mutex<Vec<GraphState>>,
    pub outcomes: Mutex<Vec<LinkOutcome>>,
    pub released: AtomicUsize,
}

impl Recorder {
    pub fn teardowns(&self) -> usize {
        self.states
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == GraphState::Null)
            .count()
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn activated(&self) -> bool {
        self.states.lock().unwrap().contains(&GraphState::Playing)
    }
}

/// Backend with scripted failures, pads and messages
#[derive(Default)]
pub(crate) struct MockBackend {
    pub recorder: Arc<Recorder>,
    pub fail_graph: bool,
    pub fail_stages: HashSet<String>,
    pub fail_links: HashSet<(String, String)>,
    pub fail_state: bool,
    /// Stages the graph refuses to take
    pub fail_add: HashSet<String>,
    /// Graph exposes no message channel
    pub no_bus: bool,
    /// Pads the source announces once the graph is set to playing
    pub pads: Vec<PadDiscovered>,
    pub queue: Arc<Mutex<VecDeque<Message>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pad(mut self, name: &str, media_type: Option<&str>) -> Self {
        self.pads.push(PadDiscovered {
            stage: "source".to_string(),
            pad: name.to_string(),
            media_type: media_type.map(str::to_string),
        });
        self
    }

    pub fn with_messages(self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.queue.lock().unwrap().extend(messages);
        self
    }

    pub fn failing_stage(mut self, name: &str) -> Self {
        self.fail_stages.insert(name.to_string());
        self
    }

    pub fn failing_add(mut self, name: &str) -> Self {
        self.fail_add.insert(name.to_string());
        self
    }

    pub fn without_bus(mut self) -> Self {
        self.no_bus = true;
        self
    }

    pub fn failing_link(mut self, upstream: &str, downstream: &str) -> Self {
        self.fail_links
            .insert((upstream.to_string(), downstream.to_string()));
        self
    }

    pub fn remaining_messages(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl Backend for MockBackend {
    type Stage = MockStage;
    type Graph = MockGraph;

    fn new_graph(&self, name: &str) -> Option<MockGraph> {
        if self.fail_graph {
            return None;
        }
        Some(MockGraph {
            name: name.to_string(),
            recorder: self.recorder.clone(),
            fail_links: self.fail_links.clone(),
            fail_state: self.fail_state,
            fail_add: self.fail_add.clone(),
            no_bus: self.no_bus,
            pads: self.pads.clone(),
            dynamic: Mutex::new(None),
            queue: self.queue.clone(),
        })
    }

    fn make_stage(&self, spec: &StageSpec) -> Option<MockStage> {
        if self.fail_stages.contains(&spec.name) {
            return None;
        }
        Some(MockStage {
            name: spec.name.clone(),
            sink: Arc::new(MockPad::new()),
        })
    }
}

pub(crate) struct MockGraph {
    name: String,
    recorder: Arc<Recorder>,
    fail_links: HashSet<(String, String)>,
    fail_state: bool,
    fail_add: HashSet<String>,
    no_bus: bool,
    pads: Vec<PadDiscovered>,
    dynamic: Mutex<Option<(MockStage, Arc<LinkResolver>)>>,
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl Graph for MockGraph {
    type Stage = MockStage;
    type Messages = MockMessages;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn add(&self, stage: &MockStage) -> Result<(), String> {
        if self.fail_add.contains(&stage.name) {
            return Err("element already has a parent".to_string());
        }
        self.recorder.added.lock().unwrap().push(stage.name.clone());
        Ok(())
    }

    fn link(&self, upstream: &MockStage, downstream: &MockStage) -> Result<(), String> {
        let pair = (upstream.name.clone(), downstream.name.clone());
        if self.fail_links.contains(&pair) {
            return Err("no common caps".to_string());
        }
        downstream.sink.link_from(&upstream.name)?;
        self.recorder.links.lock().unwrap().push(pair);
        Ok(())
    }

    fn connect_dynamic(
        &self,
        source: &MockStage,
        entry: &MockStage,
        resolver: Arc<LinkResolver>,
    ) -> Result<(), String> {
        self.recorder
            .dynamic
            .lock()
            .unwrap()
            .push((source.name.clone(), entry.name.clone()));
        *self.dynamic.lock().unwrap() = Some((entry.clone(), resolver));
        Ok(())
    }

    fn set_state(&self, state: GraphState) -> Result<(), String> {
        self.recorder.states.lock().unwrap().push(state);
        if state == GraphState::Playing {
            if self.fail_state {
                return Err("state change failed".to_string());
            }
            if let Some((entry, resolver)) = self.dynamic.lock().unwrap().as_ref() {
                for pad in &self.pads {
                    let outcome = resolver.resolve(pad, &pad.pad, Some(entry.sink.as_ref()));
                    self.recorder.outcomes.lock().unwrap().push(outcome);
                }
            }
        }
        Ok(())
    }

    fn messages(&self) -> Option<MockMessages> {
        if self.no_bus {
            return None;
        }
        Some(MockMessages {
            queue: self.queue.clone(),
        })
    }
}

impl Drop for MockGraph {
    fn drop(&mut self) {
        self.recorder.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct MockMessages {
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl MockMessages {
    pub fn new(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(messages.into_iter().collect())),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl MessageSource for MockMessages {
    fn pop(&mut self, timeout: Duration) -> Option<Message> {
        let message = self.queue.lock().unwrap().pop_front();
        if message.is_none() {
            std::thread::sleep(timeout);
        }
        message
    }
}
