//! GStreamer backend

use std::sync::Arc;
use std::time::Duration;

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Element, MessageType, MessageView, Pipeline};
use log::{debug, warn};

use crate::pipeline::{
    Backend, CapsSpec, EntryPad, Graph, GraphState, LinkResolver, Message, MessageSource, Origin,
    PadDiscovered, PropertyValue, StageSpec,
};

/// Initialize GStreamer, must run before any graph is built
pub fn init() -> anyhow::Result<()> {
    gst::init()?;
    debug!("GStreamer {} initialized", gst::version_string());
    Ok(())
}

pub struct GstBackend;

impl Backend for GstBackend {
    type Stage = Element;
    type Graph = GstGraph;

    fn new_graph(&self, name: &str) -> Option<GstGraph> {
        Some(GstGraph {
            pipeline: Pipeline::with_name(name),
        })
    }

    fn make_stage(&self, spec: &StageSpec) -> Option<Element> {
        let element = match gst::ElementFactory::make(spec.factory.as_str())
            .name(spec.name.as_str())
            .build()
        {
            Ok(element) => element,
            Err(err) => {
                warn!("Could not create '{}' ({}): {}", spec.name, spec.factory, err);
                return None;
            }
        };

        for (key, value) in &spec.properties {
            let Some(pspec) = element.find_property(key) else {
                warn!("'{}' has no property '{}'", spec.factory, key);
                return None;
            };
            let applied = match value {
                PropertyValue::Str(value) => element
                    .try_set_property_from_str(key, value)
                    .map_err(|err| err.to_string()),
                PropertyValue::Int(value) => element
                    .try_set_property_from_str(key, &value.to_string())
                    .map_err(|err| err.to_string()),
                PropertyValue::Bool(value) => set_typed(&element, &pspec, *value),
                PropertyValue::Caps(caps) => set_typed(&element, &pspec, to_caps(caps)),
            };
            if let Err(err) = applied {
                warn!("Could not set '{}' on '{}': {}", key, spec.name, err);
                return None;
            }
        }

        Some(element)
    }
}

/// Set a typed property, failing instead of panicking when the type does not fit
fn set_typed<V>(element: &Element, pspec: &glib::ParamSpec, value: V) -> Result<(), String>
where
    V: Into<glib::Value> + StaticType,
{
    if !V::static_type().is_a(pspec.value_type()) {
        return Err(format!(
            "expected {}, got {}",
            pspec.value_type(),
            V::static_type()
        ));
    }
    element.set_property(pspec.name(), value);
    Ok(())
}

fn to_caps(spec: &CapsSpec) -> gst::Caps {
    let mut builder = gst::Caps::builder(spec.media_type.as_str());
    for (field, value) in &spec.int_fields {
        builder = builder.field(field.as_str(), *value);
    }
    builder.build()
}

pub struct GstGraph {
    pipeline: Pipeline,
}

impl Graph for GstGraph {
    type Stage = Element;
    type Messages = GstMessages;

    fn name(&self) -> String {
        self.pipeline.name().to_string()
    }

    fn add(&self, stage: &Element) -> Result<(), String> {
        self.pipeline.add(stage).map_err(|err| err.to_string())
    }

    fn link(&self, upstream: &Element, downstream: &Element) -> Result<(), String> {
        upstream.link(downstream).map_err(|err| err.to_string())
    }

    fn connect_dynamic(
        &self,
        source: &Element,
        entry: &Element,
        resolver: Arc<LinkResolver>,
    ) -> Result<(), String> {
        let entry = entry.downgrade();

        source.connect_pad_added(move |src, src_pad| {
            let event = PadDiscovered {
                stage: src.name().to_string(),
                pad: src_pad.name().to_string(),
                media_type: src_pad
                    .current_caps()
                    .and_then(|caps| caps.structure(0).map(|s| s.name().to_string())),
            };

            // looked up on every call, the entry may be gone by now
            let entry_pad = entry.upgrade().and_then(|entry| entry.static_pad("sink"));

            resolver.resolve(&event, src_pad, entry_pad.as_ref());
        });

        Ok(())
    }

    fn set_state(&self, state: GraphState) -> Result<(), String> {
        self.pipeline
            .set_state(to_gst_state(state))
            .map(|_| ())
            .map_err(|err| err.to_string())
    }

    fn messages(&self) -> Option<GstMessages> {
        Some(GstMessages {
            bus: self.pipeline.bus()?,
            graph: self.pipeline.clone().upcast::<gst::Object>(),
        })
    }
}

impl EntryPad for gst::Pad {
    type Peer = gst::Pad;

    fn is_linked(&self) -> bool {
        PadExt::is_linked(self)
    }

    fn link_from(&self, peer: &gst::Pad) -> Result<(), String> {
        peer.link(self).map(|_| ()).map_err(|err| err.to_string())
    }
}

/// Pipeline bus filtered to the messages the event loop reacts to
pub struct GstMessages {
    bus: gst::Bus,
    graph: gst::Object,
}

impl MessageSource for GstMessages {
    fn pop(&mut self, timeout: Duration) -> Option<Message> {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let msg = self.bus.timed_pop_filtered(
            ClockTime::from_mseconds(millis),
            &[MessageType::Error, MessageType::Eos, MessageType::StateChanged],
        )?;

        Some(self.convert(&msg))
    }
}

impl GstMessages {
    fn origin(&self, msg: &gst::Message) -> Origin {
        match msg.src() {
            Some(src) if *src == self.graph => Origin::Graph(src.name().to_string()),
            Some(src) => Origin::Stage(src.name().to_string()),
            None => Origin::Unknown,
        }
    }

    fn convert(&self, msg: &gst::Message) -> Message {
        let origin = self.origin(msg);

        match msg.view() {
            MessageView::Error(err) => Message::Error {
                origin,
                reason: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            },
            MessageView::Eos(..) => Message::EndOfStream { origin },
            MessageView::StateChanged(changed) => Message::StateChanged {
                origin,
                old: from_gst_state(changed.old()),
                new: from_gst_state(changed.current()),
                pending: from_gst_state(changed.pending()),
            },
            _ => Message::Other {
                origin,
                kind: format!("{:?}", msg.type_()),
            },
        }
    }
}

fn to_gst_state(state: GraphState) -> gst::State {
    match state {
        GraphState::VoidPending => gst::State::VoidPending,
        GraphState::Null => gst::State::Null,
        GraphState::Ready => gst::State::Ready,
        GraphState::Paused => gst::State::Paused,
        GraphState::Playing => gst::State::Playing,
    }
}

fn from_gst_state(state: gst::State) -> GraphState {
    match state {
        gst::State::Null => GraphState::Null,
        gst::State::Ready => GraphState::Ready,
        gst::State::Paused => GraphState::Paused,
        gst::State::Playing => GraphState::Playing,
        _ => GraphState::VoidPending,
    }
}
