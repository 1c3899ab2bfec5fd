//! One complete run: build, observe, tear down

use log::{info, warn};

use super::backend::Backend;
use super::builder;
use super::event_loop::{EventLoop, LoopOutcome};
use super::health::HealthSummary;
use super::stage::GraphSpec;
use crate::error::BuildError;

/// Result of a run that reached the running state
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: LoopOutcome,
    pub health: HealthSummary,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// Build the graph, drive the event loop and tear the graph down
///
/// Teardown runs once on every path, including when building fails.
pub fn run<B: Backend>(
    backend: &B,
    spec: &GraphSpec,
    event_loop: &mut EventLoop,
) -> Result<RunReport, BuildError> {
    let mut graph = builder::build(backend, spec, event_loop.health())?;

    let Some(mut messages) = graph.messages() else {
        return Err(BuildError::MessageChannel(spec.name.clone()));
    };
    let outcome = event_loop.run(&mut messages);
    drop(messages);

    graph.teardown();

    let health = event_loop.health();
    info!("{}", health.summary());
    for alert in health.alerts() {
        warn!("{}", alert);
    }

    Ok(RunReport {
        outcome,
        health: health.summary(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::pipeline::mock::MockBackend;
    use crate::pipeline::stage::{StageKind, StageSpec};
    use crate::pipeline::types::{GraphState, Message, Origin};

    fn spec() -> GraphSpec {
        GraphSpec::new("data-pipeline")
            .stage(StageSpec::new("source", StageKind::Decode, "uridecodebin"))
            .stage(StageSpec::new("video_convert", StageKind::Convert, "videoconvert"))
            .stage(StageSpec::new("video_sink", StageKind::Sink, "autovideosink"))
            .chain(&["video_convert", "video_sink"])
            .dynamic("source", "video_convert", "video/x-raw")
    }

    fn event_loop() -> EventLoop {
        EventLoop::new(Duration::from_millis(1), CancellationToken::new())
    }

    fn playing() -> Message {
        Message::StateChanged {
            origin: Origin::Graph("data-pipeline".into()),
            old: GraphState::Paused,
            new: GraphState::Playing,
            pending: GraphState::VoidPending,
        }
    }

    fn eos() -> Message {
        Message::EndOfStream {
            origin: Origin::Graph("data-pipeline".into()),
        }
    }

    #[test]
    fn test_video_stream_plays_to_end() {
        let backend = MockBackend::new()
            .with_pad("src_0", Some("video/x-raw"))
            .with_messages([playing(), eos()]);
        let mut event_loop = event_loop();

        let report = run(&backend, &spec(), &mut event_loop).unwrap();

        assert_eq!(report.outcome, LoopOutcome::EndOfStream);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.health.pads_linked, 1);
        assert_eq!(event_loop.graph_state(), GraphState::Playing);
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.recorder.released(), 1);
    }

    #[test]
    fn test_stage_failure_never_activates() {
        let backend = MockBackend::new()
            .failing_stage("video_sink")
            .with_messages([eos()]);
        let mut event_loop = event_loop();

        let err = run(&backend, &spec(), &mut event_loop).unwrap_err();

        assert!(matches!(err, BuildError::StageConstruction { .. }));
        assert!(!backend.recorder.activated());
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.remaining_messages(), 1);
    }

    #[test]
    fn test_audio_only_source_stalls_until_cancelled() {
        let backend = MockBackend::new().with_pad("src_0", Some("audio/x-raw"));
        let cancel = CancellationToken::new();
        let mut event_loop = EventLoop::new(Duration::from_millis(1), cancel.clone());

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        });
        let report = run(&backend, &spec(), &mut event_loop).unwrap();
        canceller.join().unwrap();

        assert_eq!(report.outcome, LoopOutcome::Cancelled);
        assert_eq!(report.health.pads_linked, 0);
        assert_eq!(report.health.pads_ignored, 1);
        assert!(backend.recorder.links.lock().unwrap().iter().all(|(up, _)| up != "source"));
        assert_eq!(backend.recorder.teardowns(), 1);
    }

    #[test]
    fn test_runtime_error_shuts_down_cleanly() {
        let backend = MockBackend::new()
            .with_pad("src_0", Some("video/x-raw"))
            .with_messages([
                playing(),
                Message::Error {
                    origin: Origin::Stage("encoder".into()),
                    reason: "Internal data stream error.".into(),
                    debug: None,
                },
                eos(),
            ]);
        let mut event_loop = event_loop();

        let report = run(&backend, &spec(), &mut event_loop).unwrap();

        assert!(matches!(
            report.outcome,
            LoopOutcome::Error { ref origin, .. } if origin == "encoder"
        ));
        assert_eq!(report.exit_code(), 0);
        assert_eq!(backend.remaining_messages(), 1);
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.recorder.released(), 1);
    }

    #[test]
    fn test_static_link_failure_tears_down_once() {
        let backend = MockBackend::new().failing_link("video_convert", "video_sink");
        let mut event_loop = event_loop();

        let err = run(&backend, &spec(), &mut event_loop).unwrap_err();

        assert!(matches!(err, BuildError::StaticLink { .. }));
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.recorder.released(), 1);
    }

    #[test]
    fn test_missing_message_channel_tears_down_once() {
        let backend = MockBackend::new()
            .with_pad("src_0", Some("video/x-raw"))
            .without_bus();
        let mut event_loop = event_loop();

        let err = run(&backend, &spec(), &mut event_loop).unwrap_err();

        assert!(matches!(err, BuildError::MessageChannel(ref name) if name == "data-pipeline"));
        assert!(backend.recorder.activated());
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.recorder.released(), 1);
    }

    #[test]
    fn test_add_failure_tears_down_once() {
        let backend = MockBackend::new().failing_add("video_sink");
        let mut event_loop = event_loop();

        let err = run(&backend, &spec(), &mut event_loop).unwrap_err();

        assert!(matches!(err, BuildError::Add { ref stage, .. } if stage == "video_sink"));
        assert!(!backend.recorder.activated());
        assert!(backend.recorder.links.lock().unwrap().is_empty());
        assert_eq!(backend.recorder.teardowns(), 1);
        assert_eq!(backend.recorder.released(), 1);
    }
}
