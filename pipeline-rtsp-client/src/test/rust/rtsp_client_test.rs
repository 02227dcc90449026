use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pipeline_rtsp_client::{
    DeferredLink, DomainError, EdgeState, GStreamerEngine, LinkOutcome, MediaEngine, MediaType,
    MetricsReporter, NodeGraph, NodeRole, NodeSpec, OutputDescription, PipelineBuilder,
    PipelineConfig, PipelineState, PlatformClass, Result, RunOutcome, StreamPipeline,
};

/// Everything the fake engine observed, shared with the test body
#[derive(Default)]
struct Journal {
    created: Vec<NodeSpec>,
    links: Vec<(usize, usize)>,
    deferred: Vec<(usize, usize, DeferredLink)>,
    states: Vec<PipelineState>,
    releases: usize,
    fail_kind: Option<String>,
    fail_state: Option<PipelineState>,
    end_of_stream: bool,
}

struct FakeEngine {
    journal: Arc<Mutex<Journal>>,
}

impl FakeEngine {
    fn new() -> (Self, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        (
            Self {
                journal: journal.clone(),
            },
            journal,
        )
    }
}

impl MediaEngine for FakeEngine {
    type Element = usize;

    fn create_element(&mut self, spec: &NodeSpec) -> Option<usize> {
        let mut journal = self.journal.lock().unwrap();
        if journal.fail_kind.as_deref() == Some(spec.kind()) {
            return None;
        }
        journal.created.push(spec.clone());
        Some(journal.created.len() - 1)
    }

    fn link(&mut self, upstream: &usize, downstream: &usize) -> bool {
        self.journal.lock().unwrap().links.push((*upstream, *downstream));
        true
    }

    fn link_deferred(&mut self, upstream: &usize, downstream: &usize, link: DeferredLink) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .deferred
            .push((*upstream, *downstream, link));
        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) -> Result<()> {
        let mut journal = self.journal.lock().unwrap();
        journal.states.push(state);
        if journal.fail_state == Some(state) {
            return Err(DomainError::StateTransition {
                target: state,
                reason: "refused by fake engine".to_string(),
            });
        }
        Ok(())
    }

    fn run(&mut self, running: Arc<AtomicBool>) -> Result<RunOutcome> {
        loop {
            if self.journal.lock().unwrap().end_of_stream {
                return Ok(RunOutcome::EndOfStream);
            }
            if !running.load(Ordering::SeqCst) {
                return Ok(RunOutcome::Stopped);
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn release(&mut self) {
        self.journal.lock().unwrap().releases += 1;
    }
}

#[derive(Default)]
struct RecordingMetrics {
    states: Mutex<Vec<PipelineState>>,
    outcomes: Mutex<Vec<LinkOutcome>>,
}

impl MetricsReporter for RecordingMetrics {
    fn report_state_change(&self, state: &PipelineState) {
        self.states.lock().unwrap().push(*state);
    }

    fn report_link_outcome(&self, outcome: &LinkOutcome) {
        self.outcomes.lock().unwrap().push(*outcome);
    }

    fn report_uptime(&self, _uptime_secs: f64) {}
}

fn config(platform: PlatformClass, display: bool) -> PipelineConfig {
    PipelineConfig::new(
        "rtsp://localhost:8554/cam1".to_string(),
        "h264".to_string(),
        display,
        platform,
    )
    .unwrap()
}

fn build(platform: PlatformClass, display: bool) -> (StreamPipeline<FakeEngine>, Arc<Mutex<Journal>>) {
    let (engine, journal) = FakeEngine::new();
    let pipeline =
        StreamPipeline::build(config(platform, display), engine, Arc::new(RecordingMetrics::default()))
            .unwrap();
    (pipeline, journal)
}

fn rtp_video(port: &str) -> OutputDescription {
    OutputDescription::new(port.to_string(), "application/x-rtp").with_media("video")
}

#[test]
fn test_gstreamer_init() {
    assert!(gstreamer::init().is_ok());
}

#[test]
fn test_build_creates_every_planned_node() {
    let cases = [
        (PlatformClass::EmbeddedArm, true, 8),
        (PlatformClass::EmbeddedArm, false, 7),
        (PlatformClass::DesktopX86, true, 5),
        (PlatformClass::DesktopX86, false, 5),
    ];

    for (platform, display, expected) in cases {
        let (pipeline, journal) = build(platform, display);
        let journal = journal.lock().unwrap();

        assert_eq!(journal.created.len(), expected, "{} display={}", platform, display);
        assert_eq!(pipeline.graph().len(), expected);
        assert_eq!(journal.created[0].kind(), "rtspsrc");
        assert_eq!(journal.created[expected - 1].role(), NodeRole::Sink);
    }
}

#[test]
fn test_embedded_with_display_end_to_end() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, true);
    let journal = journal.lock().unwrap();

    let names: Vec<&str> = journal.created.iter().map(|n| n.name()).collect();
    assert_eq!(
        names,
        [
            "rtspsrc_0",
            "depayer_0",
            "parser_0",
            "nvv4l2decoder_0",
            "nvidia_convertor",
            "filter",
            "nvegl-transform",
            "nvvideo-renderer"
        ]
    );
    assert_eq!(journal.deferred.len(), 1);
    assert_eq!((journal.deferred[0].0, journal.deferred[0].1), (0, 1));
    assert_eq!(journal.links, [(1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7)]);
    assert_eq!(pipeline.graph().deferred_edges().count(), 1);
}

#[test]
fn test_unknown_platform_creates_nothing() {
    let (engine, journal) = FakeEngine::new();
    let result = StreamPipeline::build(
        config(PlatformClass::Unknown, true),
        engine,
        Arc::new(RecordingMetrics::default()),
    );

    assert!(matches!(result, Err(DomainError::UnsupportedPlatform)));
    assert!(journal.lock().unwrap().created.is_empty());
}

#[test]
fn test_node_creation_failure_names_role_and_releases() {
    let cases = [
        (PlatformClass::EmbeddedArm, "rtspsrc", NodeRole::Source),
        (PlatformClass::EmbeddedArm, "rtph264depay", NodeRole::Depayer),
        (PlatformClass::EmbeddedArm, "h264parse", NodeRole::Parser),
        (PlatformClass::EmbeddedArm, "nvv4l2decoder", NodeRole::Decoder),
        (PlatformClass::EmbeddedArm, "capsfilter", NodeRole::CapsFilter),
        (PlatformClass::EmbeddedArm, "nvegltransform", NodeRole::Transform),
        (PlatformClass::DesktopX86, "rtspsrc", NodeRole::Source),
        (PlatformClass::DesktopX86, "decodebin", NodeRole::Decoder),
        (PlatformClass::DesktopX86, "nvvideoconvert", NodeRole::ColorConverter),
        (PlatformClass::DesktopX86, "capsfilter", NodeRole::CapsFilter),
        (PlatformClass::DesktopX86, "nveglglessink", NodeRole::Sink),
    ];

    for (platform, failing_kind, failing_role) in cases {
        let (engine, journal) = FakeEngine::new();
        journal.lock().unwrap().fail_kind = Some(failing_kind.to_string());

        let result = StreamPipeline::build(
            config(platform, true),
            engine,
            Arc::new(RecordingMetrics::default()),
        );

        match result {
            Err(DomainError::NodeCreation { role, kind }) => {
                assert_eq!(role, failing_role);
                assert_eq!(kind, failing_kind);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("build should fail when {} is missing", failing_kind),
        }

        let journal = journal.lock().unwrap();
        assert_eq!(journal.releases, 1);
        assert!(journal.links.is_empty());
        assert!(journal.states.is_empty());
    }
}

#[test]
fn test_static_edges_linked_deferred_pending() {
    let (pipeline, _journal) = build(PlatformClass::DesktopX86, true);
    let graph = pipeline.graph();

    assert!(graph.static_edges().all(|e| e.state() == EdgeState::Linked));
    assert!(graph.deferred_edges().all(|e| e.state() == EdgeState::Unlinked));
    assert!(!graph.is_fully_linked());
}

#[test]
fn test_deferred_link_is_idempotent() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, false);
    let link = journal.lock().unwrap().deferred[0].2.clone();
    let mut attempts = 0;

    let first = link.on_output_discovered(&rtp_video("recv_rtp_src_0_1_96"), || {
        attempts += 1;
        true
    });
    let second = link.on_output_discovered(&rtp_video("recv_rtp_src_0_1_96"), || {
        attempts += 1;
        true
    });

    assert_eq!(first, LinkOutcome::Linked);
    assert_eq!(second, LinkOutcome::AlreadyLinked);
    assert_eq!(attempts, 1);
    assert!(pipeline.graph().is_fully_linked());
}

#[test]
fn test_mismatched_output_leaves_edge_unlinked() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, false);
    let (source_link, decoder_link) = {
        let journal = journal.lock().unwrap();
        (journal.deferred[0].2.clone(), journal.deferred[1].2.clone())
    };

    let audio = OutputDescription::new("recv_rtp_src_0_1_97".to_string(), "application/x-rtp")
        .with_media("audio");
    let outcome = source_link.on_output_discovered(&audio, || panic!("must not link audio"));
    assert_eq!(outcome, LinkOutcome::Ignored);

    let encoded = OutputDescription::new("src_0".to_string(), "video/x-h264");
    let outcome = decoder_link.on_output_discovered(&encoded, || panic!("must not link encoded video"));
    assert_eq!(outcome, LinkOutcome::Ignored);

    assert!(pipeline
        .graph()
        .deferred_edges()
        .all(|e| e.state() == EdgeState::Unlinked));

    let raw = OutputDescription::new("src_0".to_string(), "video/x-raw");
    assert_eq!(decoder_link.on_output_discovered(&raw, || true), LinkOutcome::Linked);
}

#[test]
fn test_failed_link_keeps_edge_open() {
    let (_pipeline, journal) = build(PlatformClass::EmbeddedArm, true);
    let link = journal.lock().unwrap().deferred[0].2.clone();

    assert_eq!(link.on_output_discovered(&rtp_video("p0"), || false), LinkOutcome::Failed);
    assert_eq!(link.state(), EdgeState::Unlinked);
    assert_eq!(link.on_output_discovered(&rtp_video("p1"), || true), LinkOutcome::Linked);
}

#[test]
fn test_start_walks_startup_sequence() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, true);

    pipeline.start().unwrap();

    assert_eq!(
        journal.lock().unwrap().states,
        [PipelineState::Ready, PipelineState::Paused, PipelineState::Playing]
    );
    assert_eq!(pipeline.current_state(), PipelineState::Playing);
    assert!(pipeline.uptime().is_some());
}

#[test]
fn test_state_failure_tears_down() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, true);
    journal.lock().unwrap().fail_state = Some(PipelineState::Paused);

    let result = pipeline.start();

    assert!(matches!(
        result,
        Err(DomainError::StateTransition {
            target: PipelineState::Paused,
            ..
        })
    ));
    assert!(pipeline.is_released());
    assert!(pipeline
        .graph()
        .edges()
        .iter()
        .all(|e| e.state() == EdgeState::Released));

    let journal = journal.lock().unwrap();
    assert_eq!(journal.states.last(), Some(&PipelineState::Null));
    assert_eq!(journal.releases, 1);
}

#[test]
fn test_run_requires_start() {
    let (pipeline, _journal) = build(PlatformClass::DesktopX86, false);
    assert!(matches!(
        pipeline.run(),
        Err(DomainError::StateTransition { .. })
    ));
}

#[test]
fn test_run_until_end_of_stream() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, false);
    pipeline.start().unwrap();
    journal.lock().unwrap().end_of_stream = true;

    assert_eq!(pipeline.run().unwrap(), RunOutcome::EndOfStream);
}

#[test]
fn test_request_stop_before_start_is_honored() {
    let (pipeline, _journal) = build(PlatformClass::DesktopX86, false);

    pipeline.request_stop();
    pipeline.start().unwrap();

    assert_eq!(pipeline.run().unwrap(), RunOutcome::Stopped);
}

#[test]
fn test_shutdown_unblocks_run() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, false);
    let pipeline = Arc::new(pipeline);
    pipeline.start().unwrap();

    let runner = {
        let pipeline = pipeline.clone();
        thread::spawn(move || pipeline.run())
    };
    thread::sleep(Duration::from_millis(20));

    assert!(pipeline.shutdown());
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Stopped);
    assert_eq!(journal.lock().unwrap().releases, 1);
}

#[test]
fn test_concurrent_shutdown_runs_once() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, true);
    let pipeline = Arc::new(pipeline);
    pipeline.start().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = pipeline.clone();
            thread::spawn(move || pipeline.shutdown())
        })
        .collect();
    let performed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|did| *did)
        .count();

    assert_eq!(performed, 1);
    let journal = journal.lock().unwrap();
    let null_transitions = journal
        .states
        .iter()
        .filter(|s| **s == PipelineState::Null)
        .count();
    assert_eq!(null_transitions, 1);
    assert_eq!(journal.releases, 1);

    let stops = pipeline
        .history()
        .iter()
        .filter(|t| t.to == PipelineState::Null)
        .count();
    assert_eq!(stops, 1);
}

#[test]
fn test_run_to_completion_stopped_before_start() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, true);

    pipeline.shutdown();

    assert_eq!(pipeline.run_to_completion().unwrap(), RunOutcome::Stopped);
    let journal = journal.lock().unwrap();
    assert_eq!(journal.states, [PipelineState::Null]);
    assert_eq!(journal.releases, 1);
}

#[test]
fn test_run_to_completion_interrupted_during_start() {
    let (engine, journal) = FakeEngine::new();
    let pipeline = Arc::new(
        StreamPipeline::build(
            config(PlatformClass::DesktopX86, false),
            engine,
            Arc::new(RecordingMetrics::default()),
        )
        .unwrap(),
    );

    // Hold the engine's journal so start blocks on its first transition
    let guard = journal.lock().unwrap();
    let runner = {
        let pipeline = pipeline.clone();
        thread::spawn(move || pipeline.run_to_completion())
    };
    let stopper = {
        let pipeline = pipeline.clone();
        thread::spawn(move || pipeline.shutdown())
    };
    thread::sleep(Duration::from_millis(20));
    drop(guard);

    assert!(stopper.join().unwrap());
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Stopped);
    assert_eq!(journal.lock().unwrap().releases, 1);
}

#[test]
fn test_run_to_completion_reports_state_failure() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, true);
    journal.lock().unwrap().fail_state = Some(PipelineState::Ready);

    assert!(matches!(
        pipeline.run_to_completion(),
        Err(DomainError::StateTransition {
            target: PipelineState::Ready,
            ..
        })
    ));
}

#[test]
fn test_run_to_completion_end_of_stream() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, false);
    journal.lock().unwrap().end_of_stream = true;

    assert_eq!(pipeline.run_to_completion().unwrap(), RunOutcome::EndOfStream);
    assert!(pipeline.is_released());
}

#[test]
fn test_output_after_shutdown_is_released() {
    let (pipeline, journal) = build(PlatformClass::DesktopX86, true);
    let link = journal.lock().unwrap().deferred[0].2.clone();

    pipeline.shutdown();

    let outcome = link.on_output_discovered(&rtp_video("late"), || panic!("must not touch a released node"));
    assert_eq!(outcome, LinkOutcome::Released);
    assert!(matches!(pipeline.start(), Err(DomainError::PipelineReleased)));
}

#[test]
fn test_drop_shuts_down() {
    let (pipeline, journal) = build(PlatformClass::EmbeddedArm, true);
    pipeline.start().unwrap();

    drop(pipeline);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.states.last(), Some(&PipelineState::Null));
    assert_eq!(journal.releases, 1);
}

#[test]
fn test_launch_string_matches_graph() {
    let (pipeline, _journal) = build(PlatformClass::DesktopX86, false);
    let launch = PipelineBuilder::build_launch_string(pipeline.graph());

    assert!(launch.starts_with("rtspsrc name=rtspsrc_0"));
    assert!(launch.contains("location=rtsp://localhost:8554/cam1"));
    assert!(launch.contains("decodebin name=decode_container_0"));
    assert!(launch.ends_with("fakesink name=fake_sink"));
}

#[test]
fn test_gstreamer_engine_runs_core_elements_to_eos() {
    gstreamer::init().unwrap();
    let mut engine = GStreamerEngine::new("core-elements");

    let source = engine
        .create_element(&NodeSpec::new(NodeRole::Source, "fakesrc", "src").with_property("num-buffers", 5))
        .unwrap();
    let filter = engine
        .create_element(&NodeSpec::new(NodeRole::CapsFilter, "capsfilter", "filter"))
        .unwrap();
    let sink = engine
        .create_element(&NodeSpec::new(NodeRole::Sink, "fakesink", "sink").with_property("sync", false))
        .unwrap();

    assert!(engine.link(&source, &filter));
    assert!(engine.link(&filter, &sink));

    engine.set_state(PipelineState::Playing).unwrap();
    let outcome = engine.run(Arc::new(AtomicBool::new(true))).unwrap();
    assert_eq!(outcome, RunOutcome::EndOfStream);

    engine.release();
    assert!(engine.pipeline().is_none());
}

/// Expose a ghost output on `bin` whose caps are fixed to `media_type`
fn add_ghost_output(bin: &gstreamer::Bin, name: &str, media_type: &str) -> gstreamer::GhostPad {
    use gstreamer::prelude::*;

    let filter = gstreamer::ElementFactory::make("capsfilter")
        .property("caps", gstreamer::Caps::new_empty_simple(media_type))
        .build()
        .unwrap();
    bin.add(&filter).unwrap();

    let target = filter.static_pad("src").unwrap();
    let ghost = gstreamer::GhostPad::builder_with_target(&target)
        .unwrap()
        .name(name)
        .build();
    bin.add_pad(&ghost).unwrap();
    ghost
}

#[test]
fn test_gstreamer_engine_links_dynamic_output() {
    use gstreamer::prelude::*;

    gstreamer::init().unwrap();
    let mut engine = GStreamerEngine::new("dynamic-output");
    let graph = NodeGraph::chain(
        vec![
            NodeSpec::new(NodeRole::Decoder, "bin", "upstream"),
            NodeSpec::new(NodeRole::Sink, "fakesink", "sink"),
        ],
        &[(0, MediaType::RawVideo)],
    );

    let upstream = engine.create_element(&graph.nodes()[0]).unwrap();
    let sink = engine.create_element(&graph.nodes()[1]).unwrap();
    let metrics = Arc::new(RecordingMetrics::default());
    let link = DeferredLink::for_edge(&graph.edges()[0], metrics.clone()).unwrap();
    engine.link_deferred(&upstream, &sink, link).unwrap();

    let bin = upstream.downcast_ref::<gstreamer::Bin>().unwrap();
    let edge = &graph.edges()[0];

    let video = add_ghost_output(bin, "video_src", "video/x-raw");
    assert_eq!(edge.state(), EdgeState::Linked);
    assert!(sink.static_pad("sink").unwrap().is_linked());

    bin.remove_pad(&video).unwrap();
    assert_eq!(edge.state(), EdgeState::Unlinked);

    add_ghost_output(bin, "audio_src", "audio/x-raw");
    assert_eq!(edge.state(), EdgeState::Unlinked);
    assert!(!sink.static_pad("sink").unwrap().is_linked());

    assert_eq!(
        *metrics.outcomes.lock().unwrap(),
        [LinkOutcome::Linked, LinkOutcome::Ignored]
    );
}

#[test]
fn test_gstreamer_engine_missing_vendor_element() {
    gstreamer::init().unwrap();
    if gstreamer::ElementFactory::find("nvvideoconvert").is_some() {
        return;
    }

    let result = StreamPipeline::build(
        config(PlatformClass::DesktopX86, false),
        GStreamerEngine::new("missing-vendor"),
        Arc::new(RecordingMetrics::default()),
    );

    assert!(matches!(result, Err(DomainError::NodeCreation { .. })));
}
