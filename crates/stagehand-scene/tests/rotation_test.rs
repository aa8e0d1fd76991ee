use stagehand_core::{Color, Direction, Duration, Handle, PlaybackConfig, Point3, StageError, StageResult};
use stagehand_scene::{
    Action, Derivation, Endpoint, Flow, Geometry, MotionPath, Mutation, NullSink, SceneSnapshot,
    SnapshotRecorder, Stage, Style, Timeline, Transition, TransitionSequencer, TransitionStep,
};

const EPS: f64 = 1e-9;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Two tree nodes, an edge from the parent's center to the child's top and
/// a key label on each node.
struct Tree {
    stage: Stage,
    parent: Handle,
    child: Handle,
    parent_key: Handle,
    child_key: Handle,
    edge: Handle,
}

fn node(stage: &mut Stage, at: Point3) -> Handle {
    stage
        .add_styled(
            Geometry::Circle { radius: 0.5 },
            at,
            Style::stroke(Color::BLUE, 4.0).filled(Color::BLACK, 1.0),
        )
        .expect("node should be created")
}

fn key(stage: &mut Stage, text: &str, on: Handle) -> Handle {
    let label = stage
        .add(Geometry::label(text, 0.5), Point3::ORIGIN)
        .expect("label should be created");
    stage
        .derive(
            label,
            Derivation::FollowCenter {
                anchor: on,
                offset: Point3::ORIGIN,
            },
        )
        .expect("label should attach");
    label
}

fn build_tree() -> Tree {
    let mut stage = Stage::default();
    let parent = node(&mut stage, Point3::xy(0.0, 2.0));
    let child = node(&mut stage, Point3::xy(-2.0, 0.0));
    let edge = stage
        .add(Geometry::line(Point3::ORIGIN, Point3::xy(1.0, 0.0)), Point3::ORIGIN)
        .expect("edge should be created");
    stage
        .derive(
            edge,
            Derivation::LineBetween {
                from: Endpoint::center_of(parent),
                to: Endpoint::edge_of(child, Direction::Up),
            },
        )
        .expect("edge should attach");
    let parent_key = key(&mut stage, "8", parent);
    let child_key = key(&mut stage, "4", child);
    Tree {
        stage,
        parent,
        child,
        parent_key,
        child_key,
        edge,
    }
}

fn close(a: Point3, b: Point3) -> bool {
    a.distance(&b) < EPS
}

/// Every derived object agrees with its anchors in `snapshot`.
fn assert_attached(tree: &Tree, snapshot: &SceneSnapshot) {
    let get = |h: Handle| snapshot.object(h).expect("object should be in snapshot");
    let parent = get(tree.parent);
    let child = get(tree.child);
    assert!(close(get(tree.parent_key).center(), parent.center()));
    assert!(close(get(tree.child_key).center(), child.center()));
    let (start, end) = get(tree.edge).endpoints().expect("edge is a line");
    assert!(close(start, parent.center()));
    assert!(close(end, child.edge(Direction::Up)));
}

#[test]
fn test_rotation_keeps_derived_objects_attached_in_every_frame() {
    init_tracing();
    let mut tree = build_tree();
    let arc = MotionPath::smooth(vec![
        Point3::xy(0.0, 2.0),
        Point3::xy(1.5, 1.6),
        Point3::xy(2.0, 0.0),
    ])
    .expect("path should be valid");
    let timeline = Timeline::new().then(
        TransitionStep::new(Duration::from_seconds(1.0))
            .labelled("rotate right")
            .with(Action::new(tree.parent, Transition::MoveAlong(arc)))
            .with(Action::new(tree.child, Transition::MoveTo(Point3::xy(0.0, 2.0)))),
    );

    let mut config = PlaybackConfig::default();
    config.emit_intermediate_frames = true;
    let mut recorder = SnapshotRecorder::new();
    let report = TransitionSequencer::new(&config)
        .run(&timeline, &mut tree.stage, &mut recorder)
        .expect("run should succeed");

    assert_eq!(report.frames_emitted, 30);
    assert_eq!(recorder.frames.len(), 30);
    for frame in &recorder.frames {
        assert_attached(&tree, frame);
    }
    assert_eq!(
        tree.stage.get(tree.parent).unwrap().position,
        Point3::xy(2.0, 0.0)
    );
    assert_eq!(
        tree.stage.get(tree.child).unwrap().position,
        Point3::xy(0.0, 2.0)
    );
}

#[test]
fn test_reanchoring_between_runs() {
    let mut tree = build_tree();
    let swap = Timeline::new().then(
        TransitionStep::new(Duration::from_seconds(1.0))
            .with(Action::new(tree.parent, Transition::MoveTo(Point3::xy(2.0, 0.0))))
            .with(Action::new(tree.child, Transition::MoveTo(Point3::xy(0.0, 2.0)))),
    );
    let mut sequencer = TransitionSequencer::default();
    sequencer
        .run(&swap, &mut tree.stage, &mut NullSink)
        .expect("swap should run");

    // The child is now the parent: flip the edge.
    assert!(tree.stage.detach(tree.edge));
    tree.stage
        .derive(
            tree.edge,
            Derivation::LineBetween {
                from: Endpoint::center_of(tree.child),
                to: Endpoint::edge_of(tree.parent, Direction::Up),
            },
        )
        .expect("edge should re-attach");
    assert_eq!(
        tree.stage.get(tree.edge).unwrap().endpoints(),
        Some((Point3::xy(0.0, 2.0), Point3::xy(2.0, 0.5)))
    );

    let nudge = Timeline::new().then(
        TransitionStep::new(Duration::from_seconds(0.5))
            .with(Action::new(tree.child, Transition::Shift(Point3::xy(-1.0, 0.0)))),
    );
    sequencer.reset();
    sequencer
        .run(&nudge, &mut tree.stage, &mut NullSink)
        .expect("nudge should run");
    let (start, end) = tree.stage.get(tree.edge).unwrap().endpoints().unwrap();
    assert_eq!(start, Point3::xy(-1.0, 2.0));
    assert_eq!(end, Point3::xy(2.0, 0.5));
}

#[test]
fn test_fade_and_relabel_steps() {
    let mut tree = build_tree();
    tree.stage
        .mutate(tree.child_key, Mutation::SetOpacity(0.0))
        .expect("opacity should apply");
    let timeline = Timeline::new()
        .then(
            TransitionStep::new(Duration::from_seconds(0.5))
                .with(Action::new(tree.child_key, Transition::FadeIn))
                .with(Action::new(tree.parent_key, Transition::SetText("P".into()))),
        )
        .then(TransitionStep::wait(Duration::from_seconds(0.3)))
        .then(
            TransitionStep::new(Duration::from_seconds(0.5))
                .with(Action::new(tree.edge, Transition::FadeOut)),
        );

    let mut recorder = SnapshotRecorder::new();
    let report = TransitionSequencer::default()
        .run(&timeline, &mut tree.stage, &mut recorder)
        .expect("run should succeed");

    assert_eq!(report.steps_completed, 3);
    assert_eq!(recorder.settled().count(), 3);
    assert!((report.final_time.as_seconds() - 1.3).abs() < EPS);
    assert_eq!(tree.stage.get(tree.child_key).unwrap().style.opacity, 1.0);
    assert_eq!(tree.stage.get(tree.parent_key).unwrap().text(), Some("P"));
    assert_eq!(tree.stage.get(tree.edge).unwrap().style.opacity, 0.0);
}

#[test]
fn test_cycle_is_rejected_and_state_unchanged() {
    let mut tree = build_tree();
    let before = tree.stage.snapshot();
    let attachments = tree.stage.updater().len();

    // parent_key follows parent, so parent following parent_key closes a loop.
    let err = tree
        .stage
        .derive(
            tree.parent,
            Derivation::FollowCenter {
                anchor: tree.parent_key,
                offset: Point3::xy(0.0, 1.0),
            },
        )
        .unwrap_err();
    assert!(matches!(err, StageError::CyclicAttachment { .. }));

    let err = tree
        .stage
        .derive(
            tree.parent_key,
            Derivation::FollowCenter {
                anchor: tree.parent_key,
                offset: Point3::ORIGIN,
            },
        )
        .unwrap_err();
    // Already attached, but a self-anchor is reported as a cycle.
    assert!(matches!(err, StageError::CyclicAttachment { .. }));

    let err = tree
        .stage
        .derive(
            tree.child,
            Derivation::FollowCenter {
                anchor: tree.child,
                offset: Point3::ORIGIN,
            },
        )
        .unwrap_err();
    assert!(matches!(err, StageError::CyclicAttachment { .. }));
    assert_eq!(tree.stage.snapshot(), before);
    assert_eq!(tree.stage.updater().len(), attachments);
}

#[test]
fn test_unknown_handle_mutation_leaves_others_intact() {
    let mut tree = build_tree();
    let before = tree.stage.snapshot();
    let err = tree
        .stage
        .mutate(Handle::new(999), Mutation::MoveTo(Point3::xy(1.0, 1.0)))
        .unwrap_err();
    assert!(matches!(err, StageError::UnknownHandle(_)));
    assert_eq!(tree.stage.snapshot(), before);
}

#[test]
fn test_sink_error_propagates() {
    let mut tree = build_tree();
    let timeline = Timeline::new().then(
        TransitionStep::new(Duration::from_seconds(1.0))
            .with(Action::new(tree.parent, Transition::Shift(Point3::xy(1.0, 0.0)))),
    );
    let mut failing = |_: &SceneSnapshot| -> StageResult<Flow> {
        Err(StageError::InvalidState("encoder closed".into()))
    };
    let mut sequencer = TransitionSequencer::default();
    let err = sequencer
        .run(&timeline, &mut tree.stage, &mut failing)
        .unwrap_err();
    assert!(matches!(err, StageError::InvalidState(_)));
    // The step committed before the frame was presented.
    assert_eq!(
        tree.stage.get(tree.parent).unwrap().position,
        Point3::xy(1.0, 2.0)
    );
}
