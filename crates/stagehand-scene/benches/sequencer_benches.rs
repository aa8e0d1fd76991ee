use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stagehand_core::{Direction, Duration, PlaybackConfig, Point3};
use stagehand_scene::{
    Action, Derivation, Endpoint, Geometry, LayoutEngine, NullSink, Stage, Timeline, Transition,
    TransitionSequencer, TransitionStep,
};

/// A row of cells, each with an arrow to the next, shuffled over ten steps.
fn create_chain(cells: usize) -> (Stage, Timeline) {
    let mut stage = Stage::default();
    let positions = stage
        .layout()
        .row(cells, Point3::ORIGIN, 1.5)
        .expect("row should lay out");
    let handles: Vec<_> = positions
        .iter()
        .map(|&p| stage.add(Geometry::square(1.0), p).expect("cell"))
        .collect();
    for pair in handles.windows(2) {
        let arrow = stage
            .add(Geometry::line(Point3::ORIGIN, Point3::xy(1.0, 0.0)), Point3::ORIGIN)
            .expect("arrow");
        stage
            .derive(
                arrow,
                Derivation::LineBetween {
                    from: Endpoint::edge_of(pair[0], Direction::Right),
                    to: Endpoint::edge_of(pair[1], Direction::Left),
                },
            )
            .expect("attach");
    }

    let mut timeline = Timeline::new();
    for step in 0..10 {
        let dy = if step % 2 == 0 { 1.0 } else { -1.0 };
        let mut batch = TransitionStep::new(Duration::from_seconds(0.5));
        for (i, &h) in handles.iter().enumerate() {
            let delta = if i % 2 == 0 { dy } else { -dy };
            batch = batch.with(Action::new(h, Transition::Shift(Point3::xy(0.0, delta))));
        }
        timeline.push(batch);
    }
    (stage, timeline)
}

fn bench_settled_run(c: &mut Criterion) {
    c.bench_function("sequencer_settled_64_cells", |b| {
        b.iter_batched(
            || create_chain(64),
            |(mut stage, timeline)| {
                let report = TransitionSequencer::default()
                    .run(&timeline, &mut stage, &mut NullSink)
                    .expect("run");
                black_box(report)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_tweened_run(c: &mut Criterion) {
    let mut playback = PlaybackConfig::default();
    playback.emit_intermediate_frames = true;
    c.bench_function("sequencer_tweened_16_cells", |b| {
        b.iter_batched(
            || create_chain(16),
            |(mut stage, timeline)| {
                let report = TransitionSequencer::new(&playback)
                    .run(&timeline, &mut stage, &mut NullSink)
                    .expect("run");
                black_box(report)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_grid_layout(c: &mut Criterion) {
    let engine = LayoutEngine::default();
    c.bench_function("layout_grid_8x14", |b| {
        b.iter(|| black_box(engine.grid(black_box(8), black_box(14), 14.0, 8.0)))
    });
}

criterion_group!(benches, bench_settled_run, bench_tweened_run, bench_grid_layout);
criterion_main!(benches);
