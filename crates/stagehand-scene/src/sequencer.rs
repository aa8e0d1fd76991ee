//! Plays a [`Timeline`] against a [`Stage`].
//!
//! Steps run strictly in order on a virtual clock. Every action of a step
//! samples from the state committed when the step began, and the whole
//! batch lands in the registry at once, so a frame sink never observes two
//! actions of one step at different progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use stagehand_core::{Handle, PlaybackConfig, StageError, StageResult, Timestamp};

use crate::anchor::ReferenceUpdater;
use crate::object::{Mutation, VisualObject};
use crate::registry::SceneObjectRegistry;
use crate::render::{FrameSink, Flow, SceneSnapshot};
use crate::stage::Stage;
use crate::timeline::{Timeline, TransitionStep};
use crate::validate::validate_timeline;

/// Lifecycle of a [`TransitionSequencer`]: Idle → Running → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Ready to run.
    Idle,
    Running,
    /// Finished, cancelled or failed; [`TransitionSequencer::reset`] returns to Idle.
    Complete,
}

/// Requests cancellation of a run from any thread.
///
/// Checked at step boundaries only; the step in progress always finishes.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Ask the run to stop before its next step.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an abort has been requested since the last reset.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Summary of one call to [`TransitionSequencer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// The timeline's id, also used in log lines.
    pub run_id: Uuid,
    pub steps_completed: usize,
    pub mutations_applied: usize,
    /// Tween and settled frames handed to the sink.
    pub frames_emitted: u64,
    pub final_time: Timestamp,
    /// Stopped early by an [`AbortHandle`] or by the sink returning [`Flow::Abort`].
    pub cancelled: bool,
}

/// Plays timelines step by step against a virtual clock.
pub struct TransitionSequencer {
    state: SequencerState,
    clock: Timestamp,
    playback: PlaybackConfig,
    abort: AbortHandle,
}

impl Default for TransitionSequencer {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl TransitionSequencer {
    /// Create an idle sequencer using the frame rate and tween settings of
    /// `playback`.
    pub fn new(playback: &PlaybackConfig) -> Self {
        Self {
            state: SequencerState::Idle,
            clock: Timestamp::zero(),
            playback: playback.clone(),
            abort: AbortHandle::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Virtual time reached so far.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// A handle that can cancel this sequencer's runs from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Return to Idle with the clock at zero. Does not touch any stage.
    pub fn reset(&mut self) {
        self.state = SequencerState::Idle;
        self.clock = Timestamp::zero();
        self.abort.clear();
    }

    /// Play every step of `timeline`, presenting frames to `sink`.
    ///
    /// Fails without changing anything if the sequencer is not Idle, the
    /// timeline does not validate against the stage, or any step would be
    /// rejected once the steps before it have settled. Once running, only a
    /// sink error can stop the run part-way.
    pub fn run(
        &mut self,
        timeline: &Timeline,
        stage: &mut Stage,
        sink: &mut dyn FrameSink,
    ) -> StageResult<RunReport> {
        if self.state != SequencerState::Idle {
            return Err(StageError::InvalidState(format!(
                "sequencer is {:?}; reset it before running again",
                self.state
            )));
        }
        if let Err(mut errors) = validate_timeline(timeline, stage.registry()) {
            tracing::warn!("timeline {} rejected with {} problem(s)", timeline.id, errors.len());
            return Err(errors.remove(0));
        }
        if let Err(e) = rehearse(timeline, stage.registry(), stage.updater()) {
            tracing::warn!("timeline {} rejected in rehearsal: {}", timeline.id, e);
            return Err(e);
        }

        tracing::info!(
            "running timeline {} ({} steps, {})",
            timeline.id,
            timeline.len(),
            timeline.total_duration()
        );
        self.state = SequencerState::Running;

        let mut report = RunReport {
            run_id: timeline.id,
            steps_completed: 0,
            mutations_applied: 0,
            frames_emitted: 0,
            final_time: self.clock,
            cancelled: false,
        };
        let outcome = self.play(timeline, stage, sink, &mut report);
        self.state = SequencerState::Complete;
        report.final_time = self.clock;
        outcome?;

        if report.cancelled {
            tracing::warn!(
                "timeline {} cancelled after {} of {} steps",
                timeline.id,
                report.steps_completed,
                timeline.len()
            );
        } else {
            tracing::info!(
                "timeline {} complete: {} mutations, {} frames, ends at {}",
                timeline.id,
                report.mutations_applied,
                report.frames_emitted,
                report.final_time
            );
        }
        Ok(report)
    }

    fn play(
        &mut self,
        timeline: &Timeline,
        stage: &mut Stage,
        sink: &mut dyn FrameSink,
        report: &mut RunReport,
    ) -> StageResult<()> {
        let (registry, updater) = stage.parts_mut();

        for (index, step) in timeline.steps().iter().enumerate() {
            if self.abort.is_aborted() {
                report.cancelled = true;
                break;
            }

            let starts = capture_starts(step, registry)?;
            let frames = if self.playback.emit_intermediate_frames {
                step.duration.frame_count(self.playback.fps)
            } else {
                0
            };

            for frame in 1..frames {
                let raw = frame as f64 / frames as f64;
                let mut scratch = registry.clone();
                let (sampled, _) = sample_step(step, &starts, raw, false)?;
                for (target, object) in sampled {
                    *scratch.get_mut(target)? = object;
                }
                updater.recompute_all(&mut scratch)?;

                let snapshot = SceneSnapshot {
                    time: self.clock + step.duration * raw,
                    step: index,
                    settled: false,
                    objects: scratch.snapshot(),
                };
                report.frames_emitted += 1;
                if sink.present(&snapshot)? == Flow::Abort {
                    self.abort.abort();
                    break;
                }
            }

            report.mutations_applied += commit_step(step, &starts, registry, updater)?;
            self.clock += step.duration;
            report.steps_completed += 1;

            tracing::debug!(
                "step {}{} settled at {}",
                index,
                step.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default(),
                self.clock
            );

            let snapshot = SceneSnapshot {
                time: self.clock,
                step: index,
                settled: true,
                objects: registry.snapshot(),
            };
            report.frames_emitted += 1;
            if sink.present(&snapshot)? == Flow::Abort {
                self.abort.abort();
            }
        }
        Ok(())
    }
}

/// Settle every step on a copy of `registry`, so that a step rejected only
/// after earlier steps moved things (an overflowing shift, say) fails the
/// run before anything is committed.
fn rehearse(
    timeline: &Timeline,
    registry: &SceneObjectRegistry,
    updater: &ReferenceUpdater,
) -> StageResult<()> {
    let mut scratch = registry.clone();
    for step in timeline.steps() {
        let starts = capture_starts(step, &scratch)?;
        commit_step(step, &starts, &mut scratch, updater)?;
    }
    Ok(())
}

/// Land the settled state of `step` and refresh derived objects, all or
/// nothing. Returns the number of mutations applied.
fn commit_step(
    step: &TransitionStep,
    starts: &[(Handle, VisualObject)],
    registry: &mut SceneObjectRegistry,
    updater: &ReferenceUpdater,
) -> StageResult<usize> {
    let (settled, applied) = sample_step(step, starts, 1.0, true)?;
    let mut next = registry.clone();
    for (target, object) in settled {
        *next.get_mut(target)? = object;
    }
    updater.recompute_all(&mut next)?;
    *registry = next;
    Ok(applied)
}

/// Clone each target of `step` as it stands before the step.
fn capture_starts(
    step: &TransitionStep,
    registry: &SceneObjectRegistry,
) -> StageResult<Vec<(Handle, VisualObject)>> {
    step.targets()
        .into_iter()
        .map(|h| registry.get(h).map(|o| (h, o.clone())))
        .collect()
}

/// Every target of `step` at raw progress `raw`, computed off to the side,
/// with the number of mutations that produced them.
///
/// Fails before anything is written if any mutation is rejected.
fn sample_step(
    step: &TransitionStep,
    starts: &[(Handle, VisualObject)],
    raw: f64,
    finished: bool,
) -> StageResult<(Vec<(Handle, VisualObject)>, usize)> {
    let mut updated: Vec<(Handle, VisualObject)> = starts.to_vec();
    let mut applied = 0;
    for action in &step.actions {
        let Some(position) = starts.iter().position(|(h, _)| *h == action.target) else {
            return Err(StageError::UnknownHandle(action.target));
        };
        let progress = if finished && action.easing.ends_at_target() {
            1.0
        } else {
            action.easing.apply(raw)
        };
        let mutations: Vec<Mutation> =
            action.transition.sample(&starts[position].1, progress, finished);
        for mutation in mutations {
            updated[position].1.apply(mutation)?;
            applied += 1;
        }
    }
    Ok((updated, applied))
}
