//! # stagehand-scene
//!
//! The scene engine: a registry of visual objects, a layout engine for
//! grids and rows, a timeline sequencer that commits batches of
//! simultaneous transitions, and an updater that keeps derived objects
//! (connecting lines, following labels) attached to their anchors.
//!
//! Rendering is out of scope; frames are handed to a [`FrameSink`].

pub mod anchor;
pub mod description;
pub mod layout;
pub mod object;
pub mod path;
pub mod registry;
pub mod render;
pub mod sequencer;
pub mod stage;
pub mod timeline;
pub mod validate;

pub use anchor::{Derivation, Endpoint, RecomputeFn, ReferenceUpdater};
pub use description::SceneDescription;
pub use layout::{GridLayout, GridSpec, LayoutEngine, PopulatedGrid};
pub use object::{AnchorPoint, Geometry, Mutation, Style, VisualObject};
pub use path::MotionPath;
pub use registry::SceneObjectRegistry;
pub use render::{Flow, FrameSink, NullSink, SceneSnapshot, SnapshotRecorder};
pub use sequencer::{AbortHandle, RunReport, SequencerState, TransitionSequencer};
pub use stage::Stage;
pub use timeline::{Action, Timeline, Transition, TransitionStep};
pub use validate::validate_timeline;
