//! The seam to the external renderer.
//!
//! The engine never rasterizes anything itself: at every frame boundary it
//! hands a [`SceneSnapshot`] to a [`FrameSink`], which may draw, encode or
//! simply record it.

use serde::{Deserialize, Serialize};

use stagehand_core::hash::{self, ContentHash};
use stagehand_core::{StageResult, Timestamp};

use crate::object::VisualObject;

/// Whether playback should go on after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop at the next step boundary. The current step still completes.
    Abort,
}

/// Immutable view of every object at one instant of virtual time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub time: Timestamp,
    /// Index of the step that produced this frame.
    pub step: usize,
    /// True for the frame emitted after a step's batch has committed.
    pub settled: bool,
    pub objects: Vec<VisualObject>,
}

impl SceneSnapshot {
    /// SHA-256 over the serialized snapshot, for determinism checks.
    pub fn content_hash(&self) -> StageResult<ContentHash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hash::hash_bytes(&bytes))
    }

    pub fn object(&self, handle: stagehand_core::Handle) -> Option<&VisualObject> {
        self.objects.iter().find(|o| o.handle == handle)
    }
}

/// Receives frames from the sequencer.
pub trait FrameSink {
    fn present(&mut self, snapshot: &SceneSnapshot) -> StageResult<Flow>;
}

impl<F> FrameSink for F
where
    F: FnMut(&SceneSnapshot) -> StageResult<Flow>,
{
    fn present(&mut self, snapshot: &SceneSnapshot) -> StageResult<Flow> {
        self(snapshot)
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _snapshot: &SceneSnapshot) -> StageResult<Flow> {
        Ok(Flow::Continue)
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default, Clone)]
pub struct SnapshotRecorder {
    pub frames: Vec<SceneSnapshot>,
}

impl SnapshotRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settled(&self) -> impl Iterator<Item = &SceneSnapshot> {
        self.frames.iter().filter(|f| f.settled)
    }

    pub fn last(&self) -> Option<&SceneSnapshot> {
        self.frames.last()
    }

    /// Hash of all frames in order.
    pub fn content_hash(&self) -> StageResult<ContentHash> {
        let encoded = self
            .frames
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hash::hash_chunks(encoded.iter().map(Vec::as_slice)))
    }
}

impl FrameSink for SnapshotRecorder {
    fn present(&mut self, snapshot: &SceneSnapshot) -> StageResult<Flow> {
        self.frames.push(snapshot.clone());
        Ok(Flow::Continue)
    }
}
