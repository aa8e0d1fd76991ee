use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stagehand_core::{Direction, Handle, Point3, StageError, StageResult};

use crate::object::{AnchorPoint, Mutation, VisualObject};
use crate::registry::SceneObjectRegistry;

/// Re-derives a dependent object from its anchors.
///
/// Anchors are passed in the order given to [`ReferenceUpdater::attach`].
pub type RecomputeFn = Box<dyn Fn(&[&VisualObject], &mut VisualObject) -> StageResult<()>>;

struct Attachment {
    derived: Handle,
    anchors: Vec<Handle>,
    recompute: RecomputeFn,
}

/// Keeps derived objects (connecting lines, following labels) consistent
/// with the objects they hang off.
///
/// Attachments form a DAG: an attach that would close a cycle is rejected.
/// Recomputation runs in registration order, except that a derived object
/// always runs after any derived object it is anchored to.
#[derive(Default)]
pub struct ReferenceUpdater {
    attachments: Vec<Attachment>,
    /// Indices into `attachments`, in recompute order.
    order: Vec<usize>,
}

impl std::fmt::Debug for ReferenceUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceUpdater")
            .field(
                "attachments",
                &self
                    .attachments
                    .iter()
                    .map(|a| (a.derived, a.anchors.clone()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ReferenceUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn is_attached(&self, derived: Handle) -> bool {
        self.attachments.iter().any(|a| a.derived == derived)
    }

    /// Derived objects anchored directly on `anchor`, in registration order.
    pub fn dependents_of(&self, anchor: Handle) -> Vec<Handle> {
        self.attachments
            .iter()
            .filter(|a| a.anchors.contains(&anchor))
            .map(|a| a.derived)
            .collect()
    }

    /// Anchors of `derived`, if it is attached.
    pub fn anchors_of(&self, derived: Handle) -> Option<&[Handle]> {
        self.attachments
            .iter()
            .find(|a| a.derived == derived)
            .map(|a| a.anchors.as_slice())
    }

    /// Register `derived` as depending on `anchors`, then recompute it once.
    ///
    /// On any error neither the registry nor the updater is changed.
    pub fn attach(
        &mut self,
        registry: &mut SceneObjectRegistry,
        derived: Handle,
        anchors: &[Handle],
        recompute: RecomputeFn,
    ) -> StageResult<()> {
        registry.get(derived)?;
        for &anchor in anchors {
            registry.get(anchor)?;
        }
        // Cycles take precedence over the duplicate check: a self-anchor is
        // always reported as a cycle.
        for &anchor in anchors {
            if self.depends_on(anchor, derived) {
                warn!(%derived, %anchor, "rejected cyclic attachment");
                return Err(StageError::CyclicAttachment { derived, anchor });
            }
        }
        if self.is_attached(derived) {
            return Err(StageError::InvalidArgument(format!(
                "{} is already attached; detach it first",
                derived
            )));
        }

        let attachment = Attachment {
            derived,
            anchors: anchors.to_vec(),
            recompute,
        };
        Self::apply(&attachment, registry)?;
        self.attachments.push(attachment);
        self.rebuild_order();
        debug!(%derived, anchors = anchors.len(), "attached derived object");
        Ok(())
    }

    /// Attach using one of the built-in derivations.
    pub fn attach_derivation(
        &mut self,
        registry: &mut SceneObjectRegistry,
        derived: Handle,
        derivation: Derivation,
    ) -> StageResult<()> {
        let anchors = derivation.anchors();
        self.attach(registry, derived, &anchors, derivation.into_recompute())
    }

    /// Drop the attachment of `derived`. Returns whether one existed.
    pub fn detach(&mut self, derived: Handle) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.derived != derived);
        let removed = self.attachments.len() != before;
        if removed {
            self.rebuild_order();
            debug!(%derived, "detached derived object");
        }
        removed
    }

    /// Recompute every derived object against the registry's current state.
    pub fn recompute_all(&self, registry: &mut SceneObjectRegistry) -> StageResult<()> {
        for &index in &self.order {
            Self::apply(&self.attachments[index], registry)?;
        }
        Ok(())
    }

    fn apply(attachment: &Attachment, registry: &mut SceneObjectRegistry) -> StageResult<()> {
        let anchors = attachment
            .anchors
            .iter()
            .map(|&h| registry.get(h).cloned())
            .collect::<StageResult<Vec<_>>>()?;
        let anchor_refs: Vec<&VisualObject> = anchors.iter().collect();

        let mut updated = registry.get(attachment.derived)?.clone();
        (attachment.recompute)(&anchor_refs, &mut updated)?;
        updated.handle = attachment.derived;
        *registry.get_mut(attachment.derived)? = updated;
        Ok(())
    }

    /// Whether `node` is `target` or transitively anchored on it.
    fn depends_on(&self, node: Handle, target: Handle) -> bool {
        let mut stack = vec![node];
        let mut visited = Vec::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            if let Some(anchors) = self.anchors_of(current) {
                stack.extend_from_slice(anchors);
            }
        }
        false
    }

    /// Stable topological order: lowest registration index first among the
    /// attachments whose derived anchors are already placed.
    fn rebuild_order(&mut self) {
        let count = self.attachments.len();
        let mut placed = vec![false; count];
        self.order.clear();
        while self.order.len() < count {
            let next = (0..count).find(|&i| {
                !placed[i]
                    && self.attachments[i].anchors.iter().all(|anchor| {
                        self.attachments
                            .iter()
                            .enumerate()
                            .all(|(j, other)| other.derived != *anchor || placed[j])
                    })
            });
            // The graph is acyclic, so some attachment is always ready.
            let Some(i) = next else { break };
            placed[i] = true;
            self.order.push(i);
        }
    }
}

/// One end of a derived line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Fixed(Point3),
    Object {
        handle: Handle,
        #[serde(default)]
        at: AnchorPoint,
    },
}

impl Endpoint {
    pub fn center_of(handle: Handle) -> Self {
        Endpoint::Object {
            handle,
            at: AnchorPoint::Center,
        }
    }

    pub fn edge_of(handle: Handle, direction: Direction) -> Self {
        Endpoint::Object {
            handle,
            at: AnchorPoint::Edge(direction),
        }
    }

    fn anchor(&self) -> Option<Handle> {
        match self {
            Endpoint::Fixed(_) => None,
            Endpoint::Object { handle, .. } => Some(*handle),
        }
    }

    fn resolve(&self, anchors: &[&VisualObject]) -> StageResult<Point3> {
        match self {
            Endpoint::Fixed(p) => Ok(*p),
            Endpoint::Object { handle, at } => anchors
                .iter()
                .find(|o| o.handle == *handle)
                .map(|o| o.anchor_point(*at))
                .ok_or(StageError::UnknownHandle(*handle)),
        }
    }
}

/// Built-in ways of deriving one object from others.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// A line whose endpoints stick to two anchors (or fixed points).
    LineBetween { from: Endpoint, to: Endpoint },
    /// Keep the object centered on an anchor, plus an offset.
    FollowCenter {
        anchor: Handle,
        #[serde(default)]
        offset: Point3,
    },
    /// Keep the object just outside one edge of an anchor.
    NextTo {
        anchor: Handle,
        direction: Direction,
        #[serde(default)]
        buff: f64,
    },
}

impl Derivation {
    pub fn anchors(&self) -> Vec<Handle> {
        match self {
            Derivation::LineBetween { from, to } => {
                let mut anchors: Vec<Handle> = from.anchor().into_iter().collect();
                if let Some(h) = to.anchor() {
                    if !anchors.contains(&h) {
                        anchors.push(h);
                    }
                }
                anchors
            }
            Derivation::FollowCenter { anchor, .. } | Derivation::NextTo { anchor, .. } => {
                vec![*anchor]
            }
        }
    }

    pub fn into_recompute(self) -> RecomputeFn {
        match self {
            Derivation::LineBetween { from, to } => Box::new(move |anchors: &[&VisualObject], derived: &mut VisualObject| {
                let start = from.resolve(anchors)?;
                let end = to.resolve(anchors)?;
                derived.apply(Mutation::SetEndpoints { start, end })
            }),
            Derivation::FollowCenter { anchor, offset } => Box::new(move |anchors: &[&VisualObject], derived: &mut VisualObject| {
                let target = anchors
                    .iter()
                    .find(|o| o.handle == anchor)
                    .ok_or(StageError::UnknownHandle(anchor))?;
                derived.apply(Mutation::MoveTo(target.center() + offset))
            }),
            Derivation::NextTo {
                anchor,
                direction,
                buff,
            } => Box::new(move |anchors: &[&VisualObject], derived: &mut VisualObject| {
                let target = anchors
                    .iter()
                    .find(|o| o.handle == anchor)
                    .ok_or(StageError::UnknownHandle(anchor))?;
                let (hw, hh) = derived.half_extents();
                let own = match direction {
                    Direction::Up | Direction::Down => hh,
                    Direction::Left | Direction::Right => hw,
                };
                let position = target.edge(direction).next_to(direction, buff + own);
                derived.apply(Mutation::MoveTo(position))
            }),
        }
    }
}
