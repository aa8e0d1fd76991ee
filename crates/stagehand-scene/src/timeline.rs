use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stagehand_core::{Color, Duration, Easing, Handle, Point3};

use crate::object::{Geometry, Mutation, Style, VisualObject};
use crate::path::MotionPath;

/// What a transition does to its target over the course of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    MoveTo(Point3),
    Shift(Point3),
    /// The object's center follows the path from its first to its last point.
    MoveAlong(MotionPath),
    /// Opacity from 0 to 1; the object becomes visible.
    FadeIn,
    FadeOut,
    FadeTo(f64),
    Recolor {
        #[serde(default)]
        stroke: Option<Color>,
        #[serde(default)]
        fill: Option<Color>,
    },
    /// Morph a line into the segment `start`..`end`.
    ReshapeLine { start: Point3, end: Point3 },
    ScaleBy(f64),
    /// Replace a label's text when the step ends.
    SetText(String),
    Show,
    Hide,
    /// Draw the outline progressively; the object becomes visible.
    Create,
    /// Morph into another shape of the same kind, optionally moving and
    /// restyling along the way. A line's position follows its endpoints.
    TransformInto {
        geometry: Geometry,
        #[serde(default)]
        position: Option<Point3>,
        #[serde(default)]
        style: Option<Style>,
    },
}

/// The aspect of an object a transition writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Position,
    Opacity,
    Visibility,
    Color,
    Geometry,
    Text,
    Draw,
}

impl Transition {
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Transition::MoveTo(_) | Transition::Shift(_) | Transition::MoveAlong(_) => {
                &[Channel::Position]
            }
            Transition::FadeIn => &[Channel::Opacity, Channel::Visibility],
            Transition::FadeOut | Transition::FadeTo(_) => &[Channel::Opacity],
            Transition::Recolor { .. } => &[Channel::Color],
            Transition::ReshapeLine { .. } => &[Channel::Geometry, Channel::Position],
            Transition::ScaleBy(_) => &[Channel::Geometry],
            Transition::SetText(_) => &[Channel::Text],
            Transition::Show | Transition::Hide => &[Channel::Visibility],
            Transition::Create => &[Channel::Draw, Channel::Visibility],
            Transition::TransformInto { style: None, .. } => {
                &[Channel::Geometry, Channel::Position]
            }
            Transition::TransformInto { style: Some(_), .. } => &[
                Channel::Geometry,
                Channel::Position,
                Channel::Color,
                Channel::Opacity,
            ],
        }
    }

    /// Mutations that bring `start` to eased progress `progress`.
    ///
    /// Always computed from the state committed when the step began, never
    /// from another action's intermediate result.
    pub fn sample(&self, start: &VisualObject, progress: f64, finished: bool) -> Vec<Mutation> {
        let opacity = start.style.opacity;
        match self {
            Transition::MoveTo(target) => {
                vec![Mutation::MoveTo(start.position.lerp(target, progress))]
            }
            Transition::Shift(delta) => vec![Mutation::MoveTo(start.position + *delta * progress)],
            Transition::MoveAlong(path) => vec![Mutation::MoveTo(path.point_at(progress))],
            Transition::FadeIn => vec![
                Mutation::SetVisible(true),
                Mutation::SetOpacity(progress),
            ],
            Transition::FadeOut => vec![Mutation::SetOpacity(opacity * (1.0 - progress))],
            Transition::FadeTo(target) => {
                vec![Mutation::SetOpacity(opacity + (target - opacity) * progress)]
            }
            Transition::Recolor { stroke, fill } => {
                let t = progress as f32;
                let mut out = Vec::new();
                if let Some(c) = stroke {
                    out.push(Mutation::SetStrokeColor(start.style.stroke_color.lerp(c, t)));
                }
                if let Some(c) = fill {
                    out.push(Mutation::SetFillColor(start.style.fill_color.lerp(c, t)));
                }
                out
            }
            Transition::ReshapeLine { start: to_start, end: to_end } => {
                match start.endpoints() {
                    Some((from_start, from_end)) => vec![Mutation::SetEndpoints {
                        start: from_start.lerp(to_start, progress),
                        end: from_end.lerp(to_end, progress),
                    }],
                    // Rejected by validation; yields an InvalidMutation if it slips through.
                    None => vec![Mutation::SetEndpoints {
                        start: *to_start,
                        end: *to_end,
                    }],
                }
            }
            Transition::ScaleBy(factor) => vec![Mutation::ScaleBy(1.0 + (factor - 1.0) * progress)],
            Transition::SetText(text) if finished => vec![Mutation::SetText(text.clone())],
            Transition::SetText(_) => Vec::new(),
            Transition::Show => vec![Mutation::SetVisible(true)],
            Transition::Hide if finished => vec![Mutation::SetVisible(false)],
            Transition::Hide => Vec::new(),
            Transition::Create => vec![Mutation::SetVisible(true), Mutation::SetDrawn(progress)],
            Transition::TransformInto {
                geometry,
                position,
                style,
            } => {
                let shape = start
                    .geometry
                    .lerp(geometry, progress)
                    // Kind mismatches are rejected by validation; SetGeometry refuses them too.
                    .unwrap_or_else(|| geometry.clone());
                let mut out = vec![Mutation::SetGeometry(shape)];
                let is_line = matches!(geometry, Geometry::Line { .. });
                if let Some(to) = position.filter(|_| !is_line) {
                    out.push(Mutation::MoveTo(start.position.lerp(&to, progress)));
                }
                if let Some(to) = style {
                    let from = &start.style;
                    let mix = |a: f64, b: f64| a + (b - a) * progress;
                    let t = progress as f32;
                    out.extend([
                        Mutation::SetStrokeColor(from.stroke_color.lerp(&to.stroke_color, t)),
                        Mutation::SetFillColor(from.fill_color.lerp(&to.fill_color, t)),
                        Mutation::SetStrokeWidth(mix(from.stroke_width, to.stroke_width)),
                        Mutation::SetFillOpacity(mix(from.fill_opacity, to.fill_opacity)),
                        Mutation::SetOpacity(mix(from.opacity, to.opacity)),
                    ]);
                }
                out
            }
        }
    }
}

/// One target and what happens to it during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub target: Handle,
    pub transition: Transition,
    #[serde(default)]
    pub easing: Easing,
}

impl Action {
    pub fn new(target: Handle, transition: Transition) -> Self {
        Self {
            target,
            transition,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A batch of actions sharing one start and end time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionStep {
    pub actions: Vec<Action>,
    pub duration: Duration,
    #[serde(default)]
    pub label: Option<String>,
}

impl TransitionStep {
    pub fn new(duration: Duration) -> Self {
        Self {
            actions: Vec::new(),
            duration,
            label: None,
        }
    }

    /// A step that only lets time pass.
    pub fn wait(duration: Duration) -> Self {
        Self::new(duration)
    }

    pub fn with(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_wait(&self) -> bool {
        self.actions.is_empty()
    }

    /// Distinct targets, in first-mention order.
    pub fn targets(&self) -> Vec<Handle> {
        let mut seen = Vec::new();
        for action in &self.actions {
            if !seen.contains(&action.target) {
                seen.push(action.target);
            }
        }
        seen
    }
}

/// The ordered steps of one scene run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Correlates log lines of one run.
    pub id: Uuid,
    steps: Vec<TransitionStep>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: TransitionStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn then(mut self, step: TransitionStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn wait(&mut self, duration: Duration) -> &mut Self {
        self.push(TransitionStep::wait(duration))
    }

    pub fn steps(&self) -> &[TransitionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn action_count(&self) -> usize {
        self.steps.iter().map(|s| s.actions.len()).sum()
    }
}
