use std::collections::HashSet;

use stagehand_core::{Handle, ObjectKind, StageError};

use crate::object::{Geometry, Style};
use crate::registry::SceneObjectRegistry;
use crate::timeline::{Timeline, Transition};

/// Check a timeline against the objects it will drive.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_timeline(
    timeline: &Timeline,
    registry: &SceneObjectRegistry,
) -> Result<(), Vec<StageError>> {
    let mut errors = Vec::new();

    for (index, step) in timeline.steps().iter().enumerate() {
        let mut written = HashSet::new();
        for action in &step.actions {
            let object = match registry.get(action.target) {
                Ok(object) => object,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            for channel in action.transition.channels() {
                if !written.insert((action.target, *channel)) {
                    errors.push(StageError::InvalidTimeline(format!(
                        "step {} writes {:?} of {} more than once",
                        index, channel, action.target
                    )));
                }
            }

            let kind = object.kind();
            let problem = match &action.transition {
                Transition::ReshapeLine { start, end } if kind != ObjectKind::Line => Some(
                    format!("cannot reshape {} {} as a line ({start} -> {end})", kind, action.target),
                ),
                Transition::ReshapeLine { start, end } if !(start.is_finite() && end.is_finite()) => {
                    Some(format!("non-finite line {start} -> {end} for {}", action.target))
                }
                Transition::TransformInto { geometry, .. } if geometry.kind() != kind => Some(
                    format!("cannot transform {} {} into {}", kind, action.target, geometry.kind()),
                ),
                Transition::TransformInto {
                    geometry: Geometry::Line { .. },
                    position: Some(_),
                    ..
                } => Some(format!(
                    "line {} is placed by its endpoints, not a position",
                    action.target
                )),
                Transition::TransformInto {
                    geometry,
                    position,
                    style,
                } => geometry
                    .validate()
                    .err()
                    .or_else(|| {
                        position
                            .filter(|p| !p.is_finite())
                            .map(|p| format!("non-finite target {} for {}", p, action.target))
                    })
                    .or_else(|| style.as_ref().and_then(|s| style_problem(s, action.target))),
                Transition::SetText(_) if kind != ObjectKind::Label => {
                    Some(format!("{} {} has no text", kind, action.target))
                }
                Transition::MoveTo(p) | Transition::Shift(p) if !p.is_finite() => {
                    Some(format!("non-finite target {} for {}", p, action.target))
                }
                Transition::FadeTo(v) if !v.is_finite() => {
                    Some(format!("non-finite opacity for {}", action.target))
                }
                Transition::ScaleBy(f) if !(f.is_finite() && *f >= 0.0) => {
                    Some(format!("invalid scale factor {} for {}", f, action.target))
                }
                _ => None,
            };
            if let Some(message) = problem {
                errors.push(StageError::InvalidTimeline(format!("step {}: {}", index, message)));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Why a morph target style cannot be applied, if it cannot.
fn style_problem(style: &Style, target: Handle) -> Option<String> {
    if !(style.stroke_width.is_finite() && style.stroke_width >= 0.0) {
        Some(format!("invalid stroke width {} for {}", style.stroke_width, target))
    } else if !(style.opacity.is_finite() && style.fill_opacity.is_finite()) {
        Some(format!("non-finite opacity for {}", target))
    } else {
        None
    }
}
