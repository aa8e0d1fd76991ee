//! Declarative scene descriptions.
//!
//! A description names its objects and refers to them by name everywhere
//! else; [`SceneDescription::build`] resolves those names into handles and
//! returns a ready [`Stage`] plus the [`Timeline`] to play on it.
//!
//! ```toml
//! [[objects]]
//! name = "a"
//! position = [0.0, 0.0, 0.0]
//! geometry = { circle = { radius = 0.5 } }
//!
//! [[steps]]
//! duration = 1.0
//! actions = [{ target = "a", transition = { move_to = [2.0, 0.0, 0.0] } }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use stagehand_core::{
    Direction, Duration, Easing, Handle, Point3, StageConfig, StageResult,
};

use crate::anchor::{Derivation, Endpoint};
use crate::layout::GridSpec;
use crate::object::{AnchorPoint, Geometry, Mutation, Style};
use crate::stage::Stage;
use crate::timeline::{Action, Timeline, Transition, TransitionStep};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub grid: Option<GridDescription>,
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescription>,
    #[serde(default)]
    pub steps: Vec<StepDescription>,
}

/// Reference grid drawn behind the scene. Omitted dimensions come from the
/// `[grid]` section of the stage config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescription {
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub columns: Option<usize>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub center: Point3,
    /// Draw coordinate labels along the border.
    #[serde(default = "default_true")]
    pub labels: bool,
}

impl GridDescription {
    pub fn spec(&self, defaults: &GridSpec) -> GridSpec {
        GridSpec::new(
            self.rows.unwrap_or(defaults.rows),
            self.columns.unwrap_or(defaults.columns),
            self.width.unwrap_or(defaults.width),
            self.height.unwrap_or(defaults.height),
        )
        .centered_at(self.center)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub position: Point3,
    /// Falls back to the configured default style.
    #[serde(default)]
    pub style: Option<Style>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDescription {
    pub derived: String,
    pub derivation: DerivationDescription,
}

/// [`Derivation`] with objects referred to by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationDescription {
    LineBetween {
        from: EndpointDescription,
        to: EndpointDescription,
    },
    FollowCenter {
        anchor: String,
        #[serde(default)]
        offset: Point3,
    },
    NextTo {
        anchor: String,
        direction: Direction,
        #[serde(default)]
        buff: f64,
    },
}

/// Either `[x, y, z]` or `{ object = "name", at = ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointDescription {
    Fixed(Point3),
    Object {
        object: String,
        #[serde(default)]
        at: AnchorPoint,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescription {
    pub duration: Duration,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescription {
    pub target: String,
    pub transition: Transition,
    #[serde(default)]
    pub easing: Easing,
}

fn default_true() -> bool {
    true
}

impl SceneDescription {
    pub fn from_json(json: &str) -> StageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml(contents: &str) -> StageResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_json(&self) -> StageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a `.toml` file as TOML and anything else as JSON.
    pub fn load_from_file(path: &Path) -> StageResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Create every object, grid line and attachment on a fresh stage and
    /// resolve the steps into a timeline.
    pub fn build(&self, config: &StageConfig) -> StageResult<(Stage, Timeline)> {
        let mut stage = Stage::new(config);

        if let Some(grid) = &self.grid {
            let spec = grid.spec(stage.default_grid());
            stage.add_grid(&spec, grid.labels)?;
        }

        for object in &self.objects {
            let handle = stage.add_named(
                &object.name,
                object.geometry.clone(),
                object.position,
                object.style.clone(),
            )?;
            if !object.visible {
                stage.mutate(handle, Mutation::SetVisible(false))?;
            }
        }

        for attachment in &self.attachments {
            let derived = stage.lookup(&attachment.derived)?;
            let derivation = attachment.derivation.resolve(&stage)?;
            stage.derive(derived, derivation)?;
        }

        let mut timeline = Timeline::new();
        for step in &self.steps {
            let mut resolved = TransitionStep::new(step.duration);
            resolved.label = step.label.clone();
            for action in &step.actions {
                resolved = resolved.with(
                    Action::new(stage.lookup(&action.target)?, action.transition.clone())
                        .with_easing(action.easing),
                );
            }
            timeline.push(resolved);
        }

        tracing::info!(
            "built scene: {} objects, {} attachments, {} steps",
            stage.registry().len(),
            self.attachments.len(),
            timeline.len()
        );
        Ok((stage, timeline))
    }
}

impl DerivationDescription {
    fn resolve(&self, stage: &Stage) -> StageResult<Derivation> {
        let handle = |name: &str| -> StageResult<Handle> { stage.lookup(name) };
        Ok(match self {
            DerivationDescription::LineBetween { from, to } => Derivation::LineBetween {
                from: from.resolve(stage)?,
                to: to.resolve(stage)?,
            },
            DerivationDescription::FollowCenter { anchor, offset } => Derivation::FollowCenter {
                anchor: handle(anchor)?,
                offset: *offset,
            },
            DerivationDescription::NextTo {
                anchor,
                direction,
                buff,
            } => Derivation::NextTo {
                anchor: handle(anchor)?,
                direction: *direction,
                buff: *buff,
            },
        })
    }
}

impl EndpointDescription {
    fn resolve(&self, stage: &Stage) -> StageResult<Endpoint> {
        match self {
            EndpointDescription::Fixed(p) => Ok(Endpoint::Fixed(*p)),
            EndpointDescription::Object { object, at } => Ok(Endpoint::Object {
                handle: stage.lookup(object)?,
                at: *at,
            }),
        }
    }
}
