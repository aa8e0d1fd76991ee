use tracing::debug;

use stagehand_core::{Handle, Point3, StageConfig, StageError, StageResult};

use crate::anchor::{Derivation, RecomputeFn, ReferenceUpdater};
use crate::layout::{GridSpec, LayoutEngine, PopulatedGrid};
use crate::object::{Geometry, Mutation, Style, VisualObject};
use crate::registry::SceneObjectRegistry;

/// Everything one scene run owns: its objects, their attachments and the
/// layout engine used to place them.
#[derive(Debug)]
pub struct Stage {
    registry: SceneObjectRegistry,
    updater: ReferenceUpdater,
    layout: LayoutEngine,
    default_style: Style,
    grid: GridSpec,
    grid_style: Style,
    axis_style: Style,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(&StageConfig::default())
    }
}

impl Stage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            registry: SceneObjectRegistry::new(),
            updater: ReferenceUpdater::new(),
            layout: LayoutEngine::new(&config.grid),
            default_style: Style::stroke(config.style.stroke_color, config.style.stroke_width),
            grid: GridSpec::from(&config.grid),
            grid_style: Style::stroke(config.grid.grid_color, config.grid.grid_stroke),
            axis_style: Style::stroke(config.grid.axis_color, config.grid.axis_stroke),
        }
    }

    pub fn registry(&self) -> &SceneObjectRegistry {
        &self.registry
    }

    pub fn updater(&self) -> &ReferenceUpdater {
        &self.updater
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn default_style(&self) -> &Style {
        &self.default_style
    }

    /// The configured grid, used when a scene asks for one without
    /// dimensions.
    pub fn default_grid(&self) -> &GridSpec {
        &self.grid
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SceneObjectRegistry, &ReferenceUpdater) {
        (&mut self.registry, &self.updater)
    }

    /// Lay out `spec` and add its lines, axes and (optionally) tick labels
    /// in the configured grid and axis styles.
    pub fn add_grid(&mut self, spec: &GridSpec, labels: bool) -> StageResult<PopulatedGrid> {
        let mut layout = self.layout.grid_at(spec)?;
        if !labels {
            layout.ticks.clear();
        }
        self.layout
            .populate(&mut self.registry, &layout, &self.grid_style, &self.axis_style)
    }

    /// Add an object with the configured default style.
    pub fn add(&mut self, geometry: Geometry, position: Point3) -> StageResult<Handle> {
        let style = self.default_style.clone();
        self.registry.create(geometry, position, style)
    }

    pub fn add_styled(&mut self, geometry: Geometry, position: Point3, style: Style) -> StageResult<Handle> {
        self.registry.create(geometry, position, style)
    }

    pub fn add_named(
        &mut self,
        name: &str,
        geometry: Geometry,
        position: Point3,
        style: Option<Style>,
    ) -> StageResult<Handle> {
        let style = style.unwrap_or_else(|| self.default_style.clone());
        self.registry.create_named(name, geometry, position, style)
    }

    pub fn get(&self, handle: Handle) -> StageResult<&VisualObject> {
        self.registry.get(handle)
    }

    pub fn lookup(&self, name: &str) -> StageResult<Handle> {
        self.registry.lookup(name)
    }

    /// Mutate one object, then bring every derived object up to date.
    ///
    /// All or nothing: if the mutation or any recompute fails, the stage is
    /// left as it was.
    pub fn mutate(&mut self, handle: Handle, mutation: Mutation) -> StageResult<()> {
        let mut next = self.registry.clone();
        next.mutate(handle, mutation)?;
        self.updater.recompute_all(&mut next)?;
        self.registry = next;
        Ok(())
    }

    /// Remove an object from the scene.
    ///
    /// An object other objects are still anchored on cannot be removed;
    /// detach its dependents first. A derived object loses its own
    /// attachment along with it.
    pub fn remove(&mut self, handle: Handle) -> StageResult<VisualObject> {
        self.registry.get(handle)?;
        let dependents = self.updater.dependents_of(handle);
        if !dependents.is_empty() {
            let names: Vec<String> = dependents.iter().map(Handle::to_string).collect();
            return Err(StageError::InvalidArgument(format!(
                "{} still anchors {}; detach them first",
                handle,
                names.join(", ")
            )));
        }
        self.updater.detach(handle);
        let removed = self.registry.remove(handle)?;
        debug!(%handle, "removed object");
        Ok(removed)
    }

    pub fn attach(&mut self, derived: Handle, anchors: &[Handle], recompute: RecomputeFn) -> StageResult<()> {
        self.updater.attach(&mut self.registry, derived, anchors, recompute)
    }

    pub fn derive(&mut self, derived: Handle, derivation: Derivation) -> StageResult<()> {
        self.updater
            .attach_derivation(&mut self.registry, derived, derivation)
    }

    /// Stop updating `derived`. It keeps its current state.
    pub fn detach(&mut self, derived: Handle) -> bool {
        self.updater.detach(derived)
    }

    /// Recompute every derived object.
    pub fn refresh(&mut self) -> StageResult<()> {
        self.updater.recompute_all(&mut self.registry)
    }

    pub fn snapshot(&self) -> Vec<VisualObject> {
        self.registry.snapshot()
    }
}
