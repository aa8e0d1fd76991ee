use std::collections::{BTreeMap, HashMap};

use stagehand_core::{Handle, Point3, StageError, StageResult};

use crate::object::{Geometry, Mutation, Style, VisualObject};

/// Owns every visual object in a scene and hands out handles to them.
///
/// Objects live until the scene ends or until [`remove`](Self::remove) is
/// called explicitly. Iteration follows creation order.
#[derive(Debug, Clone, Default)]
pub struct SceneObjectRegistry {
    objects: BTreeMap<Handle, VisualObject>,
    names: HashMap<String, Handle>,
    next_id: u64,
}

impl SceneObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anonymous object.
    pub fn create(&mut self, geometry: Geometry, position: Point3, style: Style) -> StageResult<Handle> {
        self.insert(None, geometry, position, style)
    }

    /// Create an object that can later be found with [`lookup`](Self::lookup).
    pub fn create_named(
        &mut self,
        name: impl Into<String>,
        geometry: Geometry,
        position: Point3,
        style: Style,
    ) -> StageResult<Handle> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(StageError::InvalidArgument(format!(
                "object name '{}' is already taken",
                name
            )));
        }
        self.insert(Some(name), geometry, position, style)
    }

    fn insert(
        &mut self,
        name: Option<String>,
        geometry: Geometry,
        position: Point3,
        style: Style,
    ) -> StageResult<Handle> {
        let handle = Handle::new(self.next_id);
        let object = VisualObject::new(handle, name.clone(), geometry, position, style)?;
        self.next_id += 1;
        if let Some(name) = name {
            self.names.insert(name, handle);
        }
        self.objects.insert(handle, object);
        Ok(handle)
    }

    /// Get an object by handle, or `UnknownHandle` if it was never created
    /// or has been removed.
    pub fn get(&self, handle: Handle) -> StageResult<&VisualObject> {
        self.objects
            .get(&handle)
            .ok_or(StageError::UnknownHandle(handle))
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> StageResult<&mut VisualObject> {
        self.objects
            .get_mut(&handle)
            .ok_or(StageError::UnknownHandle(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.objects.contains_key(&handle)
    }

    /// Find the handle of a named object.
    pub fn lookup(&self, name: &str) -> StageResult<Handle> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| StageError::UnknownObject(name.to_string()))
    }

    /// Apply one typed mutation. Fails without side effects if the handle is
    /// unknown or the mutation does not fit the object.
    pub fn mutate(&mut self, handle: Handle, mutation: Mutation) -> StageResult<()> {
        self.get_mut(handle)?.apply(mutation)
    }

    /// Shorthand for [`Mutation::MoveTo`].
    pub fn move_to(&mut self, handle: Handle, position: Point3) -> StageResult<()> {
        self.mutate(handle, Mutation::MoveTo(position))
    }

    /// Shorthand for [`Mutation::SetOpacity`].
    pub fn set_opacity(&mut self, handle: Handle, opacity: f64) -> StageResult<()> {
        self.mutate(handle, Mutation::SetOpacity(opacity))
    }

    /// Destroy an object. Its handle is never issued again.
    ///
    /// Attachments are not consulted here; use [`Stage::remove`](crate::Stage::remove)
    /// for objects that may be anchors.
    pub fn remove(&mut self, handle: Handle) -> StageResult<VisualObject> {
        let object = self
            .objects
            .remove(&handle)
            .ok_or(StageError::UnknownHandle(handle))?;
        if let Some(name) = &object.name {
            self.names.remove(name);
        }
        Ok(object)
    }

    /// Objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &VisualObject> {
        self.objects.values()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.objects.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Clone every object, in creation order.
    pub fn snapshot(&self) -> Vec<VisualObject> {
        self.objects.values().cloned().collect()
    }
}
