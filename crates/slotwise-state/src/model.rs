//! In-memory configuration model.
//!
//! Identity and order are kept apart: steps, slots and variants carry string
//! ids used for cross-references (a slot names its step by id), while the
//! `Vec`s they live in only give display order. A step's `index` field, not
//! its position, decides wizard order.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use slotwise_catalog::{Material, ObjectDetails};
use slotwise_ir::{ViewPointRecord, Vec3};

use crate::render::RenderRequest;

/// Step identifier.
pub type StepId = String;
/// Slot identifier.
pub type SlotId = String;
/// Variant identifier.
pub type VariantId = String;

/// Name of the step every new variant starts with.
pub const DEFAULT_STEP_NAME: &str = "Step 1";
/// Name of a slot created without one.
pub const DEFAULT_SLOT_NAME: &str = "New slot";

/// Generate a fresh identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Placement of an object: position in scene units, Euler XYZ rotation in
/// degrees, per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0; 3],
        scale: [1.0; 3],
    };

    /// Build from stored axes, defaulting each missing one independently.
    pub fn from_parts(position: Option<Vec3>, rotation: Option<Vec3>, scale: Option<Vec3>) -> Self {
        Self {
            position: position.unwrap_or(Self::IDENTITY.position),
            rotation: rotation.unwrap_or(Self::IDENTITY.rotation),
            scale: scale.unwrap_or(Self::IDENTITY.scale),
        }
    }

    /// Rotation converted to radians for renderers.
    pub fn rotation_radians(&self) -> Vec3 {
        self.rotation.map(f64::to_radians)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A loaded, renderer-owned mesh.
///
/// Opaque to the model; it is cached per object and never persisted. Two
/// handles are equal when they point at the same mesh.
#[derive(Clone)]
pub struct MeshHandle(Arc<dyn Any + Send + Sync>);

impl MeshHandle {
    /// Wrap a renderer mesh.
    pub fn new<T: Any + Send + Sync>(mesh: T) -> Self {
        Self(Arc::new(mesh))
    }

    /// Borrow the mesh as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl PartialEq for MeshHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MeshHandle(..)")
    }
}

/// A catalog object placed in a slot (or as the environment).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub uuid: String,
    pub name: String,
    pub materials: Vec<Material>,
    pub selected_material: usize,
    /// Display names per material; overrides the catalog names.
    pub color_names: Vec<String>,
    pub transform: Transform,
    /// Lazily loaded mesh for the selected material.
    pub mesh: Option<MeshHandle>,
}

impl PlacedObject {
    /// Place an object with the identity transform and its first material.
    pub fn from_details(uuid: impl Into<String>, details: &ObjectDetails) -> Self {
        Self {
            uuid: uuid.into(),
            name: details.name.clone(),
            materials: details.materials.clone(),
            selected_material: 0,
            color_names: details.material_names(),
            transform: Transform::IDENTITY,
            mesh: None,
        }
    }

    /// The currently selected material, if the catalog returned any.
    pub fn material(&self) -> Option<&Material> {
        self.materials.get(self.selected_material)
    }

    /// Display name for a material: the override when present and non-empty,
    /// else the catalog name.
    pub fn color_name(&self, material: usize) -> Option<&str> {
        self.color_names
            .get(material)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| self.materials.get(material).and_then(Material::name))
    }

    /// What a renderer needs to show this object.
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            uuid: self.uuid.clone(),
            materials: self.materials.clone(),
            selected_material: self.selected_material,
            transform: self.transform,
        }
    }

    /// Copy without the cached mesh.
    pub(crate) fn detached(&self) -> Self {
        Self {
            mesh: None,
            ..self.clone()
        }
    }
}

/// A wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub name: String,
    /// Sort key; may be sparse.
    pub index: i64,
}

impl Step {
    /// Create a step with a fresh id.
    pub fn new(name: impl Into<String>, index: i64) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            index,
        }
    }
}

/// An attachment point holding zero or one selected object.
///
/// The selection is either `None` or a valid index into `objects`. It may be
/// `None` while objects exist only when `can_be_empty` is set. Use the
/// methods below to change `objects` so the selection stays consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    pub name: String,
    pub objects: Vec<PlacedObject>,
    selected: Option<usize>,
    pub can_be_empty: bool,
    pub hidden: bool,
    /// Show choices as text buttons instead of thumbnails.
    pub text_buttons: bool,
    pub step_id: StepId,
}

impl Slot {
    /// Create an empty slot bound to a step.
    pub fn new(name: impl Into<String>, step_id: impl Into<StepId>) -> Self {
        Self::with_id(new_id(), name, step_id)
    }

    /// Create an empty slot with a known id.
    pub fn with_id(id: impl Into<SlotId>, name: impl Into<String>, step_id: impl Into<StepId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            objects: Vec::new(),
            selected: None,
            can_be_empty: false,
            hidden: false,
            text_buttons: false,
            step_id: step_id.into(),
        }
    }

    /// Index of the selected object.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// The selected object.
    pub fn selected_object(&self) -> Option<&PlacedObject> {
        self.selected.and_then(|i| self.objects.get(i))
    }

    /// Mutable access to the selected object.
    pub fn selected_object_mut(&mut self) -> Option<&mut PlacedObject> {
        let i = self.selected?;
        self.objects.get_mut(i)
    }

    /// Change the selection. Returns `false` (and changes nothing) when the
    /// index is out of range, or when clearing is not allowed because the
    /// slot has objects and may not be empty.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i < self.objects.len() => {
                self.selected = Some(i);
                true
            }
            Some(_) => false,
            None if self.can_be_empty || self.objects.is_empty() => {
                self.selected = None;
                true
            }
            None => false,
        }
    }

    /// Selection a freshly loaded slot starts with: the first object, unless
    /// the slot may be empty or has nothing to show.
    pub fn reset_selection(&mut self) {
        self.selected = if self.objects.is_empty() || self.can_be_empty {
            None
        } else {
            Some(0)
        };
    }

    /// Append an object and select it.
    pub fn push_object(&mut self, object: PlacedObject) -> &PlacedObject {
        self.objects.push(object);
        let last = self.objects.len() - 1;
        self.selected = Some(last);
        &self.objects[last]
    }

    /// Remove an object, keeping the selection on the same object when a
    /// different one is removed and clamping it when the selected one goes.
    pub fn remove_object(&mut self, index: usize) -> Option<PlacedObject> {
        if index >= self.objects.len() {
            return None;
        }
        let removed = self.objects.remove(index);
        self.selected = match self.selected {
            _ if self.objects.is_empty() => None,
            Some(sel) if index < sel => Some(sel - 1),
            Some(sel) => Some(sel.min(self.objects.len() - 1)),
            None => None,
        };
        Some(removed)
    }

    /// Set whether the slot may show nothing. Turning it off re-selects the
    /// first object if nothing was selected.
    pub fn set_can_be_empty(&mut self, can_be_empty: bool) {
        self.can_be_empty = can_be_empty;
        if !can_be_empty && self.selected.is_none() && !self.objects.is_empty() {
            self.selected = Some(0);
        }
    }

    /// Copy the first object's position and rotation (not scale) onto every
    /// other object. Returns `false` when there are fewer than two objects.
    pub fn inherit_from_first(&mut self) -> bool {
        let Some((first, rest)) = self.objects.split_first_mut() else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }
        for object in rest {
            object.transform.position = first.transform.position;
            object.transform.rotation = first.transform.rotation;
        }
        true
    }

    /// Copy without cached meshes.
    pub(crate) fn detached(&self) -> Self {
        Self {
            objects: self.objects.iter().map(PlacedObject::detached).collect(),
            ..self.clone()
        }
    }
}

/// Camera constraint and anchor for a variant.
///
/// Angular clamps are degrees and distances scene units; zero means
/// unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewPoint {
    pub position: Vec3,
    pub rotation: Vec3,
    pub left: f64,
    pub right: f64,
    pub up: f64,
    pub down: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub enabled: bool,
    /// Hide the anchor gizmo in the editor.
    pub hidden: bool,
    /// Allow panning while this view is active.
    pub allow_movement: bool,
}

impl From<&ViewPointRecord> for ViewPoint {
    fn from(rec: &ViewPointRecord) -> Self {
        Self {
            position: rec.position.unwrap_or_default(),
            rotation: rec.rotation.unwrap_or_default(),
            left: rec.left,
            right: rec.right,
            up: rec.up,
            down: rec.down,
            min_distance: rec.min_distance,
            max_distance: rec.max_distance,
            enabled: rec.enabled,
            hidden: rec.hidden,
            allow_movement: rec.allow_movement,
        }
    }
}

impl From<&ViewPoint> for ViewPointRecord {
    fn from(vp: &ViewPoint) -> Self {
        Self {
            position: Some(vp.position),
            rotation: Some(vp.rotation),
            left: vp.left,
            right: vp.right,
            down: vp.down,
            up: vp.up,
            min_distance: vp.min_distance,
            max_distance: vp.max_distance,
            enabled: vp.enabled,
            hidden: vp.hidden,
            allow_movement: vp.allow_movement,
        }
    }
}

/// An independent configuration universe, e.g. a product SKU.
///
/// Always holds at least one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    pub steps: Vec<Step>,
    pub slots: Vec<Slot>,
    pub view_point: ViewPoint,
}

impl Variant {
    /// A variant with one default step and no slots.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            steps: vec![Step::new(DEFAULT_STEP_NAME, 0)],
            slots: Vec::new(),
            view_point: ViewPoint::default(),
        }
    }

    /// The first step in wizard order.
    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// Find a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of a step in `steps`.
    pub fn step_position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Position of a slot in `slots`.
    pub fn slot_position(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Slots bound to a step, with their positions.
    pub fn slots_in_step<'a>(&'a self, step_id: &'a str) -> impl Iterator<Item = (usize, &'a Slot)> + 'a {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.step_id == step_id)
    }

    /// Position of the first slot bound to the first step.
    pub fn first_slot_of_first_step(&self) -> Option<usize> {
        let first = self.first_step()?;
        self.slots_in_step(&first.id).next().map(|(i, _)| i)
    }

    /// Index for a newly appended step: one past the largest index in use,
    /// so indices are never reused after deletions.
    pub fn next_step_index(&self) -> i64 {
        self.steps
            .iter()
            .map(|s| s.index)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Stable sort of steps by `index`.
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| s.index);
    }

    /// Rebind every slot whose step id does not resolve to the first step.
    /// Returns how many slots were rebound.
    pub fn repair_step_refs(&mut self) -> usize {
        let Some(first) = self.steps.first().map(|s| s.id.clone()) else {
            return 0;
        };
        let mut repaired = 0;
        for slot in &mut self.slots {
            if !self.steps.iter().any(|s| s.id == slot.step_id) {
                slot.step_id = first.clone();
                repaired += 1;
            }
        }
        repaired
    }

    /// Deep copy under fresh ids for the variant, its steps and its slots.
    /// Slot step references follow their steps; meshes are not copied.
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        let mut step_ids: HashMap<&str, StepId> = HashMap::new();
        let steps = self
            .steps
            .iter()
            .map(|s| {
                let copy = Step::new(s.name.clone(), s.index);
                step_ids.insert(s.id.as_str(), copy.id.clone());
                copy
            })
            .collect();
        let slots = self
            .slots
            .iter()
            .map(|s| {
                let mut copy = s.detached();
                copy.id = new_id();
                if let Some(step) = step_ids.get(s.step_id.as_str()) {
                    copy.step_id = step.clone();
                }
                copy
            })
            .collect();

        Self {
            id: new_id(),
            name: name.into(),
            steps,
            slots,
            view_point: self.view_point,
        }
    }
}
