//! Editor state: the mutable configuration graph behind the authoring UI.
//!
//! Every operation leaves the model valid. Requests that would break an
//! invariant (deleting the last variant or step, selecting out of range,
//! aligning a single-object slot) are declined and reported through the
//! return value, never as an error.

use slotwise_catalog::{Catalog, ObjectDetails};
use slotwise_ir::{ConfigDocument, VersionedDocument, DEFAULT_VARIANT_NAME};

use crate::export::export_document;
use crate::hydrate::{hydrate, ImportReport};
use crate::loads::{LoadKey, LoadTicket, LoadTokens};
use crate::model::{
    PlacedObject, Slot, Step, Transform, Variant, ViewPoint, DEFAULT_SLOT_NAME,
};
use crate::render::RenderRequest;
use crate::Result;

/// The editor's in-memory configuration with its "current" pointers.
#[derive(Debug)]
pub struct ConfiguratorState {
    variants: Vec<Variant>,
    current_variant: usize,
    current_step: usize,
    current_slot: Option<usize>,
    environment: Option<PlacedObject>,
    loads: LoadTokens,
}

impl Default for ConfiguratorState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfiguratorState {
    /// A new project: one variant "Variant 1" with one step and no slots.
    pub fn new() -> Self {
        Self {
            variants: vec![Variant::new(DEFAULT_VARIANT_NAME)],
            current_variant: 0,
            current_step: 0,
            current_slot: None,
            environment: None,
            loads: LoadTokens::new(),
        }
    }

    /// Reset to a new project.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // --- accessors -------------------------------------------------------

    /// All variants in display order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Position of the current variant.
    pub fn current_variant_index(&self) -> usize {
        self.current_variant
    }

    /// The current variant.
    pub fn current_variant(&self) -> &Variant {
        &self.variants[self.current_variant]
    }

    fn variant_mut(&mut self) -> &mut Variant {
        &mut self.variants[self.current_variant]
    }

    /// Steps of the current variant in wizard order.
    pub fn steps(&self) -> &[Step] {
        &self.current_variant().steps
    }

    /// Slots of the current variant.
    pub fn slots(&self) -> &[Slot] {
        &self.current_variant().slots
    }

    /// Position of the active step.
    pub fn current_step_index(&self) -> usize {
        self.current_step
    }

    /// The active step.
    pub fn current_step(&self) -> Option<&Step> {
        self.steps().get(self.current_step)
    }

    /// Position of the selected slot, `None` when nothing is selected.
    pub fn current_slot_index(&self) -> Option<usize> {
        self.current_slot
    }

    /// The selected slot.
    pub fn current_slot(&self) -> Option<&Slot> {
        self.current_slot.and_then(|i| self.slots().get(i))
    }

    fn current_slot_mut(&mut self) -> Option<&mut Slot> {
        let i = self.current_slot?;
        self.variant_mut().slots.get_mut(i)
    }

    /// Find a slot of the current variant by id.
    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots().iter().find(|s| s.id == id)
    }

    /// Mutable access to a slot of the current variant.
    ///
    /// Prefer the dedicated operations for anything touching `objects` or the
    /// owning step so selections and step references stay valid.
    pub fn slot_mut(&mut self, id: &str) -> Option<&mut Slot> {
        self.variant_mut().slots.iter_mut().find(|s| s.id == id)
    }

    /// Slots of the current variant bound to a step.
    pub fn slots_in_step<'a>(&'a self, step_id: &'a str) -> Vec<(usize, &'a Slot)> {
        self.current_variant().slots_in_step(step_id).collect()
    }

    /// The environment asset.
    pub fn environment(&self) -> Option<&PlacedObject> {
        self.environment.as_ref()
    }

    // --- variants --------------------------------------------------------

    /// Add a variant copied from the current one and make it current.
    ///
    /// Steps get fresh ids; slots are deep copies (transforms and color-name
    /// overrides included) re-bound to the copied steps. The new variant
    /// starts on its first step with its first slot selected, if any.
    pub fn add_variant(&mut self, name: Option<&str>) -> &Variant {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Variant {}", self.variants.len() + 1));
        let copy = self.current_variant().duplicate(name);
        self.variants.push(copy);
        self.current_variant = self.variants.len() - 1;
        self.current_step = 0;
        self.current_slot = if self.slots().is_empty() { None } else { Some(0) };
        self.loads.forget_slots();
        tracing::debug!(variant = %self.current_variant().name, "variant added");
        self.current_variant()
    }

    /// Delete the current variant and select the first one. Declined when it
    /// is the only variant.
    pub fn delete_current_variant(&mut self) -> bool {
        if self.variants.len() <= 1 {
            return false;
        }
        self.variants.remove(self.current_variant);
        self.select_variant(0);
        true
    }

    /// Rename the current variant.
    pub fn rename_current_variant(&mut self, name: impl Into<String>) {
        self.variant_mut().name = name.into();
    }

    /// Switch to another variant, landing on its first step and the first
    /// slot of that step.
    pub fn select_variant(&mut self, index: usize) -> bool {
        if index >= self.variants.len() {
            return false;
        }
        self.current_variant = index;
        self.current_step = 0;
        self.current_slot = self.current_variant().first_slot_of_first_step();
        self.loads.forget_slots();
        true
    }

    // --- steps -----------------------------------------------------------

    /// Append a step to the current variant.
    ///
    /// Its index is one past the largest in use, so indices are never reused
    /// after deletions.
    pub fn add_step(&mut self, name: impl Into<String>) -> &Step {
        let variant = self.variant_mut();
        let step = Step::new(name, variant.next_step_index());
        variant.steps.push(step);
        let last = variant.steps.len() - 1;
        &self.steps()[last]
    }

    /// Rename a step of the current variant.
    pub fn rename_step(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.variant_mut().steps.iter_mut().find(|s| s.id == id) {
            Some(step) => {
                step.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Make a step active and select its first slot.
    pub fn select_step(&mut self, index: usize) -> bool {
        let Some(step_id) = self.steps().get(index).map(|s| s.id.clone()) else {
            return false;
        };
        let first = self
            .current_variant()
            .slots_in_step(&step_id)
            .next()
            .map(|(i, _)| i);
        self.current_step = index;
        self.current_slot = first;
        true
    }

    /// Delete a step of the current variant.
    ///
    /// Slots bound to it move to the first remaining step. Declined for the
    /// last step or an unknown id. Sibling indices are not renumbered.
    pub fn delete_step(&mut self, id: &str) -> bool {
        let variant = self.variant_mut();
        if variant.steps.len() <= 1 {
            return false;
        }
        let Some(pos) = variant.step_position(id) else {
            return false;
        };
        variant.steps.remove(pos);
        let rebound = variant.repair_step_refs();
        let remaining = variant.steps.len();

        if pos < self.current_step {
            self.current_step -= 1;
        }
        self.current_step = self.current_step.min(remaining - 1);
        tracing::debug!(step = id, rebound, "step deleted");
        true
    }

    // --- slots -----------------------------------------------------------

    /// Add an empty slot to the active step and select it.
    pub fn add_slot(&mut self, name: Option<&str>) -> &Slot {
        let step_id = self
            .current_step()
            .or_else(|| self.current_variant().first_step())
            .map(|s| s.id.clone())
            .unwrap_or_default();
        let slot = Slot::new(name.unwrap_or(DEFAULT_SLOT_NAME), step_id);
        let variant = self.variant_mut();
        variant.slots.push(slot);
        let last = variant.slots.len() - 1;
        self.current_slot = Some(last);
        &self.slots()[last]
    }

    /// Remove a slot.
    ///
    /// The selection moves to the first remaining slot of the removed slot's
    /// step, else the first slot overall, else nothing.
    pub fn remove_slot(&mut self, id: &str) -> bool {
        let variant = self.variant_mut();
        let Some(pos) = variant.slot_position(id) else {
            return false;
        };
        let removed = variant.slots.remove(pos);
        let same_step = variant
            .slots
            .iter()
            .position(|s| s.step_id == removed.step_id);
        let fallback = if variant.slots.is_empty() { None } else { Some(0) };
        self.current_slot = same_step.or(fallback);
        self.loads.forget(&LoadKey::Slot(removed.id));
        true
    }

    /// Select a slot of the current variant.
    pub fn select_slot(&mut self, index: usize) -> bool {
        if index >= self.slots().len() {
            return false;
        }
        self.current_slot = Some(index);
        true
    }

    /// Rename a slot.
    pub fn rename_slot(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Bind a slot to another step of the same variant.
    pub fn move_slot_to_step(&mut self, slot_id: &str, step_id: &str) -> bool {
        if self.current_variant().step(step_id).is_none() {
            return false;
        }
        match self.slot_mut(slot_id) {
            Some(slot) => {
                slot.step_id = step_id.to_string();
                true
            }
            None => false,
        }
    }

    /// Allow or forbid showing nothing in a slot.
    pub fn set_can_be_empty(&mut self, id: &str, can_be_empty: bool) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.set_can_be_empty(can_be_empty);
                true
            }
            None => false,
        }
    }

    /// Switch a slot between text buttons and thumbnails.
    pub fn set_text_buttons(&mut self, id: &str, text_buttons: bool) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.text_buttons = text_buttons;
                true
            }
            None => false,
        }
    }

    /// Flip a slot's editor visibility. Returns the new state, `None` for an
    /// unknown slot. Hiding a slot supersedes its in-flight mesh load.
    pub fn toggle_slot_hidden(&mut self, id: &str) -> Option<bool> {
        let slot = self.slot_mut(id)?;
        slot.hidden = !slot.hidden;
        let hidden = slot.hidden;
        if hidden {
            self.loads.invalidate(&LoadKey::Slot(id.to_string()));
        }
        Some(hidden)
    }

    // --- objects ---------------------------------------------------------

    /// Place a catalog object in the current slot and select it.
    ///
    /// Returns `None` when no slot is selected or the details carry no UUID.
    pub fn add_object_to_current(&mut self, details: &ObjectDetails) -> Option<&PlacedObject> {
        let uuid = details.uuid.clone().filter(|u| !u.is_empty())?;
        self.invalidate_current_slot_load()?;
        let slot = self.current_slot_mut()?;
        Some(slot.push_object(PlacedObject::from_details(uuid, details)))
    }

    /// Remove an object from the current slot, clamping the selection.
    pub fn remove_object(&mut self, index: usize) -> Option<PlacedObject> {
        let removed = self.current_slot_mut()?.remove_object(index)?;
        self.invalidate_current_slot_load();
        Some(removed)
    }

    /// Change which object the current slot shows. `None` is accepted only
    /// when the slot may be empty.
    pub fn select_object(&mut self, index: Option<usize>) -> bool {
        let selected = self
            .current_slot_mut()
            .is_some_and(|slot| slot.select(index));
        if selected {
            self.invalidate_current_slot_load();
        }
        selected
    }

    /// Select an object of the current slot and one of its materials.
    pub fn select_material(&mut self, object: usize, material: usize) -> bool {
        let Some(slot) = self.current_slot_mut() else {
            return false;
        };
        let valid = slot
            .objects
            .get(object)
            .is_some_and(|o| material < o.materials.len());
        if !valid {
            return false;
        }
        slot.select(Some(object));
        let obj = &mut slot.objects[object];
        if obj.selected_material != material {
            obj.selected_material = material;
            obj.mesh = None;
        }
        self.invalidate_current_slot_load();
        true
    }

    /// Supersede the in-flight mesh load of the selected slot, whose shown
    /// object or material is about to change.
    fn invalidate_current_slot_load(&mut self) -> Option<()> {
        let key = LoadKey::Slot(self.current_slot()?.id.clone());
        self.loads.invalidate(&key);
        Some(())
    }

    /// Overwrite the transform of an object in the current slot.
    pub fn set_object_transform(&mut self, object: usize, transform: Transform) -> bool {
        match self
            .current_slot_mut()
            .and_then(|slot| slot.objects.get_mut(object))
        {
            Some(obj) => {
                obj.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Align every object of a slot with its first object's position and
    /// rotation. Declined for slots with fewer than two objects.
    pub fn inherit_from_first(&mut self, slot_id: &str) -> bool {
        self.slot_mut(slot_id)
            .is_some_and(Slot::inherit_from_first)
    }

    // --- view point & environment -----------------------------------------

    /// The current variant's view point.
    pub fn view_point(&self) -> &ViewPoint {
        &self.current_variant().view_point
    }

    /// Mutable access to the current variant's view point.
    pub fn view_point_mut(&mut self) -> &mut ViewPoint {
        &mut self.variant_mut().view_point
    }

    /// Replace the current variant's view point.
    pub fn set_view_point(&mut self, view_point: ViewPoint) {
        self.variant_mut().view_point = view_point;
    }

    /// Replace the environment with a catalog object at the identity
    /// transform. Returns `None` when the details carry no UUID.
    pub fn set_environment(&mut self, details: &ObjectDetails) -> Option<&PlacedObject> {
        let uuid = details.uuid.clone().filter(|u| !u.is_empty())?;
        self.loads.invalidate(&LoadKey::Environment);
        self.environment = Some(PlacedObject::from_details(uuid, details));
        self.environment.as_ref()
    }

    /// Clear the environment.
    pub fn remove_environment(&mut self) -> Option<PlacedObject> {
        self.loads.invalidate(&LoadKey::Environment);
        self.environment.take()
    }

    // --- rendering -------------------------------------------------------

    /// Start (re)loading a slot's mesh.
    ///
    /// Any earlier load for the slot becomes stale. Returns the ticket and
    /// what to render, or `None` when the slot is unknown, hidden or shows
    /// nothing.
    pub fn begin_slot_load(&mut self, slot_id: &str) -> Option<(LoadTicket, RenderRequest)> {
        let request = self
            .slot(slot_id)
            .filter(|s| !s.hidden)
            .and_then(Slot::selected_object)
            .map(PlacedObject::render_request);
        let key = LoadKey::Slot(slot_id.to_string());
        match request {
            Some(request) => Some((self.loads.issue(key), request)),
            None => {
                self.loads.invalidate(&key);
                None
            }
        }
    }

    /// Start (re)loading the environment mesh.
    pub fn begin_environment_load(&mut self) -> Option<(LoadTicket, RenderRequest)> {
        let request = self.environment.as_ref()?.render_request();
        Some((self.loads.issue(LoadKey::Environment), request))
    }

    // --- persistence -----------------------------------------------------

    /// Build the version-2 document.
    pub fn export_document(&self) -> VersionedDocument {
        export_document(&self.variants, self.environment.as_ref())
    }

    /// Serialize to pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(self.export_document().to_json()?)
    }

    /// Replace the whole model with a document's content.
    ///
    /// Every object UUID is resolved through `catalog`; unresolvable ones are
    /// dropped. Afterwards the first variant and step are current and the
    /// first slot of that step is selected.
    pub async fn import_document<C: Catalog + ?Sized>(
        &mut self,
        doc: ConfigDocument,
        catalog: &C,
    ) -> ImportReport {
        let hydrated = hydrate(doc, catalog).await;
        self.loads.clear();
        self.variants = hydrated.variants;
        self.environment = hydrated.environment;
        self.current_variant = 0;
        self.current_step = 0;
        self.current_slot = self.current_variant().first_slot_of_first_step();
        hydrated.report
    }

    /// Parse and import a JSON document. Fails only on malformed JSON; the
    /// current model is untouched in that case.
    pub async fn import_json<C: Catalog + ?Sized>(&mut self, json: &str, catalog: &C) -> Result<ImportReport> {
        let doc = ConfigDocument::from_json(json)?;
        Ok(self.import_document(doc, catalog).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotwise_catalog::{Material, MemoryCatalog};

    fn details(uuid: &str) -> ObjectDetails {
        ObjectDetails::new(
            uuid,
            uuid.to_uppercase(),
            vec![
                Material(json!({"name": "Red", "native": {"glbUrl": format!("{uuid}-red.glb")}})),
                Material(json!({"name": "Blue", "native": {"glbUrl": format!("{uuid}-blue.glb")}})),
            ],
        )
    }

    #[test]
    fn new_project_shape() {
        let state = ConfiguratorState::new();
        assert_eq!(state.variants().len(), 1);
        assert_eq!(state.current_variant().name, "Variant 1");
        assert_eq!(state.steps().len(), 1);
        assert!(state.slots().is_empty());
        assert_eq!(state.current_slot_index(), None);
    }

    #[test]
    fn add_slot_binds_to_active_step() {
        let mut state = ConfiguratorState::new();
        let second = state.add_step("Upholstery").id.clone();
        assert!(state.select_step(1));
        let slot = state.add_slot(None);
        assert_eq!(slot.step_id, second);
        assert_eq!(slot.name, DEFAULT_SLOT_NAME);
        assert_eq!(slot.selected_index(), None);
        assert!(!slot.can_be_empty);
        assert_eq!(state.current_slot_index(), Some(0));
    }

    #[test]
    fn add_object_needs_a_slot() {
        let mut state = ConfiguratorState::new();
        assert!(state.add_object_to_current(&details("a")).is_none());
        state.add_slot(Some("Frame"));
        let obj = state.add_object_to_current(&details("a")).expect("placed");
        assert_eq!(obj.transform, Transform::IDENTITY);
        assert_eq!(obj.selected_material, 0);
        state.add_object_to_current(&details("b"));
        assert_eq!(state.current_slot().unwrap().selected_index(), Some(1));

        let nameless = ObjectDetails::default();
        assert!(state.add_object_to_current(&nameless).is_none());
    }

    #[test]
    fn add_step_indices_stay_monotonic() {
        let mut state = ConfiguratorState::new();
        let b = state.add_step("B").id.clone();
        state.add_step("C");
        assert!(state.delete_step(&b));
        assert_eq!(state.add_step("D").index, 3);
    }

    #[test]
    fn delete_step_rebinds_slots() {
        let mut state = ConfiguratorState::new();
        let first = state.steps()[0].id.clone();
        let second = state.add_step("Two").id.clone();
        state.select_step(1);
        let slot = state.add_slot(Some("Cushion")).id.clone();
        assert!(state.delete_step(&second));
        assert_eq!(state.slot(&slot).unwrap().step_id, first);
        assert_eq!(state.current_step_index(), 0);

        assert!(!state.delete_step(&first), "last step must stay");
        assert!(!state.delete_step("unknown"));
    }

    #[test]
    fn remove_slot_prefers_same_step() {
        let mut state = ConfiguratorState::new();
        let s = state.steps()[0].id.clone();
        let t = state.add_step("T").id.clone();
        state.select_step(1);
        state.add_slot(Some("t1"));
        state.select_step(0);
        state.add_slot(Some("s1"));
        state.add_slot(Some("s2"));
        let s1 = state.slots()[1].id.clone();

        assert!(state.remove_slot(&s1));
        let current = state.current_slot().unwrap();
        assert_eq!(current.name, "s2");
        assert_eq!(current.step_id, s);

        let s2 = current.id.clone();
        assert!(state.remove_slot(&s2));
        let current = state.current_slot().unwrap();
        assert_eq!(current.step_id, t);

        let t1 = current.id.clone();
        assert!(state.remove_slot(&t1));
        assert_eq!(state.current_slot_index(), None);
        assert!(!state.remove_slot(&t1));
    }

    #[test]
    fn add_variant_copies_current() {
        let mut state = ConfiguratorState::new();
        state.add_slot(Some("Frame"));
        state.add_object_to_current(&details("a"));
        state.set_object_transform(
            0,
            Transform {
                position: [1.0, 0.0, 0.0],
                ..Transform::IDENTITY
            },
        );
        let slot_id = state.slots()[0].id.clone();
        state.slot_mut(&slot_id).unwrap().objects[0].color_names = vec!["Crimson".into()];
        let base_step = state.steps()[0].id.clone();

        let copy = state.add_variant(None);
        assert_eq!(copy.name, "Variant 2");
        assert_ne!(copy.steps[0].id, base_step);
        assert_eq!(copy.slots[0].step_id, copy.steps[0].id);
        assert_eq!(copy.slots[0].objects[0].transform.position, [1.0, 0.0, 0.0]);
        assert_eq!(copy.slots[0].objects[0].color_names, vec!["Crimson".to_string()]);
        assert_eq!(state.current_variant_index(), 1);
        assert_eq!(state.current_slot_index(), Some(0));
        assert_eq!(state.current_step_index(), 0);
    }

    #[test]
    fn last_variant_cannot_be_deleted() {
        let mut state = ConfiguratorState::new();
        assert!(!state.delete_current_variant());
        state.add_variant(Some("B"));
        state.rename_current_variant("Bee");
        assert_eq!(state.current_variant().name, "Bee");
        assert!(state.delete_current_variant());
        assert_eq!(state.variants().len(), 1);
        assert_eq!(state.current_variant_index(), 0);
    }

    #[test]
    fn select_material_resets_cached_mesh() {
        let mut state = ConfiguratorState::new();
        let slot = state.add_slot(None).id.clone();
        state.add_object_to_current(&details("a"));
        state.add_object_to_current(&details("b"));
        state.slot_mut(&slot).unwrap().objects[0].mesh = Some(crate::MeshHandle::new(1u8));

        assert!(state.select_material(0, 1));
        let current = state.current_slot().unwrap();
        assert_eq!(current.selected_index(), Some(0));
        assert_eq!(current.objects[0].selected_material, 1);
        assert!(current.objects[0].mesh.is_none());
        assert!(!state.select_material(0, 5));
        assert!(!state.select_material(7, 0));
    }

    #[test]
    fn select_object_respects_can_be_empty() {
        let mut state = ConfiguratorState::new();
        let slot = state.add_slot(None).id.clone();
        state.add_object_to_current(&details("a"));
        assert!(!state.select_object(None));
        state.set_can_be_empty(&slot, true);
        assert!(state.select_object(None));
        assert!(state.current_slot().unwrap().selected_object().is_none());
    }

    #[test]
    fn slot_load_tickets_supersede() {
        let mut state = ConfiguratorState::new();
        let slot = state.add_slot(None).id.clone();
        assert!(state.begin_slot_load(&slot).is_none());

        state.add_object_to_current(&details("a"));
        let (first, request) = state.begin_slot_load(&slot).expect("load");
        assert_eq!(request.glb_url(), Some("a-red.glb"));
        let (second, _) = state.begin_slot_load(&slot).expect("load");
        assert!(!first.is_current());
        assert!(second.is_current());

        assert_eq!(state.toggle_slot_hidden(&slot), Some(true));
        assert!(!second.is_current());
        assert!(state.begin_slot_load(&slot).is_none());
    }

    #[test]
    fn object_edits_supersede_slot_loads() {
        let mut state = ConfiguratorState::new();
        let slot = state.add_slot(None).id.clone();
        state.add_object_to_current(&details("a"));
        state.add_object_to_current(&details("b"));

        let (ticket, request) = state.begin_slot_load(&slot).expect("load");
        assert_eq!(request.uuid, "b");
        assert!(state.select_object(Some(0)));
        assert!(!ticket.is_current());

        let (ticket, _) = state.begin_slot_load(&slot).expect("load");
        assert!(state.remove_object(1).is_some());
        assert!(!ticket.is_current());

        let (ticket, _) = state.begin_slot_load(&slot).expect("load");
        assert!(state.select_material(0, 1));
        assert!(!ticket.is_current());
        let (ticket, request) = state.begin_slot_load(&slot).expect("load");
        assert_eq!(request.glb_url(), Some("a-blue.glb"));

        assert!(state.add_object_to_current(&details("c")).is_some());
        assert!(!ticket.is_current());

        // Declined edits leave the running load alone.
        let (ticket, _) = state.begin_slot_load(&slot).expect("load");
        assert!(!state.select_object(Some(9)));
        assert!(state.remove_object(9).is_none());
        assert!(!state.select_material(0, 9));
        assert!(ticket.is_current());
    }

    #[test]
    fn environment_set_and_remove() {
        let mut state = ConfiguratorState::new();
        assert!(state.begin_environment_load().is_none());
        state.set_environment(&details("studio"));
        let (ticket, request) = state.begin_environment_load().expect("load");
        assert_eq!(request.uuid, "studio");
        assert!(state.remove_environment().is_some());
        assert!(!ticket.is_current());
        assert!(state.environment().is_none());
    }

    #[test]
    fn import_resets_pointers() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(details("a"));
        let json = r#"{
            "steps": {"late": {"name": "Late", "index": 1}, "early": {"name": "Early", "index": 0}},
            "slots": {
                "x": {"name": "X", "step": "late", "objects": [{"uuid": "a"}]},
                "y": {"name": "Y", "step": "early", "objects": [{"uuid": "a"}]}
            }
        }"#;

        let mut state = ConfiguratorState::new();
        state.add_variant(None);
        let report = tokio_test::block_on(state.import_json(json, &catalog)).unwrap();
        assert_eq!(report.variants, 1);
        assert_eq!(state.current_variant_index(), 0);
        assert_eq!(state.current_step().unwrap().id, "early");
        assert_eq!(state.current_slot().unwrap().id, "y");
    }

    #[test]
    fn malformed_import_keeps_model() {
        let catalog = MemoryCatalog::new();
        let mut state = ConfiguratorState::new();
        state.add_slot(Some("Keep"));
        assert!(tokio_test::block_on(state.import_json("{", &catalog)).is_err());
        assert_eq!(state.slots()[0].name, "Keep");
    }
}
