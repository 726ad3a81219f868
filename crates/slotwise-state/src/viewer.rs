//! Viewer state: playback of a saved configuration.
//!
//! The loaded variants are kept as a read-only library. [`ViewerState::set_variant`]
//! copies one of them into a working view whose slots track the shopper's
//! selection and the meshes currently on screen. Nothing here is ever written
//! back to a document.

use slotwise_catalog::Catalog;
use slotwise_ir::ConfigDocument;

use crate::hydrate::{hydrate, ImportReport};
use crate::loads::{LoadKey, LoadTicket, LoadTokens};
use crate::model::{MeshHandle, PlacedObject, Slot, Step, Variant, ViewPoint};
use crate::render::RenderRequest;
use crate::Result;

/// Outcome of [`ViewerState::begin_mesh_load`].
#[derive(Debug, Clone)]
pub enum MeshLoad {
    /// The mesh for this object and material is already loaded.
    Cached(MeshHandle),
    /// Load `request`, then hand the mesh back with `ticket`.
    Pending {
        ticket: LoadTicket,
        request: RenderRequest,
    },
}

/// Read-mostly state behind the shopper-facing viewer.
#[derive(Debug, Default)]
pub struct ViewerState {
    variants: Vec<Variant>,
    current_variant: usize,
    steps: Vec<Step>,
    slots: Vec<Slot>,
    /// Mesh on screen per working slot, parallel to `slots`.
    shown: Vec<Option<MeshHandle>>,
    current_step: usize,
    view_point: ViewPoint,
    environment: Option<PlacedObject>,
    loads: LoadTokens,
}

impl ViewerState {
    /// An empty viewer; load a configuration before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a document's content and show its first
    /// variant. Unresolvable objects are dropped.
    pub async fn load_config<C: Catalog + ?Sized>(&mut self, doc: ConfigDocument, catalog: &C) -> ImportReport {
        let hydrated = hydrate(doc, catalog).await;
        self.loads.clear();
        self.variants = hydrated.variants;
        self.environment = hydrated.environment;
        self.set_variant(0);
        hydrated.report
    }

    /// Parse and load a JSON document.
    pub async fn load_json<C: Catalog + ?Sized>(&mut self, json: &str, catalog: &C) -> Result<ImportReport> {
        let doc = ConfigDocument::from_json(json)?;
        Ok(self.load_config(doc, catalog).await)
    }

    /// Loaded variants.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Position of the variant in the working view.
    pub fn current_variant_index(&self) -> usize {
        self.current_variant
    }

    /// Show another variant.
    ///
    /// Copies its steps, slots and view point into the working view without
    /// cached meshes, and returns to the first step. Pending slot loads go
    /// stale. Out of range is a no-op.
    pub fn set_variant(&mut self, index: usize) -> bool {
        let Some(variant) = self.variants.get(index) else {
            return false;
        };
        self.steps = variant.steps.clone();
        self.slots = variant.slots.iter().map(Slot::detached).collect();
        self.shown = vec![None; self.slots.len()];
        self.view_point = variant.view_point;
        self.current_variant = index;
        self.current_step = 0;
        self.loads.forget_slots();
        tracing::debug!(variant = index, slots = self.slots.len(), "viewer variant shown");
        true
    }

    /// Steps of the working view.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Slots of the working view.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Position of the active step.
    pub fn current_step_index(&self) -> usize {
        self.current_step
    }

    /// The active step; `None` before anything is loaded.
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current_step)
    }

    /// Move to another step.
    pub fn set_step(&mut self, index: usize) -> bool {
        if index >= self.steps.len() {
            return false;
        }
        self.current_step = index;
        true
    }

    /// Slots of the active step with their positions in [`slots`](Self::slots).
    pub fn slots_in_current_step(&self) -> Vec<(usize, &Slot)> {
        let Some(step) = self.current_step() else {
            return Vec::new();
        };
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.step_id == step.id)
            .collect()
    }

    /// Camera settings of the working view.
    pub fn view_point(&self) -> &ViewPoint {
        &self.view_point
    }

    /// The environment asset.
    pub fn environment(&self) -> Option<&PlacedObject> {
        self.environment.as_ref()
    }

    /// Mesh currently shown for a slot.
    pub fn shown_mesh(&self, slot: usize) -> Option<&MeshHandle> {
        self.shown.get(slot)?.as_ref()
    }

    /// Change what a slot shows.
    ///
    /// `object = None` clears the slot and is only accepted when it may be
    /// empty. `material` applies to the chosen object; changing it discards
    /// the object's cached mesh. On success the slot's on-screen mesh is
    /// taken down and any load in flight for it goes stale; follow up with
    /// [`begin_mesh_load`](Self::begin_mesh_load).
    pub fn select_object(&mut self, slot: usize, object: Option<usize>, material: Option<usize>) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            return false;
        };
        if let (Some(o), Some(m)) = (object, material) {
            let valid = target.objects.get(o).is_some_and(|obj| m < obj.materials.len());
            if !valid {
                return false;
            }
        }
        if !target.select(object) {
            return false;
        }
        if let (Some(obj), Some(m)) = (target.selected_object_mut(), material) {
            if obj.selected_material != m {
                obj.selected_material = m;
                obj.mesh = None;
            }
        }
        let key = LoadKey::Slot(target.id.clone());
        self.shown[slot] = None;
        self.loads.invalidate(&key);
        true
    }

    /// Start showing a slot's selected object.
    ///
    /// Returns the cached mesh when the object already has one (it becomes the
    /// slot's shown mesh at once), otherwise a ticket and the request to load.
    /// `None` when the slot is unknown or shows nothing.
    pub fn begin_mesh_load(&mut self, slot: usize) -> Option<MeshLoad> {
        let target = self.slots.get(slot)?;
        let object = target.selected_object()?;
        if let Some(mesh) = object.mesh.clone() {
            self.shown[slot] = Some(mesh.clone());
            return Some(MeshLoad::Cached(mesh));
        }
        let request = object.render_request();
        let ticket = self.loads.issue(LoadKey::Slot(target.id.clone()));
        Some(MeshLoad::Pending { ticket, request })
    }

    /// Start showing the environment.
    pub fn begin_environment_load(&mut self) -> Option<MeshLoad> {
        let env = self.environment.as_ref()?;
        if let Some(mesh) = env.mesh.clone() {
            return Some(MeshLoad::Cached(mesh));
        }
        let request = env.render_request();
        let ticket = self.loads.issue(LoadKey::Environment);
        Some(MeshLoad::Pending { ticket, request })
    }

    /// Hand back a loaded mesh.
    ///
    /// Stale tickets are ignored and return `false`; the caller should drop
    /// the mesh. Otherwise the mesh is cached on the object and, for slots,
    /// becomes the shown mesh.
    pub fn finish_mesh_load(&mut self, ticket: &LoadTicket, mesh: MeshHandle) -> bool {
        if !ticket.is_current() {
            tracing::trace!(key = ?ticket.key(), generation = ticket.generation(), "stale mesh load discarded");
            return false;
        }
        match ticket.key() {
            LoadKey::Environment => match self.environment.as_mut() {
                Some(env) => {
                    env.mesh = Some(mesh);
                    true
                }
                None => false,
            },
            LoadKey::Slot(id) => {
                let Some(pos) = self.slots.iter().position(|s| s.id == *id) else {
                    return false;
                };
                let Some(object) = self.slots[pos].selected_object_mut() else {
                    return false;
                };
                object.mesh = Some(mesh.clone());
                self.shown[pos] = Some(mesh);
                true
            }
        }
    }

    /// What to render for every slot that shows something, in slot order.
    pub fn render_requests(&self) -> Vec<(usize, RenderRequest)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.selected_object().map(|o| (i, o.render_request())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotwise_catalog::{Material, MemoryCatalog, ObjectDetails};

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for uuid in ["sofa", "chair", "room"] {
            catalog.insert(ObjectDetails::new(
                uuid,
                uuid,
                vec![
                    Material(json!({"name": "Linen", "native": {"glbUrl": format!("{uuid}-linen.glb")}})),
                    Material(json!({"name": "Velvet", "native": {"glbUrl": format!("{uuid}-velvet.glb")}})),
                ],
            ));
        }
        catalog
    }

    const DOC: &str = r#"{
        "version": 2,
        "variants": {
            "v1": {
                "name": "Living",
                "steps": {"s1": {"name": "Seating", "index": 0}, "s2": {"name": "Extras", "index": 1}},
                "slots": {
                    "a": {"name": "Sofa", "step": "s1", "objects": [{"uuid": "sofa"}, {"uuid": "chair"}]},
                    "b": {"name": "Chair", "step": "s2", "canBeEmpty": true, "objects": [{"uuid": "chair"}]}
                },
                "viewPoint": {"enabled": true, "maxDistance": 9}
            },
            "v2": {"slots": {"c": {"objects": [{"uuid": "ghost"}]}}}
        },
        "environment": {"uuid": "room"}
    }"#;

    fn loaded() -> ViewerState {
        let mut viewer = ViewerState::new();
        tokio_test::block_on(viewer.load_json(DOC, &catalog())).unwrap();
        viewer
    }

    #[test]
    fn load_shows_first_variant() {
        let viewer = loaded();
        assert_eq!(viewer.variants().len(), 2);
        assert_eq!(viewer.variants()[1].name, "Variant 2");
        assert_eq!(viewer.current_step().unwrap().name, "Seating");
        assert!(viewer.view_point().enabled);
        assert_eq!(viewer.view_point().max_distance, 9.0);
        assert!(viewer.environment().is_some());

        let names: Vec<_> = viewer.slots_in_current_step().iter().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sofa"]);
        assert_eq!(viewer.slots()[1].selected_index(), None);
    }

    #[test]
    fn set_variant_resets_step() {
        let mut viewer = loaded();
        assert!(viewer.set_step(1));
        assert!(!viewer.set_step(2));
        assert!(viewer.set_variant(1));
        assert_eq!(viewer.current_step_index(), 0);
        assert_eq!(viewer.slots()[0].objects.len(), 0);
        assert!(!viewer.view_point().enabled);
        assert!(!viewer.set_variant(5));
        assert_eq!(viewer.current_variant_index(), 1);
    }

    #[test]
    fn mesh_is_cached_per_object() {
        let mut viewer = loaded();
        let Some(MeshLoad::Pending { ticket, request }) = viewer.begin_mesh_load(0) else {
            panic!("expected a pending load");
        };
        assert_eq!(request.glb_url(), Some("sofa-linen.glb"));
        assert!(viewer.finish_mesh_load(&ticket, MeshHandle::new("sofa-mesh")));
        assert!(viewer.shown_mesh(0).is_some());

        // Re-selecting the same object reuses its mesh.
        assert!(viewer.select_object(0, Some(0), None));
        assert!(viewer.shown_mesh(0).is_none());
        match viewer.begin_mesh_load(0) {
            Some(MeshLoad::Cached(mesh)) => assert_eq!(mesh.downcast_ref::<&str>(), Some(&"sofa-mesh")),
            other => panic!("expected cached mesh, got {other:?}"),
        }

        // A different material needs a fresh load.
        assert!(viewer.select_object(0, Some(0), Some(1)));
        assert!(matches!(viewer.begin_mesh_load(0), Some(MeshLoad::Pending { .. })));
    }

    #[test]
    fn superseded_load_is_discarded() {
        let mut viewer = loaded();
        let Some(MeshLoad::Pending { ticket: old, .. }) = viewer.begin_mesh_load(0) else {
            panic!("expected a pending load");
        };
        assert!(viewer.select_object(0, Some(1), None));
        let Some(MeshLoad::Pending { ticket: new, request }) = viewer.begin_mesh_load(0) else {
            panic!("expected a pending load");
        };
        assert_eq!(request.uuid, "chair");

        assert!(viewer.finish_mesh_load(&new, MeshHandle::new(2u8)));
        assert!(!viewer.finish_mesh_load(&old, MeshHandle::new(1u8)));
        assert_eq!(viewer.shown_mesh(0).and_then(|m| m.downcast_ref::<u8>()), Some(&2));
        assert!(viewer.slots()[0].objects[0].mesh.is_none());
    }

    #[test]
    fn select_object_validation() {
        let mut viewer = loaded();
        assert!(!viewer.select_object(0, None, None), "sofa slot may not be empty");
        assert!(!viewer.select_object(0, Some(9), None));
        assert!(!viewer.select_object(0, Some(0), Some(9)));
        assert!(!viewer.select_object(7, Some(0), None));
        assert!(viewer.select_object(1, Some(0), None));
        assert!(viewer.select_object(1, None, None));
        assert!(viewer.begin_mesh_load(1).is_none());
    }

    #[test]
    fn render_requests_cover_selected_slots() {
        let viewer = loaded();
        let requests = viewer.render_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, 0);
        assert_eq!(requests[0].1.uuid, "sofa");
    }

    #[test]
    fn environment_load() {
        let mut viewer = loaded();
        let Some(MeshLoad::Pending { ticket, request }) = viewer.begin_environment_load() else {
            panic!("expected a pending load");
        };
        assert_eq!(request.glb_url(), Some("room-linen.glb"));
        assert!(viewer.finish_mesh_load(&ticket, MeshHandle::new(())));
        assert!(matches!(viewer.begin_environment_load(), Some(MeshLoad::Cached(_))));
    }
}
