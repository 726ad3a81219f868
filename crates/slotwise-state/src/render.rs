//! Hand-off to the rendering collaborator.

use slotwise_catalog::Material;

use crate::model::Transform;

/// Everything a renderer needs to show one placed object.
///
/// Resolving the mesh reference into a renderable asset is the renderer's
/// job. Rotation is in degrees; use [`Transform::rotation_radians`] for
/// engines that expect radians.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub uuid: String,
    pub materials: Vec<Material>,
    pub selected_material: usize,
    pub transform: Transform,
}

impl RenderRequest {
    /// The selected material.
    pub fn material(&self) -> Option<&Material> {
        self.materials.get(self.selected_material)
    }

    /// Mesh URL of the selected material.
    pub fn glb_url(&self) -> Option<&str> {
        self.material().and_then(Material::glb_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn glb_url_follows_selected_material() {
        let mut req = RenderRequest {
            uuid: "u".into(),
            materials: vec![
                Material(json!({"native": {"glbUrl": "a.glb"}})),
                Material(json!({"name": "no mesh"})),
            ],
            selected_material: 0,
            transform: Transform::IDENTITY,
        };
        assert_eq!(req.glb_url(), Some("a.glb"));
        req.selected_material = 1;
        assert_eq!(req.glb_url(), None);
        req.selected_material = 9;
        assert!(req.material().is_none());
    }
}
