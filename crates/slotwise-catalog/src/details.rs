//! Object and material metadata as returned by the catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An appearance variant of a catalog object.
///
/// The shape belongs to the catalog service; it is carried through untouched.
/// Accessors read the few fields the configurator needs and return `None`
/// when they are missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(pub Value);

impl Material {
    /// Display name.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Downloadable GLB mesh URL (`native.glbUrl`).
    pub fn glb_url(&self) -> Option<&str> {
        self.0
            .get("native")
            .and_then(|n| n.get("glbUrl"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Thumbnail for pickers: the first preview's small rendition, else its
    /// full-size URL.
    pub fn preview_url(&self) -> Option<&str> {
        let preview = self.0.get("previews")?.as_array()?.first()?;
        preview
            .get("subRes")
            .and_then(|s| s.get("small"))
            .and_then(Value::as_str)
            .or_else(|| preview.get("url").and_then(Value::as_str))
    }
}

impl From<Value> for Material {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Full metadata for one catalog object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectDetails {
    /// Catalog identifier, when the service echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Appearance variants, in catalog order.
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectDetails {
    /// Create details with a name and materials.
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, materials: Vec<Material>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            name: name.into(),
            materials,
            extra: Map::new(),
        }
    }

    /// Material display names in order, empty strings where a name is missing.
    pub fn material_names(&self) -> Vec<String> {
        self.materials
            .iter()
            .map(|m| m.name().unwrap_or_default().to_string())
            .collect()
    }
}
