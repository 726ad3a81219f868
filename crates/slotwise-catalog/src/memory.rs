//! In-memory catalog.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::details::ObjectDetails;
use crate::error::{CatalogError, Result};
use crate::Catalog;

/// A uuid-keyed catalog held in memory.
///
/// Used for offline tooling and tests. The JSON form is either an object
/// keyed by UUID or an array of details each carrying its own `uuid`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    objects: HashMap<String, ObjectDetails>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object. Details without a `uuid` are ignored.
    pub fn insert(&mut self, details: ObjectDetails) {
        match details.uuid.clone() {
            Some(uuid) => {
                self.objects.insert(uuid, details);
            }
            None => tracing::warn!(name = %details.name, "catalog entry without uuid ignored"),
        }
    }

    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        match value {
            Value::Object(map) => {
                for (uuid, entry) in map {
                    let mut details: ObjectDetails = serde_json::from_value(entry)?;
                    details.uuid = Some(uuid);
                    catalog.insert(details);
                }
            }
            Value::Array(items) => {
                for entry in items {
                    catalog.insert(serde_json::from_value(entry)?);
                }
            }
            _ => {
                return Err(CatalogError::Unavailable(
                    "catalog file must be a JSON object or array".into(),
                ))
            }
        }
        tracing::debug!(objects = catalog.len(), "catalog parsed");
        Ok(catalog)
    }

    /// Read a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether an object with this UUID exists.
    pub fn contains(&self, uuid: &str) -> bool {
        self.objects.contains_key(uuid)
    }
}

impl Catalog for MemoryCatalog {
    async fn fetch_details(&self, uuid: &str) -> Result<ObjectDetails> {
        self.objects
            .get(uuid)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(uuid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_form() {
        let catalog = MemoryCatalog::from_json(
            r#"{"a": {"name": "Chair", "materials": [{"name": "Oak"}]}, "b": {"name": "Table"}}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let chair = tokio_test::block_on(catalog.fetch_details("a")).unwrap();
        assert_eq!(chair.uuid.as_deref(), Some("a"));
        assert_eq!(chair.material_names(), vec!["Oak".to_string()]);
    }

    #[test]
    fn array_form_skips_entries_without_uuid() {
        let catalog =
            MemoryCatalog::from_json(r#"[{"uuid": "a", "name": "Chair"}, {"name": "Orphan"}]"#)
                .unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("a"));
    }

    #[test]
    fn missing_uuid_is_not_found() {
        let catalog = MemoryCatalog::new();
        let err = tokio_test::block_on(catalog.fetch_details("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref id) if id == "nope"));
    }

    #[test]
    fn rejects_scalar_file() {
        assert!(MemoryCatalog::from_json("42").is_err());
    }
}
