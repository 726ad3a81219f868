//! Persisted document schema for slotwise product configurations.
//!
//! A configuration document is a reference graph, not a content snapshot: it
//! stores variants, wizard steps, slots and, per placed object, only the
//! catalog UUID and its transform. Everything else (names, materials, mesh
//! URLs) is re-fetched from the catalog when the document is loaded.
//!
//! Two shapes exist on the wire:
//!
//! - **Versioned** (`"version": 2`): a `variants` object keyed by variant id,
//!   each variant owning its own `steps`, `slots` and `viewPoint`, plus an
//!   optional global `environment`.
//! - **Legacy** (implicitly version 1): `steps`, `slots`, `viewPoint` and
//!   `environment` at the top level, describing a single variant.
//!
//! The shape is decided by the presence of a `variants` key, see
//! [`ConfigDocument::from_value`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

mod de;
mod keyed;

pub use keyed::KeyedList;

/// Version written by [`VersionedDocument`].
pub const DOCUMENT_VERSION: u32 = 2;

/// Implicit version of documents without a `variants` key.
pub const LEGACY_VERSION: u32 = 1;

/// Name given to the single variant of an upgraded legacy document.
pub const DEFAULT_VARIANT_NAME: &str = "Variant 1";

/// Three components: position, Euler XYZ rotation in degrees, or scale.
pub type Vec3 = [f64; 3];

/// Errors from reading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input is not valid JSON or a field has an incompatible type.
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not a JSON object.
    #[error("document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A wizard step as stored on the wire.
///
/// In the keyed form the id is the map key and `id` is absent; in the array
/// form the id (if any) lives in the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step id in the array form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wizard position; lower comes first.
    #[serde(
        default,
        deserialize_with = "de::lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub index: Option<i64>,
}

/// The `steps` section, either keyed by step id or as a plain array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepEntries {
    /// `{ "<stepId>": { "name": ..., "index": ... } }`
    Keyed(KeyedList<StepRecord>),
    /// `[ { "id": ..., "name": ..., "index": ... } ]`
    Listed(Vec<StepRecord>),
}

impl Default for StepEntries {
    fn default() -> Self {
        Self::Keyed(KeyedList::new())
    }
}

impl StepEntries {
    /// Number of step entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Keyed(list) => list.len(),
            Self::Listed(list) => list.len(),
        }
    }

    /// Whether there are no step entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten to records with names and indices filled in, sorted by index.
    ///
    /// A missing name becomes `Step <n>` and a missing index becomes the
    /// zero-based position, both taken from document order. The sort is stable
    /// so steps sharing an index keep their document order. Ids stay `None`
    /// when the document has none; the caller assigns fresh ones.
    pub fn normalized(&self) -> Vec<StepRecord> {
        let records: Vec<(Option<String>, &StepRecord)> = match self {
            Self::Keyed(list) => list
                .iter()
                .map(|(id, rec)| (Some(id.to_string()), rec))
                .collect(),
            Self::Listed(list) => list.iter().map(|rec| (rec.id.clone(), rec)).collect(),
        };

        let mut steps: Vec<StepRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, (id, rec))| StepRecord {
                id: id.filter(|id| !id.is_empty()),
                name: Some(rec.name.clone().unwrap_or_else(|| format!("Step {}", i + 1))),
                index: Some(rec.index.unwrap_or(i as i64)),
            })
            .collect();
        steps.sort_by_key(|s| s.index.unwrap_or(0));
        steps
    }
}

/// A placed object reference: catalog UUID plus transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Catalog UUID of the placed object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Position in scene units.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Vec3>,
    /// Euler XYZ rotation in degrees.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub rotation: Option<Vec3>,
    /// Per-axis scale factor.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub scale: Option<Vec3>,
    /// Per-material display name overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_names: Option<Vec<String>>,
    /// Older name for `colorNames`; read but never written.
    #[serde(default, skip_serializing)]
    pub variation_names: Option<Vec<String>>,
}

impl ObjectRecord {
    /// Color-name overrides, preferring `colorNames` over `variationNames`.
    pub fn color_name_overrides(&self) -> Option<&[String]> {
        self.color_names
            .as_deref()
            .or(self.variation_names.as_deref())
    }
}

/// A slot as stored on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the slot may show nothing.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub can_be_empty: bool,
    /// Show object choices as text instead of thumbnails.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub text_buttons: bool,
    /// Owning step id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Older name for `step`; read but never written.
    #[serde(default, skip_serializing)]
    pub step_id: Option<String>,
    /// Interchangeable objects in display order.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub objects: Vec<ObjectRecord>,
}

impl SlotRecord {
    /// The referenced step id, preferring `step` over `stepId`.
    pub fn step_ref(&self) -> Option<&str> {
        self.step
            .as_deref()
            .or(self.step_id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Camera constraint descriptor.
///
/// Angular clamps are in degrees; zero means unconstrained, as do zero
/// distances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPointRecord {
    /// Camera position.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Vec3>,
    /// Camera rotation in degrees.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub rotation: Option<Vec3>,
    /// Leftward orbit limit.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub left: f64,
    /// Rightward orbit limit.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub right: f64,
    /// Downward orbit limit.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub down: f64,
    /// Upward orbit limit.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub up: f64,
    /// Closest zoom distance.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub min_distance: f64,
    /// Farthest zoom distance.
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub max_distance: f64,
    /// Apply these constraints.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub enabled: bool,
    /// Hide the anchor gizmo in the editor.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub hidden: bool,
    /// Allow panning while this view is active.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub allow_movement: bool,
}

/// The staging/background asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    /// Catalog UUID of the environment asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Position in scene units.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Vec3>,
    /// Euler XYZ rotation in degrees.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub rotation: Option<Vec3>,
    /// Per-axis scale factor.
    #[serde(
        default,
        deserialize_with = "de::lenient_vec3",
        skip_serializing_if = "Option::is_none"
    )]
    pub scale: Option<Vec3>,
}

/// One variant of a versioned document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wizard steps.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub steps: StepEntries,
    /// Slots keyed by slot id.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub slots: KeyedList<SlotRecord>,
    /// Camera constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_point: Option<ViewPointRecord>,
    /// Per-variant environment written by older revisions; never written.
    #[serde(default, skip_serializing)]
    pub environment: Option<EnvironmentRecord>,
}

/// The legacy single-variant shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    /// Wizard steps.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub steps: StepEntries,
    /// Slots keyed by slot id.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub slots: KeyedList<SlotRecord>,
    /// Camera constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_point: Option<ViewPointRecord>,
    /// Environment asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentRecord>,
}

/// The multi-variant shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedDocument {
    /// Schema version.
    #[serde(default = "default_version", deserialize_with = "version_or_default")]
    pub version: u32,
    /// Variants keyed by variant id.
    pub variants: KeyedList<VariantRecord>,
    /// Environment shared by all variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentRecord>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

fn version_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(de::lenient_index(deserializer)?
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DOCUMENT_VERSION))
}

impl Default for VersionedDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            variants: KeyedList::new(),
            environment: None,
        }
    }
}

impl VersionedDocument {
    /// Create an empty version-2 document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Either accepted document shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDocument {
    /// Top-level `steps`/`slots`, no `variants` key.
    Legacy(LegacyDocument),
    /// `variants` keyed by variant id.
    Versioned(VersionedDocument),
}

/// A document broken into hydration input: variants in document order with
/// their ids (absent for legacy documents) and the global environment.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentParts {
    /// Variant ids and records in document order.
    pub variants: Vec<(Option<String>, VariantRecord)>,
    /// The global environment.
    pub environment: Option<EnvironmentRecord>,
}

/// Counts for a quick look at a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Schema version.
    pub version: u32,
    /// Whether the document uses the legacy shape.
    pub legacy: bool,
    /// Per-variant counts in document order.
    pub variants: Vec<VariantSummary>,
    /// Whether an environment is present.
    pub has_environment: bool,
}

/// Counts for one variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSummary {
    /// Display name, or the default for unnamed variants.
    pub name: String,
    /// Step entries.
    pub steps: usize,
    /// Slots.
    pub slots: usize,
    /// Object references across all slots.
    pub objects: usize,
}

impl ConfigDocument {
    /// Parse a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Interpret a JSON value as a document.
    ///
    /// A non-null `variants` key selects the versioned shape; anything else
    /// is read as a legacy single-variant document.
    pub fn from_value(value: Value) -> Result<Self> {
        let is_versioned = match &value {
            Value::Object(map) => map.get("variants").is_some_and(|v| !v.is_null()),
            other => return Err(DocumentError::NotAnObject(json_kind(other))),
        };
        if is_versioned {
            Ok(Self::Versioned(serde_json::from_value(value)?))
        } else {
            Ok(Self::Legacy(serde_json::from_value(value)?))
        }
    }

    /// Whether this is the legacy single-variant shape.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Schema version: the stored `version` field, or 1 for legacy documents.
    pub fn version(&self) -> u32 {
        match self {
            Self::Legacy(_) => LEGACY_VERSION,
            Self::Versioned(doc) => doc.version,
        }
    }

    /// Split into variants and the global environment.
    ///
    /// The environment is global to the project. When a versioned document has
    /// none at the top level, the first variant-level environment (an older
    /// revision's placement) is promoted.
    pub fn into_parts(self) -> DocumentParts {
        match self {
            Self::Legacy(doc) => DocumentParts {
                variants: vec![(
                    None,
                    VariantRecord {
                        name: Some(DEFAULT_VARIANT_NAME.to_string()),
                        steps: doc.steps,
                        slots: doc.slots,
                        view_point: doc.view_point,
                        environment: None,
                    },
                )],
                environment: doc.environment,
            },
            Self::Versioned(doc) => {
                let mut environment = doc.environment;
                let variants = doc
                    .variants
                    .into_iter()
                    .map(|(id, mut variant)| {
                        let local = variant.environment.take();
                        if environment.is_none() {
                            environment = local;
                        }
                        (Some(id), variant)
                    })
                    .collect();
                DocumentParts {
                    variants,
                    environment,
                }
            }
        }
    }

    /// Convert to the version-2 shape without consulting a catalog.
    ///
    /// A legacy document becomes a single variant named "Variant 1" under a
    /// fresh id.
    pub fn into_versioned(self) -> VersionedDocument {
        let parts = self.into_parts();
        let variants = parts
            .variants
            .into_iter()
            .map(|(id, variant)| {
                let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                (id, variant)
            })
            .collect();
        VersionedDocument {
            version: DOCUMENT_VERSION,
            variants,
            environment: parts.environment,
        }
    }

    /// Count variants, steps, slots and object references.
    pub fn summary(&self) -> DocumentSummary {
        let summarize = |name: &str, steps: &StepEntries, slots: &KeyedList<SlotRecord>| {
            VariantSummary {
                name: name.to_string(),
                steps: steps.len(),
                slots: slots.len(),
                objects: slots.values().map(|s| s.objects.len()).sum(),
            }
        };

        match self {
            Self::Legacy(doc) => DocumentSummary {
                version: LEGACY_VERSION,
                legacy: true,
                variants: vec![summarize(DEFAULT_VARIANT_NAME, &doc.steps, &doc.slots)],
                has_environment: doc.environment.is_some(),
            },
            Self::Versioned(doc) => DocumentSummary {
                version: doc.version,
                legacy: false,
                variants: doc
                    .variants
                    .values()
                    .enumerate()
                    .map(|(i, v)| {
                        let fallback = format!("Variant {}", i + 1);
                        summarize(v.name.as_deref().unwrap_or(&fallback), &v.steps, &v.slots)
                    })
                    .collect(),
                has_environment: doc.environment.is_some()
                    || doc.variants.values().any(|v| v.environment.is_some()),
            },
        }
    }
}

impl Serialize for ConfigDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Legacy(doc) => doc.serialize(serializer),
            Self::Versioned(doc) => doc.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
