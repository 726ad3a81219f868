//! Document to model: resolve every object reference through the catalog and
//! apply the defaulting rules.
//!
//! Hydration is all-or-nothing for variants and slots but best-effort for
//! object references: an object whose UUID the catalog cannot resolve is left
//! out and the rest of the configuration loads normally.

use std::collections::HashSet;

use slotwise_catalog::{resolve_details, Catalog};
use slotwise_ir::{ConfigDocument, EnvironmentRecord, ObjectRecord, StepEntries, VariantRecord};

use crate::model::{new_id, PlacedObject, Slot, Step, Transform, Variant, ViewPoint, DEFAULT_SLOT_NAME, DEFAULT_STEP_NAME};

/// Outcome of loading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub variants: usize,
    pub steps: usize,
    pub slots: usize,
    /// Objects that resolved and were placed.
    pub objects: usize,
    /// Object references dropped because the catalog could not resolve them.
    pub dropped: usize,
    /// Whether a referenced environment was dropped.
    pub environment_dropped: bool,
}

pub(crate) struct Hydrated {
    pub variants: Vec<Variant>,
    pub environment: Option<PlacedObject>,
    pub report: ImportReport,
}

/// Resolve a whole document. Object lookups run one after another in
/// document order.
pub(crate) async fn hydrate<C: Catalog + ?Sized>(doc: ConfigDocument, catalog: &C) -> Hydrated {
    let parts = doc.into_parts();
    let mut report = ImportReport::default();

    let mut variants = Vec::with_capacity(parts.variants.len());
    for (i, (id, record)) in parts.variants.into_iter().enumerate() {
        let fallback = format!("Variant {}", i + 1);
        let variant = hydrate_variant(id, record, fallback, catalog, &mut report).await;
        report.steps += variant.steps.len();
        report.slots += variant.slots.len();
        variants.push(variant);
    }
    if variants.is_empty() {
        variants.push(Variant::new(slotwise_ir::DEFAULT_VARIANT_NAME));
    }
    report.variants = variants.len();

    let environment = match parts.environment {
        Some(record) => {
            let env = resolve_environment(&record, catalog).await;
            report.environment_dropped = env.is_none();
            env
        }
        None => None,
    };

    tracing::debug!(
        variants = report.variants,
        slots = report.slots,
        objects = report.objects,
        dropped = report.dropped,
        "configuration hydrated"
    );

    Hydrated {
        variants,
        environment,
        report,
    }
}

async fn hydrate_variant<C: Catalog + ?Sized>(
    id: Option<String>,
    record: VariantRecord,
    fallback_name: String,
    catalog: &C,
    report: &mut ImportReport,
) -> Variant {
    let steps = steps_from_entries(&record.steps);
    let first_step = steps[0].id.clone();

    let mut slots = Vec::with_capacity(record.slots.len());
    for (slot_id, slot_record) in record.slots {
        let step_id = slot_record
            .step_ref()
            .filter(|r| steps.iter().any(|s| s.id == *r))
            .map_or_else(|| first_step.clone(), str::to_string);
        let name = slot_record
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_SLOT_NAME.to_string());

        let mut slot = Slot::with_id(slot_id, name, step_id);
        slot.can_be_empty = slot_record.can_be_empty;
        slot.text_buttons = slot_record.text_buttons;
        for object in &slot_record.objects {
            match resolve_object(object, catalog).await {
                Some(placed) => {
                    slot.objects.push(placed);
                    report.objects += 1;
                }
                None => report.dropped += 1,
            }
        }
        slot.reset_selection();
        slots.push(slot);
    }

    Variant {
        id: id.unwrap_or_else(new_id),
        name: record.name.unwrap_or(fallback_name),
        steps,
        slots,
        view_point: record
            .view_point
            .as_ref()
            .map(ViewPoint::from)
            .unwrap_or_default(),
    }
}

/// Steps in wizard order with ids assigned; never empty.
fn steps_from_entries(entries: &StepEntries) -> Vec<Step> {
    let mut seen = HashSet::new();
    let mut steps: Vec<Step> = entries
        .normalized()
        .into_iter()
        .map(|rec| {
            let id = rec
                .id
                .filter(|id| seen.insert(id.clone()))
                .unwrap_or_else(new_id);
            Step {
                id,
                name: rec.name.unwrap_or_else(|| DEFAULT_STEP_NAME.to_string()),
                index: rec.index.unwrap_or(0),
            }
        })
        .collect();
    if steps.is_empty() {
        steps.push(Step::new(DEFAULT_STEP_NAME, 0));
    }
    steps
}

async fn resolve_object<C: Catalog + ?Sized>(record: &ObjectRecord, catalog: &C) -> Option<PlacedObject> {
    let Some(uuid) = record.uuid.as_deref().filter(|u| !u.is_empty()) else {
        tracing::warn!("object reference without uuid dropped");
        return None;
    };
    let details = resolve_details(catalog, uuid).await?;
    let mut placed = PlacedObject::from_details(uuid, &details);
    placed.transform = Transform::from_parts(record.position, record.rotation, record.scale);
    if let Some(names) = record.color_name_overrides() {
        placed.color_names = names.to_vec();
    }
    Some(placed)
}

async fn resolve_environment<C: Catalog + ?Sized>(
    record: &EnvironmentRecord,
    catalog: &C,
) -> Option<PlacedObject> {
    let uuid = record.uuid.as_deref().filter(|u| !u.is_empty())?;
    let details = resolve_details(catalog, uuid).await?;
    let mut placed = PlacedObject::from_details(uuid, &details);
    placed.transform = Transform::from_parts(record.position, record.rotation, record.scale);
    Some(placed)
}
