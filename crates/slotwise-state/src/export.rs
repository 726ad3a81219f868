//! Model to document.
//!
//! Only references and placement are written; catalog metadata is re-fetched
//! on load.

use slotwise_ir::{
    EnvironmentRecord, KeyedList, ObjectRecord, SlotRecord, StepEntries, StepRecord,
    VariantRecord, VersionedDocument, ViewPointRecord,
};

use crate::model::{PlacedObject, Slot, Variant};

/// Build the version-2 document for a set of variants and the environment.
pub(crate) fn export_document(variants: &[Variant], environment: Option<&PlacedObject>) -> VersionedDocument {
    let mut doc = VersionedDocument::new();
    for variant in variants {
        doc.variants.insert(variant.id.clone(), variant_record(variant));
    }
    doc.environment = environment.map(environment_record);
    doc
}

fn variant_record(variant: &Variant) -> VariantRecord {
    let steps: KeyedList<StepRecord> = variant
        .steps
        .iter()
        .map(|s| {
            (
                s.id.clone(),
                StepRecord {
                    id: None,
                    name: Some(s.name.clone()),
                    index: Some(s.index),
                },
            )
        })
        .collect();
    let slots: KeyedList<SlotRecord> = variant
        .slots
        .iter()
        .map(|s| (s.id.clone(), slot_record(s)))
        .collect();

    VariantRecord {
        name: Some(variant.name.clone()),
        steps: StepEntries::Keyed(steps),
        slots,
        view_point: Some(ViewPointRecord::from(&variant.view_point)),
        environment: None,
    }
}

fn slot_record(slot: &Slot) -> SlotRecord {
    SlotRecord {
        name: Some(slot.name.clone()),
        can_be_empty: slot.can_be_empty,
        text_buttons: slot.text_buttons,
        step: Some(slot.step_id.clone()),
        step_id: None,
        objects: slot.objects.iter().map(object_record).collect(),
    }
}

fn object_record(object: &PlacedObject) -> ObjectRecord {
    ObjectRecord {
        uuid: Some(object.uuid.clone()),
        position: Some(object.transform.position),
        rotation: Some(object.transform.rotation),
        scale: Some(object.transform.scale),
        color_names: Some(object.color_names.clone()),
        variation_names: None,
    }
}

fn environment_record(object: &PlacedObject) -> EnvironmentRecord {
    EnvironmentRecord {
        uuid: Some(object.uuid.clone()),
        position: Some(object.transform.position),
        rotation: Some(object.transform.rotation),
        scale: Some(object.transform.scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transform;
    use serde_json::json;
    use slotwise_catalog::ObjectDetails;

    #[test]
    fn wire_shape() {
        let mut variant = Variant::new("Oak");
        let step_id = variant.steps[0].id.clone();
        let mut slot = Slot::with_id("legs", "Legs", step_id.clone());
        slot.text_buttons = true;
        let mut obj = PlacedObject::from_details("leg-a", &ObjectDetails::new("leg-a", "Leg", vec![]));
        obj.transform = Transform {
            position: [1.0, 2.0, 3.0],
            ..Transform::IDENTITY
        };
        obj.color_names = vec!["Natural".into()];
        slot.push_object(obj);
        variant.slots.push(slot);

        let doc = export_document(std::slice::from_ref(&variant), None);
        let value = doc.to_value().unwrap();

        assert_eq!(value["version"], json!(2));
        assert!(value.get("environment").is_none());
        let v = &value["variants"][variant.id.as_str()];
        assert_eq!(v["name"], json!("Oak"));
        assert_eq!(v["steps"][step_id.as_str()], json!({"name": "Step 1", "index": 0}));
        assert_eq!(
            v["slots"]["legs"],
            json!({
                "name": "Legs",
                "canBeEmpty": false,
                "textButtons": true,
                "step": step_id,
                "objects": [{
                    "uuid": "leg-a",
                    "position": [1.0, 2.0, 3.0],
                    "rotation": [0.0, 0.0, 0.0],
                    "scale": [1.0, 1.0, 1.0],
                    "colorNames": ["Natural"]
                }]
            })
        );
        assert_eq!(v["viewPoint"]["enabled"], json!(false));
        assert_eq!(v["viewPoint"]["minDistance"], json!(0.0));
    }
}
