//! Random editing sessions never leave the model in an invalid state.

use proptest::prelude::*;
use slotwise_catalog::{Material, ObjectDetails};
use slotwise_state::{ConfiguratorState, Transform};

#[derive(Debug, Clone)]
enum Op {
    AddVariant,
    DeleteVariant,
    SelectVariant(usize),
    AddStep,
    DeleteStep(usize),
    SelectStep(usize),
    AddSlot,
    RemoveSlot(usize),
    SelectSlot(usize),
    MoveSlot(usize, usize),
    ToggleCanBeEmpty(usize),
    AddObject(u8),
    RemoveObject(usize),
    SelectObject(Option<usize>),
    SelectMaterial(usize, usize),
    Transform(usize, i16),
    Inherit(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let i = 0usize..6;
    let structure = prop_oneof![
        Just(Op::AddVariant),
        Just(Op::DeleteVariant),
        i.clone().prop_map(Op::SelectVariant),
        Just(Op::AddStep),
        i.clone().prop_map(Op::DeleteStep),
        i.clone().prop_map(Op::SelectStep),
        Just(Op::AddSlot),
        i.clone().prop_map(Op::RemoveSlot),
        i.clone().prop_map(Op::SelectSlot),
    ];
    let contents = prop_oneof![
        (i.clone(), i.clone()).prop_map(|(a, b)| Op::MoveSlot(a, b)),
        i.clone().prop_map(Op::ToggleCanBeEmpty),
        any::<u8>().prop_map(Op::AddObject),
        i.clone().prop_map(Op::RemoveObject),
        proptest::option::of(i.clone()).prop_map(Op::SelectObject),
        (i.clone(), 0usize..3).prop_map(|(a, b)| Op::SelectMaterial(a, b)),
        (i.clone(), any::<i16>()).prop_map(|(a, b)| Op::Transform(a, b)),
        i.prop_map(Op::Inherit),
    ];
    prop_oneof![structure, contents]
}

fn details(n: u8) -> ObjectDetails {
    ObjectDetails::new(
        format!("obj-{n}"),
        format!("Object {n}"),
        vec![Material::default(), Material::default()],
    )
}

fn slot_id(state: &ConfiguratorState, i: usize) -> Option<String> {
    state.slots().get(i).map(|s| s.id.clone())
}

fn step_id(state: &ConfiguratorState, i: usize) -> Option<String> {
    state.steps().get(i).map(|s| s.id.clone())
}

fn apply(state: &mut ConfiguratorState, op: Op) {
    match op {
        Op::AddVariant => {
            state.add_variant(None);
        }
        Op::DeleteVariant => {
            state.delete_current_variant();
        }
        Op::SelectVariant(i) => {
            state.select_variant(i);
        }
        Op::AddStep => {
            state.add_step("Step");
        }
        Op::DeleteStep(i) => {
            if let Some(id) = step_id(state, i) {
                state.delete_step(&id);
            }
        }
        Op::SelectStep(i) => {
            state.select_step(i);
        }
        Op::AddSlot => {
            state.add_slot(None);
        }
        Op::RemoveSlot(i) => {
            if let Some(id) = slot_id(state, i) {
                state.remove_slot(&id);
            }
        }
        Op::SelectSlot(i) => {
            state.select_slot(i);
        }
        Op::MoveSlot(slot, step) => {
            if let (Some(slot), Some(step)) = (slot_id(state, slot), step_id(state, step)) {
                state.move_slot_to_step(&slot, &step);
            }
        }
        Op::ToggleCanBeEmpty(i) => {
            if let Some(slot) = state.slots().get(i) {
                let (id, flag) = (slot.id.clone(), !slot.can_be_empty);
                state.set_can_be_empty(&id, flag);
            }
        }
        Op::AddObject(n) => {
            state.add_object_to_current(&details(n));
        }
        Op::RemoveObject(i) => {
            state.remove_object(i);
        }
        Op::SelectObject(i) => {
            state.select_object(i);
        }
        Op::SelectMaterial(o, m) => {
            state.select_material(o, m);
        }
        Op::Transform(o, x) => {
            let t = Transform {
                position: [f64::from(x), 0.0, 0.0],
                ..Transform::IDENTITY
            };
            state.set_object_transform(o, t);
        }
        Op::Inherit(i) => {
            if let Some(id) = slot_id(state, i) {
                state.inherit_from_first(&id);
            }
        }
    }
}

fn check(state: &ConfiguratorState) -> Result<(), TestCaseError> {
    prop_assert!(!state.variants().is_empty());
    prop_assert!(state.current_variant_index() < state.variants().len());
    prop_assert!(state.current_step_index() < state.steps().len());
    if let Some(i) = state.current_slot_index() {
        prop_assert!(i < state.slots().len());
    }
    for variant in state.variants() {
        prop_assert!(!variant.steps.is_empty());
        for slot in &variant.slots {
            prop_assert!(variant.step(&slot.step_id).is_some(), "dangling step ref");
            match slot.selected_index() {
                Some(i) => prop_assert!(i < slot.objects.len()),
                None => prop_assert!(slot.objects.is_empty() || slot.can_be_empty),
            }
            for object in &slot.objects {
                prop_assert!(object.selected_material < object.materials.len());
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn editing_preserves_invariants(ops in proptest::collection::vec(op(), 0..60)) {
        let mut state = ConfiguratorState::new();
        for op in ops {
            apply(&mut state, op);
            check(&state)?;
        }
    }
}
