//! Modification-mask adaptation through session-built contexts

use super::test_utils::{pets_registry, pets_session};
use ripple::config::SessionConfig;
use ripple::context::EventKind;
use ripple::error::PropagationError;
use ripple::mask::{adapt_mask, translate, BitMask};
use ripple::registry::{ClassDescriptor, DeclaredType, TypeDeclaration};
use ripple::session::Session;
use ripple::types::{FactHandle, RuleRef};
use std::sync::Arc;

fn dog_update(session: &Session, mask: BitMask) -> ripple::context::PropagationContext {
    let dog = session.registry().class("pets.Dog").unwrap();
    session.new_modification_context(
        EventKind::Update,
        Some(RuleRef::new("pets", "rename")),
        None,
        FactHandle::new(7),
        mask,
        dog,
    )
}

fn cache_len(declared: &DeclaredType) -> usize {
    declared.as_class().unwrap().cache().len()
}

#[test]
fn test_dog_update_adapted_to_pet_ordering() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();

    // Dog: name=0 age=1 owner=2; Pet: owner=0 name=1
    let mut ctx = dog_update(&session, BitMask::from_positions([0, 2]));
    let adapted = ctx.adapt_mask_for(&pet, &session).unwrap().modification_mask();

    assert_eq!(adapted, BitMask::from_positions([0, 1]));
    assert_eq!(ctx.original_mask(), BitMask::from_positions([0, 2]));
}

#[test]
fn test_property_missing_from_target_is_dropped() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();

    let mut ctx = dog_update(&session, BitMask::from_positions([1]));
    ctx.adapt_mask_for(&pet, &session).unwrap();

    assert!(ctx.modification_mask().is_empty());
}

#[test]
fn test_adaptation_is_always_from_original_mask() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();
    let dog = session.registry().declared_type("pets.Dog").unwrap();

    let mut ctx = dog_update(&session, BitMask::from_positions([2]));
    ctx.adapt_mask_for(&pet, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([0]));

    // Same class: original mask comes back untouched.
    ctx.adapt_mask_for(&dog, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([2]));
}

#[test]
fn test_two_concrete_classes_are_not_translated() {
    let session = pets_session();
    let cat = session.registry().declared_type("pets.Cat").unwrap();

    let mut ctx = dog_update(&session, BitMask::from_positions([1]));
    ctx.adapt_mask_for(&cat, &session).unwrap();

    assert_eq!(ctx.modification_mask(), BitMask::from_positions([1]));
}

#[test]
fn test_all_mask_and_template_targets_pass_through() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();
    let template = session.registry().declare_template("Reading").unwrap();

    let mut ctx = dog_update(&session, BitMask::ALL);
    ctx.adapt_mask_for(&pet, &session).unwrap();
    assert!(ctx.modification_mask().is_all());

    let mut ctx = dog_update(&session, BitMask::from_positions([0]));
    ctx.adapt_mask_for(&template, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([0]));
}

#[test]
fn test_translations_cached_on_target_type() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();
    for _ in 0..3 {
        let mut ctx = dog_update(&session, BitMask::from_positions([0]));
        ctx.adapt_mask_for(&pet, &session).unwrap();
        assert_eq!(ctx.modification_mask(), BitMask::from_positions([1]));
    }
    assert_eq!(cache_len(&pet), 1);

    let mut ctx = dog_update(&session, BitMask::from_positions([2]));
    ctx.adapt_mask_for(&pet, &session).unwrap();
    assert_eq!(cache_len(&pet), 2);
}

#[test]
fn test_redeclaration_reorders_properties() {
    let registry = pets_registry();
    let session = Session::with_registry(registry.clone(), &SessionConfig::default());
    let pet = registry.declared_type("pets.Pet").unwrap();

    let mut ctx = dog_update(&session, BitMask::from_positions([0]));
    ctx.adapt_mask_for(&pet, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([1]));

    let redeclared = registry.declare(TypeDeclaration::new(
        ClassDescriptor::structural("pets", "Pet"),
        ["name", "owner"],
    ));
    assert!(Arc::ptr_eq(&pet, &redeclared));

    // The handle taken before the redeclaration sees the new ordering.
    let mut ctx = dog_update(&session, BitMask::from_positions([0]));
    ctx.adapt_mask_for(&pet, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([0]));
}

#[test]
fn test_held_handle_never_serves_stale_translation() {
    let registry = pets_registry();
    let session = Session::with_registry(registry.clone(), &SessionConfig::default());
    let node_pet = registry.declared_type("pets.Pet").unwrap();

    registry.declare(TypeDeclaration::new(
        ClassDescriptor::structural("pets", "Pet"),
        ["owner", "name"],
    ));
    let mut ctx = dog_update(&session, BitMask::from_positions([0]));
    ctx.adapt_mask_for(&node_pet, &session).unwrap();
    assert_eq!(ctx.modification_mask(), BitMask::from_positions([1]));
    assert_eq!(cache_len(&node_pet), 1);

    registry.declare(TypeDeclaration::new(
        ClassDescriptor::concrete("pets", "Dog"),
        ["owner", "age", "name"],
    ));
    assert_eq!(cache_len(&node_pet), 0);

    let mut ctx = dog_update(&session, BitMask::from_positions([0]));
    let held = ctx.adapt_mask_for(&node_pet, &session).unwrap().modification_mask();
    let fresh_pet = registry.declared_type("pets.Pet").unwrap();
    let fresh = ctx.adapt_mask_for(&fresh_pet, &session).unwrap().modification_mask();

    assert_eq!(held, BitMask::from_positions([0]));
    assert_eq!(held, fresh);
}

#[test]
fn test_concurrent_adaptation_agrees_with_translation() {
    let session = pets_session();
    let registry = session.registry().clone();
    let pet = registry.declared_type("pets.Pet").unwrap();
    let dog = registry.class("pets.Dog").unwrap();
    let dog_props = registry.declaration("pets", "Dog").unwrap().settable_properties;
    let pet_props = registry.declaration("pets", "Pet").unwrap().settable_properties;
    let masks: Vec<BitMask> = (1u64..8).map(BitMask::from_bits).collect();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    for &mask in &masks {
                        let adapted = adapt_mask(mask, &dog, &pet, registry.as_ref()).unwrap();
                        assert_eq!(adapted, translate(mask, &dog_props, &pet_props));
                    }
                }
            });
        }
    });

    assert_eq!(cache_len(&pet), masks.len());
}

#[test]
fn test_undeclared_modified_class_cannot_be_adapted() {
    let session = pets_session();
    let pet = session.registry().declared_type("pets.Pet").unwrap();
    let wolf = Arc::new(ClassDescriptor::concrete("wild", "Wolf"));

    let mut ctx = session
        .new_context(EventKind::Update, None, None, Some(FactHandle::new(3)))
        .with_modification(BitMask::from_positions([0]), wolf);
    let err = ctx.adapt_mask_for(&pet, &session).unwrap_err();

    assert!(matches!(
        err,
        PropagationError::TypeAdaptationUnsupported { .. }
    ));
}
