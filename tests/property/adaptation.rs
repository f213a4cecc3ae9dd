//! Property-based tests for propagation numbering and mask adaptation

use proptest::prelude::*;
use ripple::config::SessionConfig;
use ripple::context::EventKind;
use ripple::mask::{adapt_mask, translate, BitMask};
use ripple::registry::{ClassDescriptor, TypeDeclaration, TypeRegistry};
use ripple::session::Session;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Distinct property names, up to the mask width
fn property_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..64)
        .prop_map(|names: BTreeSet<String>| names.into_iter().collect())
        .prop_shuffle()
}

fn registry_with(concrete: &[String], view: &[String]) -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.declare(TypeDeclaration::new(
        ClassDescriptor::concrete("p", "Concrete"),
        concrete.iter().cloned(),
    ));
    registry.declare(TypeDeclaration::new(
        ClassDescriptor::structural("p", "View"),
        view.iter().cloned(),
    ));
    registry.declare(TypeDeclaration::new(
        ClassDescriptor::concrete("p", "Other"),
        view.iter().cloned(),
    ));
    registry
}

proptest! {
    #[test]
    fn test_propagation_numbers_strictly_increase(
        start in 1u64..1_000_000,
        kinds in prop::collection::vec(0usize..6, 1..50),
    ) {
        let config = SessionConfig {
            first_propagation_number: start,
            ..SessionConfig::default()
        };
        let session = Session::with_registry(Arc::new(TypeRegistry::new()), &config);
        let mut last = None;
        for k in kinds {
            let ctx = session.new_context(EventKind::ALL[k], None, None, None);
            if let Some(prev) = last {
                prop_assert!(ctx.propagation_number() > prev);
            }
            last = Some(ctx.propagation_number());
        }
    }

    #[test]
    fn test_all_mask_always_passes_through(names in property_names()) {
        let registry = registry_with(&names, &names);
        let concrete = registry.class("p.Concrete").unwrap();
        let view = registry.declared_type("p.View").unwrap();
        let adapted = adapt_mask(BitMask::ALL, &concrete, &view, &registry).unwrap();
        prop_assert!(adapted.is_all());
    }

    #[test]
    fn test_concrete_to_concrete_is_identity(names in property_names(), bits in any::<u64>()) {
        prop_assume!(bits != u64::MAX);
        let registry = registry_with(&names, &names);
        let concrete = registry.class("p.Concrete").unwrap();
        let other = registry.declared_type("p.Other").unwrap();
        let mask = BitMask::from_bits(bits);
        prop_assert_eq!(adapt_mask(mask, &concrete, &other, &registry).unwrap(), mask);
    }

    #[test]
    fn test_cached_adaptation_matches_fresh_translation(
        concrete in property_names(),
        view in property_names(),
        bits in any::<u64>(),
    ) {
        prop_assume!(bits != u64::MAX);
        let registry = registry_with(&concrete, &view);
        let class = registry.class("p.Concrete").unwrap();
        let declared = registry.declared_type("p.View").unwrap();
        let mask = BitMask::from_bits(bits);

        let expected = translate(mask, &concrete, &view);
        let first = adapt_mask(mask, &class, &declared, &registry).unwrap();
        let second = adapt_mask(mask, &class, &declared, &registry).unwrap();
        prop_assert_eq!(first, expected);
        prop_assert_eq!(second, expected);
        prop_assert_eq!(declared.as_class().unwrap().cache().len(), 1);
    }

    #[test]
    fn test_translated_bits_name_changed_properties(
        concrete in property_names(),
        view in property_names(),
        bits in any::<u64>(),
    ) {
        let mask = BitMask::from_bits(bits);
        let adapted = translate(mask, &concrete, &view);
        for pos in adapted.positions() {
            let name = &view[pos];
            let source_pos = concrete.iter().position(|n| n == name).unwrap();
            prop_assert!(mask.is_set(source_pos));
        }
    }
}
