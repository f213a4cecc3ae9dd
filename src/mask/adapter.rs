//! Modification-mask adaptation.
//!
//! Nodes are often indexed on a structural type while the fact that changed is
//! a concrete class with its own, unrelated property ordering. Adaptation maps
//! each changed property by name from the concrete ordering into the declared
//! type's ordering so nodes only re-evaluate for properties they can see.

use crate::error::PropagationError;
use crate::mask::BitMask;
use crate::registry::{ClassDescriptor, DeclaredType, PropertyOrderingProvider, BASE_PACKAGE};
use tracing::trace;

/// Express `original` (against `modified_class`) in the ordering of `target`.
///
/// Translations are cached on the target type, keyed by the modified class and
/// the original mask. A mask against the universal class has no known
/// ordering, so every property is treated as changed.
pub fn adapt_mask(
    original: BitMask,
    modified_class: &ClassDescriptor,
    target: &DeclaredType,
    provider: &dyn PropertyOrderingProvider,
) -> Result<BitMask, PropagationError> {
    if original.is_all() {
        return Ok(original);
    }
    if modified_class.is_universal() {
        return Ok(BitMask::ALL);
    }
    let Some(object_type) = target.as_class() else {
        return Ok(original);
    };

    let generation = provider.generation();
    let target_class = object_type.class();
    if target_class.as_ref() == modified_class
        || target_class.package() == BASE_PACKAGE
        || !(target_class.is_structural() || modified_class.is_structural())
    {
        return Ok(original);
    }

    if let Some(cached) = object_type.cache().get(modified_class, original) {
        return Ok(cached);
    }

    let target_properties = provider.settable_properties(target_class.package(), &target_class)?;
    let source_properties =
        provider.settable_properties(modified_class.package(), modified_class)?;

    let adapted = translate(original, &source_properties, &target_properties);
    let cached = object_type
        .cache()
        .store(modified_class, original, adapted, generation);

    trace!(
        from = %modified_class,
        to = %target_class,
        original = %original,
        adapted = %adapted,
        cached,
        "Adapted modification mask"
    );
    Ok(adapted)
}

/// Remap set bits by property name. Unset bits and names missing from the
/// target contribute nothing.
pub fn translate(original: BitMask, source: &[String], target: &[String]) -> BitMask {
    source
        .iter()
        .take(BitMask::WIDTH)
        .enumerate()
        .filter(|(pos, _)| original.is_set(*pos))
        .filter_map(|(_, name)| target.iter().position(|candidate| candidate == name))
        .fold(BitMask::EMPTY, BitMask::set)
}
