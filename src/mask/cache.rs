//! Per-declared-type cache of translated masks.

use crate::mask::BitMask;
use crate::registry::ClassDescriptor;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Cache keyed by (modified class, original mask).
///
/// Entries belong to one declaration generation. [`reset`](Self::reset) moves
/// the cache to a new generation and drops every entry; a store computed
/// against an older generation is refused. Concurrent adapters racing on the
/// same key compute the same value, so the last store wins.
#[derive(Debug, Default)]
pub struct TransformedMaskCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    /// modified class -> original mask bits -> translated mask
    entries: HashMap<ClassDescriptor, HashMap<u64, BitMask>>,
}

impl TransformedMaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache belonging to `generation`.
    pub fn at_generation(generation: u64) -> Self {
        Self {
            state: RwLock::new(CacheState {
                generation,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn get(&self, modified_class: &ClassDescriptor, original: BitMask) -> Option<BitMask> {
        self.state
            .read()
            .entries
            .get(modified_class)
            .and_then(|by_mask| by_mask.get(&original.bits()))
            .copied()
    }

    /// Store a translation computed from the orderings of `generation`.
    /// Returns false, storing nothing, if the cache has moved on since.
    pub fn store(
        &self,
        modified_class: &ClassDescriptor,
        original: BitMask,
        translated: BitMask,
        generation: u64,
    ) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        state
            .entries
            .entry(modified_class.clone())
            .or_default()
            .insert(original.bits(), translated);
        true
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and move to `generation`.
    pub fn reset(&self, generation: u64) {
        let mut state = self.state.write();
        state.generation = generation;
        state.entries.clear();
    }
}
