//! Persisted propagation contexts.
//!
//! A context is persisted as a fixed sequence of fields:
//! `{i32 event_kind, i64 propagation_number, rule_ref, tuple_ref,
//! entry_point_ref, i32 origin_offset, i64 original_mask}`, bincode-encoded
//! with fixed-width little-endian integers. Queues, mask caches and the
//! reader context are transient and never written.

use crate::context::{EventKind, PropagationContext};
use crate::error::MarshalError;
use crate::mask::BitMask;
use crate::registry::ClassDescriptor;
use crate::types::{EntryPointId, FactHandle, RuleRef, TupleRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Replay-time state attached to a context read back from a record.
///
/// Maps fact ids as they were persisted to the handles of the session being
/// restored, so late-bound fact handles can be resolved.
#[derive(Debug, Clone, Default)]
pub struct ReaderContext {
    handles: HashMap<u64, FactHandle>,
}

impl ReaderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, persisted_id: u64, handle: FactHandle) {
        self.handles.insert(persisted_id, handle);
    }

    pub fn resolve(&self, persisted_id: u64) -> Option<FactHandle> {
        self.handles.get(&persisted_id).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Field layout of a persisted context, in write order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub event_kind: i32,
    pub propagation_number: i64,
    pub rule_origin: Option<RuleRef>,
    pub tuple_origin: Option<TupleRef>,
    pub entry_point: EntryPointId,
    pub origin_offset: i32,
    pub original_mask: i64,
}

impl ContextRecord {
    /// Fails if the propagation number does not fit the signed record field.
    pub fn from_context(ctx: &PropagationContext) -> Result<Self, MarshalError> {
        let propagation_number = i64::try_from(ctx.propagation_number()).map_err(|_| {
            MarshalError::Encode(format!(
                "propagation number {} exceeds the record range",
                ctx.propagation_number()
            ))
        })?;
        Ok(Self {
            event_kind: ctx.kind().code(),
            propagation_number,
            rule_origin: ctx.rule_origin().cloned(),
            tuple_origin: ctx.tuple_origin(),
            entry_point: ctx.entry_point().clone(),
            origin_offset: ctx.origin_offset(),
            original_mask: ctx.original_mask().bits() as i64,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, MarshalError> {
        bincode::serialize(self).map_err(|e| MarshalError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MarshalError> {
        let record: ContextRecord = bincode::deserialize(bytes)?;
        if record.propagation_number < 0 {
            return Err(MarshalError::Decode(format!(
                "negative propagation number {}",
                record.propagation_number
            )));
        }
        Ok(record)
    }

    pub fn kind(&self) -> Result<EventKind, MarshalError> {
        EventKind::from_code(self.event_kind)
            .map_err(|_| MarshalError::UnknownEventKind(self.event_kind))
    }

    pub fn original_mask(&self) -> BitMask {
        BitMask::from_bits(self.original_mask as u64)
    }

    /// Rebuild a context. The fact handle is left unbound and the modified
    /// class is the universal class; both are resolved by the replay.
    pub fn into_context(
        self,
        reader_context: Option<ReaderContext>,
    ) -> Result<PropagationContext, MarshalError> {
        let kind = self.kind()?;
        let original_mask = self.original_mask();
        let ctx = PropagationContext::new(
            self.propagation_number as u64,
            kind,
            self.rule_origin,
            self.tuple_origin,
            None,
            self.entry_point,
        )
        .with_origin_offset(self.origin_offset)
        .with_modification(original_mask, Arc::new(ClassDescriptor::universal()));

        Ok(match reader_context {
            Some(reader_context) => ctx.with_reader_context(reader_context),
            None => ctx,
        })
    }
}

pub fn write_context(ctx: &PropagationContext) -> Result<Vec<u8>, MarshalError> {
    ContextRecord::from_context(ctx)?.encode()
}

pub fn read_context(
    bytes: &[u8],
    reader_context: Option<ReaderContext>,
) -> Result<PropagationContext, MarshalError> {
    ContextRecord::decode(bytes)?.into_context(reader_context)
}
