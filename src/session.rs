//! Session
//!
//! Minimal working-memory container: hands out propagation numbers, owns the
//! type registry and builds propagation contexts for fact-lifecycle events.

use crate::config::SessionConfig;
use crate::context::{EventKind, PropagationContext, WorkingMemory};
use crate::error::{ConfigError, MarshalError};
use crate::marshal::{read_context, ReaderContext};
use crate::mask::BitMask;
use crate::registry::{ClassDescriptor, PropertyOrderingProvider, TypeRegistry};
use crate::types::{EntryPointId, FactHandle, PropagationNumber, RuleRef, TupleRef};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct Session {
    registry: Arc<TypeRegistry>,
    next_number: AtomicU64,
    default_entry_point: EntryPointId,
}

impl Session {
    /// Create a session, loading the configured declaration file if any.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;
        let registry = match &config.declarations {
            Some(path) => TypeRegistry::from_declarations(path)?,
            None => TypeRegistry::new(),
        };
        Ok(Self::with_registry(Arc::new(registry), config))
    }

    pub fn with_registry(registry: Arc<TypeRegistry>, config: &SessionConfig) -> Self {
        Self {
            registry,
            next_number: AtomicU64::new(config.first_propagation_number.max(1)),
            default_entry_point: config.entry_point(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Claim the next number in the session-wide propagation order.
    pub fn next_propagation_number(&self) -> PropagationNumber {
        self.next_number.fetch_add(1, Ordering::SeqCst)
    }

    /// The number the next context will receive
    pub fn peek_propagation_number(&self) -> PropagationNumber {
        self.next_number.load(Ordering::SeqCst)
    }

    /// Context for an event that carries no field-level change information.
    pub fn new_context(
        &self,
        kind: EventKind,
        rule_origin: Option<RuleRef>,
        tuple_origin: Option<TupleRef>,
        fact_handle: Option<FactHandle>,
    ) -> PropagationContext {
        let ctx = PropagationContext::new(
            self.next_propagation_number(),
            kind,
            rule_origin,
            tuple_origin,
            fact_handle,
            self.default_entry_point.clone(),
        );
        debug!(number = ctx.propagation_number(), kind = %kind, "Propagation context created");
        ctx
    }

    /// Context for an event on a fact of `modified_class` whose changed
    /// properties are `mask`.
    ///
    /// The mask is kept only when the kind tracks properties and the class has
    /// a recorded ordering; otherwise every property is considered changed.
    pub fn new_modification_context(
        &self,
        kind: EventKind,
        rule_origin: Option<RuleRef>,
        tuple_origin: Option<TupleRef>,
        fact_handle: FactHandle,
        mask: BitMask,
        modified_class: Arc<ClassDescriptor>,
    ) -> PropagationContext {
        let mask = if kind.tracks_properties() && self.registry.has_declaration(&modified_class) {
            mask
        } else {
            BitMask::ALL
        };
        self.new_context(kind, rule_origin, tuple_origin, Some(fact_handle))
            .with_modification(mask, modified_class)
    }

    /// Rebuild a persisted context for replay.
    ///
    /// Numbers handed out afterwards stay above the replayed context's number.
    pub fn replay_context(
        &self,
        bytes: &[u8],
        reader_context: ReaderContext,
    ) -> Result<PropagationContext, MarshalError> {
        let ctx = read_context(bytes, Some(reader_context))?;
        self.next_number
            .fetch_max(ctx.propagation_number() + 1, Ordering::SeqCst);
        debug!(number = ctx.propagation_number(), kind = %ctx.kind(), "Propagation context replayed");
        Ok(ctx)
    }
}

impl WorkingMemory for Session {
    fn property_orderings(&self) -> &dyn PropertyOrderingProvider {
        self.registry.as_ref()
    }

    fn default_entry_point(&self) -> EntryPointId {
        self.default_entry_point.clone()
    }
}
