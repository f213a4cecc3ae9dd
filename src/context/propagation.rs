//! Propagation Context
//!
//! Descriptor of one fact-lifecycle event as it travels through the matching
//! network. Origin metadata and the original mask are fixed at construction;
//! the working modification mask is re-derived for each declared type the
//! network visits.
//!
//! A context is *active* while the network traverses and the scheduler drains
//! its queues, and *released* once [`PropagationContext::clear_transient_state`]
//! has dropped the tuple origin and any replay reader context.

use crate::context::action::{SharedAction, WorkingMemory};
use crate::context::kind::EventKind;
use crate::context::queue::{ActionQueues, DeferredQueue, DrainStats};
use crate::error::PropagationError;
use crate::marshal::ReaderContext;
use crate::mask::{adapt_mask, BitMask};
use crate::registry::{ClassDescriptor, DeclaredType};
use crate::types::{EntryPointId, FactHandle, PropagationNumber, RuleRef, TupleRef};
use std::fmt;
use std::sync::Arc;

pub struct PropagationContext {
    kind: EventKind,
    rule_origin: Option<RuleRef>,
    tuple_origin: Option<TupleRef>,
    fact_handle: Option<FactHandle>,
    entry_point: EntryPointId,
    propagation_number: PropagationNumber,
    origin_offset: i32,
    original_mask: BitMask,
    modification_mask: BitMask,
    modified_class: Arc<ClassDescriptor>,
    object_type_hint: Option<Arc<DeclaredType>>,
    queues: Arc<ActionQueues>,
    reader_context: Option<ReaderContext>,
}

impl PropagationContext {
    /// Create a context that treats every property as changed.
    pub fn new(
        propagation_number: PropagationNumber,
        kind: EventKind,
        rule_origin: Option<RuleRef>,
        tuple_origin: Option<TupleRef>,
        fact_handle: Option<FactHandle>,
        entry_point: EntryPointId,
    ) -> Self {
        Self {
            kind,
            rule_origin,
            tuple_origin,
            fact_handle,
            entry_point,
            propagation_number,
            origin_offset: -1,
            original_mask: BitMask::ALL,
            modification_mask: BitMask::ALL,
            modified_class: Arc::new(ClassDescriptor::universal()),
            object_type_hint: None,
            queues: Arc::new(ActionQueues::new()),
            reader_context: None,
        }
    }

    /// Construction-time: set the changed-property mask and the class it is
    /// expressed against.
    pub fn with_modification(mut self, mask: BitMask, modified_class: Arc<ClassDescriptor>) -> Self {
        self.original_mask = mask;
        self.modification_mask = mask;
        self.modified_class = modified_class;
        self
    }

    /// Construction-time: attach the reader context of a replay in progress.
    pub fn with_reader_context(mut self, reader_context: ReaderContext) -> Self {
        self.reader_context = Some(reader_context);
        self
    }

    pub(crate) fn with_origin_offset(mut self, origin_offset: i32) -> Self {
        self.origin_offset = origin_offset;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn rule_origin(&self) -> Option<&RuleRef> {
        self.rule_origin.as_ref()
    }

    pub fn tuple_origin(&self) -> Option<TupleRef> {
        self.tuple_origin
    }

    pub fn fact_handle(&self) -> Option<FactHandle> {
        self.fact_handle
    }

    /// Bind the fact handle once it is known, e.g. while replaying a session.
    pub fn set_fact_handle(&mut self, fact_handle: FactHandle) {
        self.fact_handle = Some(fact_handle);
    }

    pub fn entry_point(&self) -> &EntryPointId {
        &self.entry_point
    }

    pub fn set_entry_point(&mut self, entry_point: EntryPointId) {
        self.entry_point = entry_point;
    }

    pub fn propagation_number(&self) -> PropagationNumber {
        self.propagation_number
    }

    /// Pattern position this event originates from, `-1` when not applicable
    pub fn origin_offset(&self) -> i32 {
        self.origin_offset
    }

    pub fn set_origin_offset(&mut self, origin_offset: i32) {
        self.origin_offset = origin_offset;
    }

    pub fn original_mask(&self) -> BitMask {
        self.original_mask
    }

    /// Mask as adapted for the last declared type passed to [`Self::adapt_mask_for`]
    pub fn modification_mask(&self) -> BitMask {
        self.modification_mask
    }

    pub fn modified_class(&self) -> &Arc<ClassDescriptor> {
        &self.modified_class
    }

    pub fn object_type_hint(&self) -> Option<&Arc<DeclaredType>> {
        self.object_type_hint.as_ref()
    }

    pub fn set_object_type_hint(&mut self, declared_type: Option<Arc<DeclaredType>>) {
        self.object_type_hint = declared_type;
    }

    pub fn reader_context(&self) -> Option<&ReaderContext> {
        self.reader_context.as_ref()
    }

    /// Drop references only needed while traversing or replaying.
    pub fn clear_transient_state(&mut self) {
        self.tuple_origin = None;
        self.reader_context = None;
    }

    /// Re-derive the modification mask for `declared_type` from the original mask.
    pub fn adapt_mask_for(
        &mut self,
        declared_type: &DeclaredType,
        working_memory: &dyn WorkingMemory,
    ) -> Result<&mut Self, PropagationError> {
        self.modification_mask = adapt_mask(
            self.original_mask,
            &self.modified_class,
            declared_type,
            working_memory.property_orderings(),
        )?;
        Ok(self)
    }

    /// Shared handle to this context's queues, for actions that enqueue
    /// follow-on work while they execute.
    pub fn action_queues(&self) -> Arc<ActionQueues> {
        self.queues.clone()
    }

    pub fn add_insert_action(&self, action: SharedAction) {
        self.queues.add_insert_action(action);
    }

    pub fn remove_insert_action(&self, action: &SharedAction) -> bool {
        self.queues.remove_insert_action(action)
    }

    pub fn deferred_queue(&self) -> &DeferredQueue {
        self.queues.deferred_queue()
    }

    pub fn add_deferred_action(&self, action: SharedAction) {
        self.queues.add_deferred_action(action);
    }

    /// Drain queued actions; see [`ActionQueues::evaluate`].
    pub fn evaluate_action_queue(
        &self,
        working_memory: &dyn WorkingMemory,
    ) -> Result<DrainStats, PropagationError> {
        self.queues.evaluate(working_memory)
    }
}

fn display_or_none<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

impl fmt::Display for PropagationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PropagationContext [entry_point={}, fact_handle={}, tuple_origin={}, origin_offset={}, propagation_number={}, rule={}, kind={}]",
            self.entry_point,
            display_or_none(self.fact_handle),
            display_or_none(self.tuple_origin),
            self.origin_offset,
            self.propagation_number,
            display_or_none(self.rule_origin.as_ref()),
            self.kind,
        )
    }
}

impl fmt::Debug for PropagationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagationContext")
            .field("kind", &self.kind)
            .field("propagation_number", &self.propagation_number)
            .field("entry_point", &self.entry_point)
            .field("origin_offset", &self.origin_offset)
            .field("original_mask", &self.original_mask)
            .field("modification_mask", &self.modification_mask)
            .field("modified_class", &self.modified_class)
            .field("pending_inserts", &self.queues.pending_inserts())
            .field("pending_deferred", &self.queues.pending_deferred())
            .finish_non_exhaustive()
    }
}
