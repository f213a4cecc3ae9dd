//! Propagation contexts: the event descriptor, its action queues, and the
//! working-memory surface actions execute against.

pub mod action;
pub mod kind;
pub mod propagation;
pub mod queue;

pub use action::{action, SharedAction, WorkingMemory, WorkingMemoryAction};
pub use kind::EventKind;
pub use propagation::PropagationContext;
pub use queue::{ActionQueues, DeferredQueue, DrainStats};
