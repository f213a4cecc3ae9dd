//! Working-memory actions and the handle they execute against.

use crate::error::ActionError;
use crate::registry::PropertyOrderingProvider;
use crate::types::EntryPointId;
use std::sync::Arc;

/// The working-memory surface the propagation core needs.
pub trait WorkingMemory: Send + Sync {
    fn property_orderings(&self) -> &dyn PropertyOrderingProvider;

    fn default_entry_point(&self) -> EntryPointId {
        EntryPointId::default()
    }
}

/// Deferred unit of work queued during propagation.
///
/// The scheduler only ever calls [`execute`](Self::execute); a returned error
/// aborts the drain in progress.
pub trait WorkingMemoryAction: Send + Sync {
    fn execute(&self, working_memory: &dyn WorkingMemory) -> Result<(), ActionError>;

    /// Short label for logs
    fn name(&self) -> &str {
        "action"
    }
}

impl<F> WorkingMemoryAction for F
where
    F: Fn(&dyn WorkingMemory) -> Result<(), ActionError> + Send + Sync,
{
    fn execute(&self, working_memory: &dyn WorkingMemory) -> Result<(), ActionError> {
        self(working_memory)
    }
}

pub type SharedAction = Arc<dyn WorkingMemoryAction>;

/// Wrap a closure as a shared action.
pub fn action<F>(f: F) -> SharedAction
where
    F: Fn(&dyn WorkingMemory) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn same_action(a: &SharedAction, b: &SharedAction) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
