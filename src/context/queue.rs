//! Action Queue Scheduler
//!
//! Two queues sequence the work triggered while a propagation is in flight:
//!
//! - the **insert queue** holds insertion-triggered actions. It is LIFO and
//!   lock-protected, because producers on other call stacks may add to it
//!   while the drain loop runs.
//! - the **deferred queue** holds evaluation and fix-up actions. It is FIFO,
//!   allocated on first use, and must only be touched by the thread driving
//!   [`ActionQueues::evaluate`].
//!
//! A deferred action never runs while an insert action is pending. If a
//! deferred action enqueues an insert, the drain returns to the insert queue
//! before the next deferred action.

use crate::context::action::{same_action, SharedAction, WorkingMemory};
use crate::error::PropagationError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};
use tracing::{debug, trace, warn};

/// Counters for one call to [`ActionQueues::evaluate`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Insert actions executed
    pub inserts: usize,
    /// Deferred actions executed
    pub deferred: usize,
    /// Times the deferred drain was interrupted by a new insert
    pub restarts: usize,
}

/// FIFO queue of evaluation and fix-up actions.
///
/// Owned by a single thread: the first thread to touch it becomes the owner,
/// and debug builds assert that no other thread touches it afterwards. The
/// inner mutex is therefore never contended.
pub struct DeferredQueue {
    owner: OnceLock<ThreadId>,
    actions: Mutex<VecDeque<SharedAction>>,
}

impl DeferredQueue {
    fn new() -> Self {
        Self {
            owner: OnceLock::new(),
            actions: Mutex::new(VecDeque::new()),
        }
    }

    fn check_owner(&self) {
        let current = thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        debug_assert_eq!(
            owner, current,
            "deferred action queue touched outside its owning thread"
        );
    }

    pub fn push_back(&self, action: SharedAction) {
        self.check_owner();
        self.actions.lock().push_back(action);
    }

    pub fn pop_front(&self) -> Option<SharedAction> {
        self.check_owner();
        self.actions.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The insert and deferred queues of one propagation context
pub struct ActionQueues {
    inserts: Mutex<VecDeque<SharedAction>>,
    deferred: OnceLock<DeferredQueue>,
}

impl Default for ActionQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueues {
    pub fn new() -> Self {
        Self {
            inserts: Mutex::new(VecDeque::new()),
            deferred: OnceLock::new(),
        }
    }

    /// Queue an insert action; it runs before every insert already queued.
    pub fn add_insert_action(&self, action: SharedAction) {
        self.inserts.lock().push_front(action);
    }

    /// Remove a queued insert action by identity. Returns whether it was queued.
    pub fn remove_insert_action(&self, action: &SharedAction) -> bool {
        let mut inserts = self.inserts.lock();
        match inserts.iter().position(|queued| same_action(queued, action)) {
            Some(pos) => {
                inserts.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn pending_inserts(&self) -> usize {
        self.inserts.lock().len()
    }

    pub fn has_pending_inserts(&self) -> bool {
        !self.inserts.lock().is_empty()
    }

    /// The deferred queue, allocated on first access.
    pub fn deferred_queue(&self) -> &DeferredQueue {
        self.deferred.get_or_init(DeferredQueue::new)
    }

    pub fn add_deferred_action(&self, action: SharedAction) {
        self.deferred_queue().push_back(action);
    }

    /// Whether the deferred queue has been allocated
    pub fn has_deferred_queue(&self) -> bool {
        self.deferred.get().is_some()
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.get().map_or(0, DeferredQueue::len)
    }

    pub fn is_empty(&self) -> bool {
        self.pending_inserts() == 0 && self.pending_deferred() == 0
    }

    fn pop_insert(&self) -> Option<SharedAction> {
        self.inserts.lock().pop_front()
    }

    /// Drain both queues against `working_memory`.
    ///
    /// The insert lock is released while each action executes so actions can
    /// queue more work on the same context. The first failing action stops the
    /// drain; its error is returned and the remaining actions stay queued.
    pub fn evaluate(&self, working_memory: &dyn WorkingMemory) -> Result<DrainStats, PropagationError> {
        let mut stats = DrainStats::default();
        loop {
            while let Some(action) = self.pop_insert() {
                trace!(action = action.name(), "Executing insert action");
                run(&action, working_memory)?;
                stats.inserts += 1;
            }

            let mut restart = false;
            if let Some(deferred) = self.deferred.get() {
                while let Some(action) = deferred.pop_front() {
                    trace!(action = action.name(), "Executing deferred action");
                    run(&action, working_memory)?;
                    stats.deferred += 1;
                    if self.has_pending_inserts() {
                        restart = true;
                        break;
                    }
                }
            }

            if !restart {
                break;
            }
            stats.restarts += 1;
            debug!(
                restarts = stats.restarts,
                "Insert queued by deferred action, draining inserts first"
            );
        }

        debug!(
            inserts = stats.inserts,
            deferred = stats.deferred,
            restarts = stats.restarts,
            "Action queues drained"
        );
        Ok(stats)
    }
}

fn run(action: &SharedAction, working_memory: &dyn WorkingMemory) -> Result<(), PropagationError> {
    action.execute(working_memory).map_err(|e| {
        warn!(action = action.name(), error = %e, "Action failed, aborting drain");
        PropagationError::Action(e)
    })
}
