//! Action queue ordering and drain behavior through a session

use super::test_utils::pets_session;
use parking_lot::Mutex;
use ripple::context::{action, EventKind, SharedAction};
use ripple::error::{ActionError, PropagationError};
use ripple::types::FactHandle;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, label: &str) -> SharedAction {
    let log = log.clone();
    let label = label.to_string();
    action(move |_| {
        log.lock().push(label.clone());
        Ok(())
    })
}

#[test]
fn test_insert_actions_run_most_recent_first() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, Some(FactHandle::new(1)));
    let log: Log = Arc::default();

    for label in ["A", "B", "C"] {
        ctx.add_insert_action(recorder(&log, label));
    }
    let stats = ctx.evaluate_action_queue(&session).unwrap();

    assert_eq!(*log.lock(), vec!["C", "B", "A"]);
    assert_eq!(stats.inserts, 3);
    assert!(ctx.action_queues().is_empty());
}

#[test]
fn test_insert_queued_by_deferred_action_runs_before_remaining_deferred() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Update, None, None, Some(FactHandle::new(1)));
    let log: Log = Arc::default();

    let queues = ctx.action_queues();
    let e = recorder(&log, "E");
    let d_log = log.clone();
    ctx.add_deferred_action(action(move |_| {
        d_log.lock().push("D".to_string());
        queues.add_insert_action(e.clone());
        Ok(())
    }));
    ctx.add_deferred_action(recorder(&log, "F"));
    ctx.add_insert_action(recorder(&log, "I"));

    let stats = ctx.evaluate_action_queue(&session).unwrap();

    assert_eq!(*log.lock(), vec!["I", "D", "E", "F"]);
    assert_eq!(stats.inserts, 2);
    assert_eq!(stats.deferred, 2);
    assert_eq!(stats.restarts, 1);
}

#[test]
fn test_deferred_queue_not_allocated_until_used() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, None);
    assert!(!ctx.action_queues().has_deferred_queue());

    let stats = ctx.evaluate_action_queue(&session).unwrap();
    assert_eq!(stats.inserts + stats.deferred, 0);
    assert!(!ctx.action_queues().has_deferred_queue());

    assert!(ctx.deferred_queue().is_empty());
    assert!(ctx.action_queues().has_deferred_queue());
}

#[test]
fn test_removed_insert_action_never_runs() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, None);
    let log: Log = Arc::default();

    let keep = recorder(&log, "keep");
    let drop_me = recorder(&log, "drop");
    ctx.add_insert_action(keep);
    ctx.add_insert_action(drop_me.clone());

    assert!(ctx.remove_insert_action(&drop_me));
    assert!(!ctx.remove_insert_action(&drop_me));
    ctx.evaluate_action_queue(&session).unwrap();

    assert_eq!(*log.lock(), vec!["keep"]);
}

#[test]
fn test_failing_action_leaves_rest_queued() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Deletion, None, None, None);
    let log: Log = Arc::default();

    ctx.add_insert_action(recorder(&log, "later"));
    ctx.add_insert_action(action(|_| Err(ActionError::failed("retraction refused"))));

    let err = ctx.evaluate_action_queue(&session).unwrap_err();
    assert!(matches!(err, PropagationError::Action(_)));
    assert!(log.lock().is_empty());
    assert_eq!(ctx.action_queues().pending_inserts(), 1);

    ctx.evaluate_action_queue(&session).unwrap();
    assert_eq!(*log.lock(), vec!["later"]);
}

#[test]
fn test_concurrent_producers_enqueue_inserts() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, None);
    let log: Log = Arc::default();

    std::thread::scope(|scope| {
        for producer in 0..4 {
            let queues = ctx.action_queues();
            let log = log.clone();
            scope.spawn(move || {
                for i in 0..25 {
                    queues.add_insert_action(recorder(&log, &format!("{}-{}", producer, i)));
                }
            });
        }
    });

    assert_eq!(ctx.action_queues().pending_inserts(), 100);
    let stats = ctx.evaluate_action_queue(&session).unwrap();
    assert_eq!(stats.inserts, 100);

    let log = log.lock();
    assert_eq!(log.len(), 100);
    // Each producer's own actions still come out newest first.
    for producer in 0..4 {
        let prefix = format!("{}-", producer);
        let seen: Vec<usize> = log
            .iter()
            .filter_map(|entry| entry.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        let expected: Vec<usize> = (0..25).rev().collect();
        assert_eq!(seen, expected);
    }
}

#[test]
fn test_actions_see_session_entry_point() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, None);
    ctx.add_insert_action(action(|wm| {
        if wm.default_entry_point().is_default() {
            Ok(())
        } else {
            Err(ActionError::failed("unexpected entry point"))
        }
    }));
    ctx.evaluate_action_queue(&session).unwrap();
}
