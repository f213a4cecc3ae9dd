//! Persisting a context and replaying it into another session

use super::test_utils::pets_session;
use ripple::context::EventKind;
use ripple::error::MarshalError;
use ripple::marshal::{write_context, ContextRecord, ReaderContext};
use ripple::mask::BitMask;
use ripple::types::{FactHandle, RuleRef, TupleRef};

#[test]
fn test_replay_restores_persisted_fields() {
    let source = pets_session();
    let dog = source.registry().class("pets.Dog").unwrap();
    let mut ctx = source.new_modification_context(
        EventKind::Update,
        Some(RuleRef::new("pets", "birthday")),
        Some(TupleRef(42)),
        FactHandle::new(9),
        BitMask::from_positions([1]),
        dog,
    );
    ctx.set_origin_offset(3);
    let pet = source.registry().declared_type("pets.Pet").unwrap();
    ctx.adapt_mask_for(&pet, &source).unwrap();
    let bytes = write_context(&ctx).unwrap();

    let target = pets_session();
    let mut reader = ReaderContext::new();
    reader.register(9, FactHandle::new(901));
    let replayed = target.replay_context(&bytes, reader).unwrap();

    assert_eq!(replayed.kind(), EventKind::Update);
    assert_eq!(replayed.propagation_number(), ctx.propagation_number());
    assert_eq!(replayed.rule_origin(), ctx.rule_origin());
    assert_eq!(replayed.tuple_origin(), Some(TupleRef(42)));
    assert_eq!(replayed.entry_point(), ctx.entry_point());
    assert_eq!(replayed.origin_offset(), 3);
    // The original mask is persisted, not the adapted one.
    assert_eq!(replayed.original_mask(), BitMask::from_positions([1]));
    assert_eq!(replayed.modification_mask(), BitMask::from_positions([1]));
    assert!(replayed.fact_handle().is_none());
    assert!(replayed.modified_class().is_universal());

    let reader = replayed.reader_context().unwrap();
    assert_eq!(reader.resolve(9), Some(FactHandle::new(901)));
}

#[test]
fn test_replayed_context_binds_handle_and_drops_transient_state() {
    let source = pets_session();
    let ctx = source.new_context(
        EventKind::Insertion,
        None,
        Some(TupleRef(5)),
        Some(FactHandle::new(2)),
    );
    let bytes = write_context(&ctx).unwrap();

    let target = pets_session();
    let mut reader = ReaderContext::new();
    reader.register(2, FactHandle::new(20));
    let mut replayed = target.replay_context(&bytes, reader).unwrap();

    let handle = replayed.reader_context().and_then(|r| r.resolve(2)).unwrap();
    replayed.set_fact_handle(handle);
    assert_eq!(replayed.fact_handle(), Some(FactHandle::new(20)));

    replayed.clear_transient_state();
    assert!(replayed.tuple_origin().is_none());
    assert!(replayed.reader_context().is_none());
    assert_eq!(replayed.fact_handle(), Some(FactHandle::new(20)));
}

#[test]
fn test_replay_keeps_numbering_ahead() {
    let source = pets_session();
    for _ in 0..20 {
        source.next_propagation_number();
    }
    let ctx = source.new_context(EventKind::RuleAddition, None, None, None);
    let bytes = write_context(&ctx).unwrap();

    let target = pets_session();
    let replayed = target.replay_context(&bytes, ReaderContext::new()).unwrap();
    let next = target.new_context(EventKind::Insertion, None, None, None);

    assert!(next.propagation_number() > replayed.propagation_number());
}

#[test]
fn test_unknown_kind_rejected_on_replay() {
    let ctx = pets_session().new_context(EventKind::Expiration, None, None, None);
    let mut record = ContextRecord::from_context(&ctx).unwrap();
    record.event_kind = 17;
    let bytes = record.encode().unwrap();

    let err = pets_session()
        .replay_context(&bytes, ReaderContext::new())
        .unwrap_err();
    assert!(matches!(err, MarshalError::UnknownEventKind(17)));
}

#[test]
fn test_queues_are_not_persisted() {
    let session = pets_session();
    let ctx = session.new_context(EventKind::Insertion, None, None, None);
    ctx.add_insert_action(ripple::context::action(|_| Ok(())));
    let bytes = write_context(&ctx).unwrap();

    let replayed = session.replay_context(&bytes, ReaderContext::new()).unwrap();
    assert!(replayed.action_queues().is_empty());
}

#[test]
fn test_replayed_update_adapts_as_everything_changed() {
    let source = pets_session();
    let dog = source.registry().class("pets.Dog").unwrap();
    let ctx = source.new_modification_context(
        EventKind::Update,
        None,
        None,
        FactHandle::new(4),
        BitMask::from_positions([0, 2]),
        dog,
    );
    let bytes = write_context(&ctx).unwrap();

    let target = pets_session();
    let mut replayed = target.replay_context(&bytes, ReaderContext::new()).unwrap();
    let pet = target.registry().declared_type("pets.Pet").unwrap();
    let cat = target.registry().declared_type("pets.Cat").unwrap();

    replayed.adapt_mask_for(&pet, &target).unwrap();
    assert!(replayed.modification_mask().is_all());
    assert!(pet.as_class().unwrap().cache().is_empty());

    // A concrete target never sees bits in the lost class's ordering.
    replayed.adapt_mask_for(&cat, &target).unwrap();
    assert!(replayed.modification_mask().is_all());
    assert_eq!(replayed.original_mask(), BitMask::from_positions([0, 2]));
}
