//! Smoke coverage for the re-exported API surface.

use std::sync::Arc;

use riffle::spill::{SpillCompression, SpillStore, TempScratch};
use riffle::{
    MemSortedStream, MergeGroupEngine, NaturalKeyOrder, OrderedTupleCodec, SortedStream,
    Tuple, tuple,
};
use riffle_test_utils::init_tracing_for_tests;

#[test]
fn test_store_is_usable_standalone() {
    init_tracing_for_tests();
    let mut store = SpillStore::new(
        2,
        SpillCompression::Gzip,
        Arc::new(OrderedTupleCodec),
        Arc::new(TempScratch::new()),
    )
    .unwrap();

    for i in 0..5i64 {
        store.add(tuple![i]).unwrap();
    }
    assert_eq!(store.spill_count(), 2);

    let replay: Vec<Tuple> = store
        .iter()
        .map(|value| value.unwrap().into_owned())
        .collect();
    assert_eq!(replay, (0..5i64).map(|i| tuple![i]).collect::<Vec<_>>());
}

#[test]
fn test_engine_runs_through_the_facade() {
    init_tracing_for_tests();
    let sources: Vec<Box<dyn SortedStream>> = vec![Box::new(MemSortedStream::new(vec![
        (tuple![1], vec![tuple![1, 0]]),
        (tuple![2], vec![tuple![2, 0]]),
    ]))];
    let mut engine = MergeGroupEngine::with_comparator(sources, NaturalKeyOrder).unwrap();

    let summary = engine.run(|_, _| Ok(())).unwrap();
    assert_eq!(summary.keys_emitted, 2);
    assert_eq!(summary.values_delivered, 2);
}
