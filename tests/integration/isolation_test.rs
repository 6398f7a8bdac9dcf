//! Concurrent dispatches share nothing but configuration.

use std::sync::Arc;

use triggerkit::prelude::*;

use crate::helpers::{TestApp, batch};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_for_different_kinds() {
    let app = TestApp::new(&["a", "b", "c"]);
    app.bind("invoice", &[(1, "a"), (2, "b"), (3, "c")]);
    app.bind("account", &[(1, "c"), (2, "a")]);
    let app = Arc::new(app);

    let mut handles = Vec::new();
    for n in 0..16 {
        let app = app.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let (kind, expected) = if n % 2 == 0 {
                ("invoice", "a>b>c")
            } else {
                ("account", "c>a")
            };
            let outcome = app
                .runtime
                .dispatch(kind, PhaseContext::new(OperationKind::BeforeInsert, batch(5)))
                .unwrap();
            (expected, outcome.records)
        }));
    }

    for handle in handles {
        let (expected, records) = handle.await.unwrap();
        assert_eq!(records.len(), 5);
        for record in records {
            assert_eq!(record.get_str("trail"), Some(expected));
        }
    }

    assert_eq!(app.journal.entries().len(), 8 * 3 + 8 * 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failure_in_one_dispatch_does_not_leak() {
    let app = TestApp::with_failures(
        &["strict", "lenient"],
        &[("strict", OperationKind::BeforeInsert)],
    );
    app.bind("invoice", &[(1, "strict")]);
    app.bind("account", &[(1, "lenient")]);
    let app = Arc::new(app);

    let failing = {
        let app = app.clone();
        tokio::task::spawn_blocking(move || {
            app.runtime
                .dispatch("invoice", PhaseContext::new(OperationKind::BeforeInsert, batch(2)))
        })
    };
    let passing = {
        let app = app.clone();
        tokio::task::spawn_blocking(move || {
            app.runtime
                .dispatch("account", PhaseContext::new(OperationKind::BeforeInsert, batch(2)))
        })
    };

    let failure = failing.await.unwrap().unwrap_err();
    let success = passing.await.unwrap().unwrap();

    assert!(failure.records.iter().all(Record::has_errors));
    assert!(success.records.iter().all(|r| !r.has_errors()));
}

#[test]
fn test_sequential_dispatches_start_fresh() {
    let app = TestApp::with_failures(&["strict"], &[("strict", OperationKind::AfterInsert)]);
    app.bind("invoice", &[(1, "strict")]);

    assert!(app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::AfterInsert, batch(1)))
        .is_err());

    // a new instance per call; nothing carried over
    let outcome = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::BeforeInsert, batch(1)))
        .unwrap();
    assert!(!outcome.records[0].has_errors());
    assert_eq!(outcome.records[0].get_str("trail"), Some("strict"));
}
