//! Fail-fast, fail-all semantics.

use triggerkit::prelude::*;
use triggerkit::{DispatchError, ErrorKind, RegistrationRow};

use crate::helpers::{TestApp, batch};

#[test]
fn test_failing_plugin_stops_walk_and_marks_every_record() {
    let app = TestApp::with_failures(
        &["first", "second", "third"],
        &[("second", OperationKind::BeforeInsert)],
    );
    app.bind("invoice", &[(1, "first"), (2, "second"), (3, "third")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::BeforeInsert, batch(3)))
        .unwrap_err();

    // third never ran
    assert_eq!(app.journal.plugins(), vec!["first", "second"]);

    assert_eq!(failure.records.len(), 3);
    assert_eq!(failure.failed_ids().len(), 3);
    for record in &failure.records {
        assert_eq!(record.errors().len(), 1);
        let entry = &record.errors()[0];
        assert!(entry.message.contains("second rejected the batch"));
        assert_eq!(entry.origin.as_deref(), Some("second"));
    }

    match &failure.error {
        DispatchError::Execution {
            constructor_ref,
            order_key,
            operation,
            source,
        } => {
            assert_eq!(constructor_ref, "second");
            assert_eq!(*order_key, 2);
            assert_eq!(*operation, OperationKind::BeforeInsert);
            assert_eq!(source.kind, ErrorKind::Plugin);
        }
        other => panic!("expected execution failure, got {other:?}"),
    }
}

#[test]
fn test_mutations_before_failure_are_kept() {
    let app = TestApp::with_failures(
        &["first", "second"],
        &[("second", OperationKind::BeforeInsert)],
    );
    app.bind("invoice", &[(1, "first"), (2, "second")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::BeforeInsert, batch(1)))
        .unwrap_err();

    assert_eq!(failure.records[0].get_str("trail"), Some("first>second"));
}

#[test]
fn test_after_phase_failure_is_fail_all() {
    let app = TestApp::with_failures(
        &["ledger", "mailer"],
        &[("ledger", OperationKind::AfterUpdate)],
    );
    app.bind("invoice", &[(1, "ledger"), (2, "mailer")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::AfterUpdate, batch(2)))
        .unwrap_err();

    assert_eq!(app.journal.plugins(), vec!["ledger"]);
    assert!(failure.records.iter().all(|r| r.errors().len() == 1));
    assert_eq!(failure.operation, OperationKind::AfterUpdate);
}

#[test]
fn test_construction_failure_is_fail_all() {
    let app = TestApp::new(&["audit", "notify"]);
    app.bind("invoice", &[(1, "audit"), (3, "notify")]);
    // required fields without data cannot be constructed
    app.source
        .add(RegistrationRow::new("invoice", 2, triggerkit::field_rules::REQUIRED));

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::BeforeInsert, batch(2)))
        .unwrap_err();

    assert_eq!(app.journal.plugins(), vec!["audit"]);
    assert!(matches!(
        failure.error,
        DispatchError::Construction { order_key: 2, .. }
    ));
    assert_eq!(failure.error.constructor_ref(), Some("field_rules.required"));
    assert!(failure.records.iter().all(Record::has_errors));
}

#[test]
fn test_unresolved_constructor_fails_before_any_plugin_runs() {
    let app = TestApp::new(&["audit"]);
    app.bind("invoice", &[(1, "audit"), (2, "retired_plugin")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::AfterInsert, batch(2)))
        .unwrap_err();

    assert!(app.journal.entries().is_empty());
    assert!(matches!(
        failure.error,
        DispatchError::Configuration { ref kind, .. } if kind == "invoice"
    ));
    assert!(failure.to_string().contains("retired_plugin"));
    for record in &failure.records {
        assert_eq!(record.errors().len(), 1);
        assert_eq!(record.errors()[0].origin, None);
    }
}

#[test]
fn test_failure_converts_to_app_error() {
    let app = TestApp::with_failures(&["strict"], &[("strict", OperationKind::BeforeDelete)]);
    app.bind("invoice", &[(1, "strict")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::BeforeDelete, batch(1)))
        .unwrap_err();

    let err: triggerkit::AppError = failure.error.into();
    assert_eq!(err.kind, ErrorKind::Plugin);
}

#[test]
fn test_empty_batch_failure_has_no_records() {
    let app = TestApp::with_failures(&["strict"], &[("strict", OperationKind::AfterDelete)]);
    app.bind("invoice", &[(1, "strict")]);

    let failure = app
        .runtime
        .dispatch("invoice", PhaseContext::new(OperationKind::AfterDelete, vec![]))
        .unwrap_err();

    assert!(failure.records.is_empty());
    assert!(failure.failed_ids().is_empty());
}
