//! Runtimes built from configuration and TOML registration documents.

use std::fs;

use serde_json::json;
use tempfile::TempDir;
use triggerkit::prelude::*;
use triggerkit::{AppConfig, DispatchError, TriggerRuntime, default_constructors, init_logging};

const REGISTRATIONS: &str = r#"
[[kinds]]
kind = "invoice"
bypass_permission = "skip_invoice_rules"

[[registrations]]
target_kind = "invoice"
order_key = 10
constructor_ref = "field_rules.defaults"
additional_data = '{"status": "draft"}'
phases = ["before_insert"]

[[registrations]]
target_kind = "invoice"
order_key = 20
constructor_ref = "field_rules.required"
additional_data = '["status", "amount"]'
phases = ["before_insert", "before_update"]
"#;

fn runtime_for(document: &str) -> (TempDir, TriggerRuntime) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registrations.toml");
    fs::write(&path, document).unwrap();

    let mut config = AppConfig::default();
    config.dispatch.registrations_file = Some(path.to_string_lossy().into_owned());

    let runtime = TriggerRuntime::new(config, default_constructors().unwrap()).unwrap();
    (dir, runtime)
}

fn new_invoice() -> PhaseContext {
    PhaseContext::new(
        OperationKind::BeforeInsert,
        vec![Record::new().with_field("amount", json!(99))],
    )
}

#[test]
fn test_file_registrations_drive_dispatch() {
    let (_dir, runtime) = runtime_for(REGISTRATIONS);

    let outcome = runtime.dispatch("invoice", new_invoice()).unwrap();
    assert_eq!(outcome.invoked, 2);
    assert_eq!(outcome.records[0].get_str("status"), Some("draft"));

    // defaults are limited to inserts
    let update = PhaseContext::new(OperationKind::BeforeUpdate, vec![Record::new()]);
    let failure = runtime.dispatch("invoice", update).unwrap_err();
    assert_eq!(failure.error.constructor_ref(), Some("field_rules.required"));
}

#[test]
fn test_kind_bypass_permission_from_file() {
    let (_dir, runtime) = runtime_for(REGISTRATIONS);

    let context = PhaseContext::new(OperationKind::BeforeInsert, vec![Record::new()])
        .with_permissions(["skip_invoice_rules"]);
    let outcome = runtime.dispatch("invoice", context).unwrap();

    assert_eq!(outcome.invoked, 0);
    assert!(!outcome.records[0].has_value("status"));
}

#[test]
fn test_file_edits_apply_on_next_dispatch() {
    let (dir, runtime) = runtime_for(REGISTRATIONS);
    assert!(runtime.dispatch("invoice", new_invoice()).is_ok());

    fs::write(
        dir.path().join("registrations.toml"),
        r#"
[[registrations]]
target_kind = "invoice"
order_key = 1
constructor_ref = "field_rules.archived"
"#,
    )
    .unwrap();

    let failure = runtime.dispatch("invoice", new_invoice()).unwrap_err();
    assert!(matches!(failure.error, DispatchError::Configuration { .. }));
    assert!(failure.to_string().contains("field_rules.archived"));
}

#[test]
fn test_malformed_row_only_fails_its_own_kind() {
    let document = format!(
        "{REGISTRATIONS}{}",
        r#"
[[registrations]]
target_kind = "account"
order_key = "ten"
constructor_ref = "field_rules.defaults"

[[registrations]]
target_kind = "account"
constructor_ref = "field_rules.required"
"#
    );
    let (_dir, runtime) = runtime_for(&document);

    let outcome = runtime.dispatch("invoice", new_invoice()).unwrap();
    assert_eq!(outcome.invoked, 2);

    let failure = runtime
        .dispatch(
            "account",
            PhaseContext::new(OperationKind::BeforeInsert, vec![Record::new()]),
        )
        .unwrap_err();
    assert!(matches!(
        failure.error,
        DispatchError::Configuration { ref kind, .. } if kind == "account"
    ));
    assert_eq!(failure.records[0].errors().len(), 1);
}

#[test]
fn test_malformed_document_fails_dispatch() {
    let (_dir, runtime) = runtime_for("[[registrations]]\ntarget_kind = ");

    let failure = runtime.dispatch("invoice", new_invoice()).unwrap_err();
    assert!(matches!(failure.error, DispatchError::Configuration { .. }));
    assert_eq!(failure.records[0].errors().len(), 1);
}

#[test]
fn test_missing_document_fails_dispatch() {
    let mut config = AppConfig::default();
    config.dispatch.registrations_file = Some("/nonexistent/registrations.toml".into());
    let runtime = TriggerRuntime::new(config, default_constructors().unwrap()).unwrap();

    assert!(runtime.dispatch("invoice", new_invoice()).is_err());
}

#[test]
fn test_custom_extension_point() {
    let config = AppConfig::from_toml_str(
        r#"
[dispatch]
extension_point = "billing_action"
warn_on_order_ties = false
"#,
    )
    .unwrap();
    assert_eq!(config.dispatch.extension_point, "billing_action");

    let source = std::sync::Arc::new(triggerkit::MemorySource::new());
    // field rules satisfy the default extension point only
    let mut row = RegistrationRow::new("invoice", 1, triggerkit::field_rules::DEFAULTS);
    row.extension_point = "billing_action".into();
    source.add(row);

    let runtime =
        TriggerRuntime::with_source(config, default_constructors().unwrap(), source).unwrap();
    assert_eq!(runtime.engine().extension_point(), "billing_action");

    let failure = runtime.dispatch("invoice", new_invoice()).unwrap_err();
    assert!(failure.to_string().contains("billing_action"));
}

#[test]
fn test_logging_installs_once() {
    let config = AppConfig::from_toml_str(
        r#"
[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    init_logging(&config.logging).unwrap();
    assert!(init_logging(&config.logging).is_err());
}
