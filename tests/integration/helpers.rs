//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use triggerkit::prelude::*;
use triggerkit::{AppConfig, MemorySource, TriggerRuntime};

/// One plugin method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Plugin name.
    pub plugin: String,
    /// Phase invoked.
    pub operation: OperationKind,
    /// Number of records the plugin saw.
    pub records: usize,
    /// Number of prior state entries the plugin saw.
    pub prior: usize,
}

/// Append-only log of invocations, in invocation order.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Invocation>>>);

impl Journal {
    pub fn push(&self, invocation: Invocation) {
        self.0.lock().unwrap().push(invocation);
    }

    pub fn entries(&self) -> Vec<Invocation> {
        self.0.lock().unwrap().clone()
    }

    pub fn plugins(&self) -> Vec<String> {
        self.entries().into_iter().map(|i| i.plugin).collect()
    }
}

/// Plugin that journals every phase and optionally fails one of them.
struct RecordingPlugin {
    name: String,
    journal: Journal,
    fail_on: Option<OperationKind>,
}

impl RecordingPlugin {
    fn record(&self, operation: OperationKind, records: usize, prior: usize) -> AppResult<()> {
        self.journal.push(Invocation {
            plugin: self.name.clone(),
            operation,
            records,
            prior,
        });
        match self.fail_on {
            Some(op) if op == operation => Err(AppError::plugin(format!(
                "{} rejected the batch",
                self.name
            ))),
            _ => Ok(()),
        }
    }
}

impl PluginInstance for RecordingPlugin {
    fn before_insert(&mut self, records: &mut [Record]) -> AppResult<()> {
        for record in records.iter_mut() {
            let trail = record
                .get_str("trail")
                .map(|t| format!("{t}>{}", self.name))
                .unwrap_or_else(|| self.name.clone());
            record.set("trail", serde_json::json!(trail));
        }
        self.record(OperationKind::BeforeInsert, records.len(), 0)
    }

    fn after_insert(&mut self, records: &[Record]) -> AppResult<()> {
        self.record(OperationKind::AfterInsert, records.len(), 0)
    }

    fn before_update(&mut self, records: &mut [Record], prior: &PriorState) -> AppResult<()> {
        self.record(OperationKind::BeforeUpdate, records.len(), prior.len())
    }

    fn after_update(&mut self, records: &[Record], prior: &PriorState) -> AppResult<()> {
        self.record(OperationKind::AfterUpdate, records.len(), prior.len())
    }

    fn before_delete(&mut self, records: &[Record]) -> AppResult<()> {
        self.record(OperationKind::BeforeDelete, records.len(), 0)
    }

    fn after_delete(&mut self, records: &[Record]) -> AppResult<()> {
        self.record(OperationKind::AfterDelete, records.len(), 0)
    }

    fn after_undelete(&mut self, records: &[Record]) -> AppResult<()> {
        self.record(OperationKind::AfterUndelete, records.len(), 0)
    }
}

/// Constructor for a journaling plugin that fails in `fail_on`.
pub fn failing_on(
    name: &str,
    journal: &Journal,
    fail_on: Option<OperationKind>,
) -> Arc<FnConstructor> {
    let name = name.to_string();
    let journal = journal.clone();
    Arc::new(FnConstructor::new(move |_, _, _| {
        Ok(Box::new(RecordingPlugin {
            name: name.clone(),
            journal: journal.clone(),
            fail_on,
        }))
    }))
}

/// A runtime over an in-memory source plus a shared journal.
pub struct TestApp {
    pub runtime: TriggerRuntime,
    pub source: Arc<MemorySource>,
    pub journal: Journal,
}

impl TestApp {
    /// Registers a journaling plugin for every name.
    pub fn new(plugins: &[&str]) -> Self {
        Self::with_failures(plugins, &[])
    }

    /// Like [`new`](Self::new), with some plugins failing in a phase.
    pub fn with_failures(plugins: &[&str], failures: &[(&str, OperationKind)]) -> Self {
        let journal = Journal::default();
        let mut constructors = triggerkit::default_constructors().unwrap();

        for name in plugins {
            let fail_on = failures
                .iter()
                .find(|(failing, _)| failing == name)
                .map(|(_, op)| *op);
            constructors
                .register(*name, failing_on(name, &journal, fail_on))
                .unwrap();
        }

        let source = Arc::new(MemorySource::new());
        let runtime =
            TriggerRuntime::with_source(AppConfig::default(), constructors, source.clone())
                .unwrap();

        Self {
            runtime,
            source,
            journal,
        }
    }

    /// Registers plugins for a kind with the given order keys.
    pub fn bind(&self, kind: &str, bindings: &[(i32, &str)]) {
        for (order_key, plugin) in bindings {
            self.source
                .add(RegistrationRow::new(kind, *order_key, plugin));
        }
    }
}

/// A batch of identified records.
pub fn batch(n: usize) -> Vec<Record> {
    (0..n).map(|_| Record::with_id(RecordId::new())).collect()
}
