// ABOUTME: Deliverable store - the only state shared between researcher tasks.
// ABOUTME: Each key accepts exactly one terminal write, enforced per entry.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::deliverable::{
    DeliverableRecord, DeliverableSpec, FailureReason, RecordState, UndeterminedCause,
};
use crate::error::StoreError;
use crate::unit::Quantity;

/// Shared keyed register of deliverable records.
///
/// # Write semantics
///
/// - **Unique registration:** registering a key twice fails with `DuplicateKey`.
/// - **Single terminal write:** `set_resolved`, `set_failed` and
///   `set_undetermined` succeed only from `Unresolved` or `Running`. Any later
///   terminal write fails with `AlreadyTerminal` and leaves the record as is.
/// - **Per-key atomicity:** every transition is a compare-and-set performed
///   while holding only that entry, so writers to distinct keys never contend
///   on a store-wide lock.
///
/// Clones share the same underlying records.
#[derive(Default)]
pub struct DeliverableStore {
    records: Arc<DashMap<String, DeliverableRecord>>,
}

impl DeliverableStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an Unresolved top-level record for `key`.
    pub fn register(&self, key: &str) -> Result<DeliverableRecord, StoreError> {
        self.insert(DeliverableRecord::new(key))
    }

    /// Register an Unresolved record carrying the spec's lineage and expected unit.
    pub fn register_spec(&self, spec: &DeliverableSpec) -> Result<DeliverableRecord, StoreError> {
        self.insert(DeliverableRecord {
            key: spec.key().to_string(),
            parent: spec.parent().map(str::to_string),
            root: spec.root().to_string(),
            depth: spec.depth(),
            expected_unit: spec.expected_unit().cloned(),
            state: RecordState::Unresolved,
        })
    }

    fn insert(&self, record: DeliverableRecord) -> Result<DeliverableRecord, StoreError> {
        match self.records.entry(record.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.key)),
            Entry::Vacant(slot) => {
                debug!(key = %record.key, depth = record.depth, "registered deliverable");
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Get a copy of the record for `key`.
    pub fn get(&self, key: &str) -> Result<DeliverableRecord, StoreError> {
        self.records
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::UnknownKey(key.to_string()))
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Mark a record as picked up by its researcher.
    pub fn start(&self, key: &str) -> Result<(), StoreError> {
        self.transition(key, |record| match record.state {
            RecordState::Unresolved => Ok(RecordState::Running),
            RecordState::Running => Err(StoreError::AlreadyRunning(record.key.clone())),
            _ => Err(already_terminal(record)),
        })
    }

    /// Store the final value, checking it against the record's expected unit.
    ///
    /// On `UnitMismatch` the record is left untouched so the caller can record
    /// the failure with its own reason.
    pub fn set_resolved(&self, key: &str, value: Quantity) -> Result<(), StoreError> {
        self.transition(key, move |record| {
            if let Some(expected) = &record.expected_unit {
                if *expected != value.unit {
                    return Err(StoreError::UnitMismatch {
                        key: record.key.clone(),
                        expected: expected.clone(),
                        actual: value.unit.clone(),
                    });
                }
            }
            Ok(RecordState::Resolved { value })
        })
    }

    /// Record an explicit failure.
    pub fn set_failed(&self, key: &str, reason: FailureReason) -> Result<(), StoreError> {
        self.transition(key, move |_| Ok(RecordState::Failed { reason }))
    }

    /// Record that an attempt ended without a value; the sentinel stays in place.
    pub fn set_undetermined(&self, key: &str, cause: UndeterminedCause) -> Result<(), StoreError> {
        self.transition(key, move |_| Ok(RecordState::Undetermined { cause }))
    }

    /// Mark every non-terminal record descending from `root` as undetermined.
    ///
    /// Used when a top-level task is cancelled from outside. Returns the keys
    /// that were changed.
    pub fn expire_subtree(&self, root: &str, cause: UndeterminedCause) -> Vec<String> {
        let mut expired = Vec::new();
        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            if record.root == root && !record.state.is_terminal() {
                record.state = RecordState::Undetermined {
                    cause: cause.clone(),
                };
                expired.push(record.key.clone());
            }
        }
        expired.sort();
        expired
    }

    /// Copies of all records, sorted by key.
    pub fn snapshot(&self) -> Vec<DeliverableRecord> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compare-and-set on a single entry. `next` sees the current record and
    /// returns the new state; terminal records are rejected before `next` runs.
    fn transition<F>(&self, key: &str, next: F) -> Result<(), StoreError>
    where
        F: FnOnce(&DeliverableRecord) -> Result<RecordState, StoreError>,
    {
        let mut entry = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_string()))?;
        let record = entry.value_mut();

        if record.state.is_terminal() {
            return Err(already_terminal(record));
        }

        let state = next(record)?;
        debug!(key, from = %record.state, to = %state, "deliverable transition");
        record.state = state;
        Ok(())
    }
}

impl Clone for DeliverableStore {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

fn already_terminal(record: &DeliverableRecord) -> StoreError {
    StoreError::AlreadyTerminal {
        key: record.key.clone(),
        state: record.state.to_string(),
    }
}
