// ABOUTME: DeliverableSpec - the immutable request for resolving one deliverable.
// ABOUTME: Child specs are derived field by field so nothing is dropped on delegation.

use serde::{Deserialize, Serialize};

use crate::unit::Unit;

/// Granularity of the data a deliverable needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLevel {
    /// Individual facts looked up directly from a source.
    #[default]
    Raw,
    /// Totals or summaries across several facts.
    Aggregate,
    /// Values computed from other values.
    Derived,
}

/// Description and resolution metadata for one deliverable.
///
/// Built once by the planner or by a researcher delegating a sub-deliverable,
/// then never mutated. Fields are private; use the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableSpec {
    key: String,
    description: String,
    data_level: DataLevel,
    data_source: String,
    calculation_guidance: String,
    expected_unit: Option<Unit>,
    depth: usize,
    parent: Option<String>,
    root: String,
}

/// Fields a delegating researcher supplies for a child spec.
///
/// `None` carries the parent's value over. `expected_unit` is doubly optional:
/// `None` inherits, `Some(None)` clears, `Some(Some(u))` sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecOverrides {
    pub description: String,
    #[serde(default)]
    pub data_level: Option<DataLevel>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub calculation_guidance: Option<String>,
    #[serde(default)]
    pub expected_unit: Option<Option<Unit>>,
}

impl SpecOverrides {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn data_level(mut self, level: DataLevel) -> Self {
        self.data_level = Some(level);
        self
    }

    pub fn data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn calculation_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.calculation_guidance = Some(guidance.into());
        self
    }

    pub fn expected_unit(mut self, unit: Option<Unit>) -> Self {
        self.expected_unit = Some(unit);
        self
    }
}

impl DeliverableSpec {
    /// Create a top-level (depth 0) spec.
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            root: key.clone(),
            key,
            description: description.into(),
            data_level: DataLevel::default(),
            data_source: String::new(),
            calculation_guidance: String::new(),
            expected_unit: None,
            depth: 0,
            parent: None,
        }
    }

    pub fn with_data_level(mut self, level: DataLevel) -> Self {
        self.data_level = level;
        self
    }

    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = source.into();
        self
    }

    pub fn with_calculation_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.calculation_guidance = guidance.into();
        self
    }

    pub fn with_expected_unit(mut self, unit: impl Into<Unit>) -> Self {
        self.expected_unit = Some(unit.into());
        self
    }

    /// Derive the spec for a delegated sub-deliverable one level deeper.
    ///
    /// Both the overrides and the result are spelled out field by field with
    /// no `..` rest pattern: adding a field to either type fails to compile
    /// here until the new field's propagation is decided.
    pub fn child(&self, key: impl Into<String>, overrides: SpecOverrides) -> DeliverableSpec {
        let SpecOverrides {
            description,
            data_level,
            data_source,
            calculation_guidance,
            expected_unit,
        } = overrides;

        DeliverableSpec {
            key: key.into(),
            description,
            data_level: data_level.unwrap_or(self.data_level),
            data_source: data_source.unwrap_or_else(|| self.data_source.clone()),
            calculation_guidance: calculation_guidance
                .unwrap_or_else(|| self.calculation_guidance.clone()),
            expected_unit: expected_unit.unwrap_or_else(|| self.expected_unit.clone()),
            depth: self.depth + 1,
            parent: Some(self.key.clone()),
            root: self.root.clone(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_level(&self) -> DataLevel {
        self.data_level
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn calculation_guidance(&self) -> &str {
        &self.calculation_guidance
    }

    pub fn expected_unit(&self) -> Option<&Unit> {
        self.expected_unit.as_ref()
    }

    /// Recursion level, 0 for planner-produced specs.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Key of the delegating spec, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Key of the top-level spec this one descends from (itself at depth 0).
    pub fn root(&self) -> &str {
        &self.root
    }
}
