// ABOUTME: Planner - turns a query into an ordered list of deliverable specs.
// ABOUTME: Cleans up engine-proposed keys so every spec key is unique and well formed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deliverable::DeliverableSpec;
use crate::engine::{DraftDeliverable, PlanningEngine};
use crate::error::EngineError;

/// A research plan: the query, a prose outline, and the deliverables in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub query: String,
    pub outline: String,
    pub specs: Vec<DeliverableSpec>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.key().to_string()).collect()
    }
}

/// Derives plans through a planning engine.
pub struct Planner {
    engine: Arc<dyn PlanningEngine>,
}

impl Planner {
    pub fn new(engine: Arc<dyn PlanningEngine>) -> Self {
        Self { engine }
    }

    /// Plan `query`. A query with no numeric asks yields an empty plan.
    pub async fn plan(&self, query: &str) -> Result<Plan, EngineError> {
        let draft = self.engine.draft_plan(query).await?;
        let specs = build_specs(draft.deliverables);
        info!(deliverables = specs.len(), "Plan drafted");
        Ok(Plan {
            query: query.to_string(),
            outline: draft.outline,
            specs,
        })
    }
}

/// Lowercase snake_case: alphanumerics kept, every other run collapsed to `_`.
///
/// Dots are replaced too, since they separate delegated child keys.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

fn derive_key(draft: &DraftDeliverable, index: usize) -> String {
    let key = normalize_key(&draft.key);
    if !key.is_empty() {
        return key;
    }
    let words: Vec<&str> = draft.description.split_whitespace().take(5).collect();
    let key = normalize_key(&words.join(" "));
    if key.is_empty() {
        format!("deliverable_{}", index + 1)
    } else {
        key
    }
}

fn build_specs(drafts: Vec<DraftDeliverable>) -> Vec<DeliverableSpec> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.into_iter().enumerate() {
        let key = derive_key(&draft, index);
        if !seen.insert(key.clone()) {
            debug!(key = %key, "Dropping duplicate deliverable");
            continue;
        }

        let mut spec = DeliverableSpec::new(key, draft.description)
            .with_data_level(draft.data_level)
            .with_data_source(draft.data_source)
            .with_calculation_guidance(draft.calculation_guidance);
        if let Some(unit) = draft.expected_unit {
            spec = spec.with_expected_unit(unit);
        }
        specs.push(spec);
    }
    specs
}
