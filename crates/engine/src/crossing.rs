//! The forward-reference resolver.
//!
//! A header-region aggregate needs a value only known after rows the
//! header precedes. When a layout declares such a reference, the engine
//! runs one complete silent pass first, recording every header-visible
//! aggregate's final value here, keyed by the group instance it belongs
//! to. The real pass consults this cache instead of the live (and at that
//! point incomplete) aggregate, and never mutates it.

use brass_model::FunctionDef;
use serde_json::Value;
use std::collections::HashMap;

/// Identifies one cached forward-reference value.
///
/// An explicit struct key keeps collision-freedom auditable: the same
/// (function, source) under different group breadcrumbs, or the same
/// breadcrumb with different break values, can never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossingKey {
    /// Outer groups' break values at the time the instance opened,
    /// outermost first. Empty for document-level references.
    pub breadcrumb: Vec<String>,
    /// Aggregate name, lowercased.
    pub function: String,
    /// Source column or expression text.
    pub source: String,
    /// The owning group's break value at first encounter, or a fixed
    /// sentinel for document-level references.
    pub break_value: String,
}

const DOCUMENT_SENTINEL: &str = "$document";

impl CrossingKey {
    pub fn for_group(breadcrumb: Vec<String>, def: &FunctionDef, break_value: String) -> Self {
        let (function, source) = def.key();
        Self { breadcrumb, function, source, break_value }
    }

    pub fn for_document(def: &FunctionDef) -> Self {
        let (function, source) = def.key();
        Self {
            breadcrumb: Vec::new(),
            function,
            source,
            break_value: DOCUMENT_SENTINEL.to_string(),
        }
    }
}

/// The pre-pass product: key → final aggregate value.
#[derive(Debug, Default)]
pub struct CrossingCache {
    entries: HashMap<CrossingKey, Value>,
    /// True once a completed pre-pass has populated the cache.
    resolved: bool,
}

impl CrossingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the real pass should consult this cache at all.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub fn record(&mut self, key: CrossingKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &CrossingKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache contents, used by the idempotence tests.
    pub fn snapshot(&self) -> Vec<(CrossingKey, Value)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            (&a.breadcrumb, &a.function, &a.source, &a.break_value).cmp(&(
                &b.breadcrumb,
                &b.function,
                &b.source,
                &b.break_value,
            ))
        });
        entries
    }
}
