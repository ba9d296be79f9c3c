//! The function cache: one live aggregate instance per declaration, scoped
//! to a group or to the whole document.

use crate::aggregate::{Aggregate, AggregateRegistry};
use brass_model::{FunctionDef, ReportLayout};
use log::warn;
use serde_json::Value;

/// One aggregate declaration bound to its running instance.
pub struct FunctionSlot {
    pub def: FunctionDef,
    instance: Box<dyn Aggregate>,
}

impl FunctionSlot {
    pub fn compute(&mut self, value: &Value) {
        self.instance.compute(value);
    }

    pub fn computed_value(&self) -> Value {
        self.instance.computed_value()
    }

    pub fn reset(&mut self) {
        self.instance.reset();
    }
}

/// All aggregate instances of one export: document-scoped slots plus one
/// slot set per group level. Instances are created once at engine
/// construction and live until the export ends.
pub struct FunctionCache {
    document: Vec<FunctionSlot>,
    per_group: Vec<Vec<FunctionSlot>>,
}

impl FunctionCache {
    /// Discovers every aggregate declaration in the layout and creates
    /// its instance. Unknown aggregate names are dropped with a warning;
    /// the cells referencing them will resolve to null.
    pub fn build(layout: &ReportLayout, registry: &AggregateRegistry) -> Self {
        let make_slots = |defs: Vec<FunctionDef>| -> Vec<FunctionSlot> {
            defs.into_iter()
                .filter_map(|def| match registry.create(&def.function) {
                    Some(instance) => Some(FunctionSlot { def, instance }),
                    None => {
                        warn!(
                            "Unknown aggregate function '{}' over '{}'; its cells will render null",
                            def.function, def.source
                        );
                        None
                    }
                })
                .collect()
        };

        let document = make_slots(layout.document_functions());
        let per_group = (0..layout.groups.len())
            .map(|level| make_slots(layout.group_functions(level)))
            .collect();
        Self { document, per_group }
    }

    /// Resets the slots owned by one group, for its (re)start.
    pub fn reset_group(&mut self, level: usize) {
        for slot in &mut self.per_group[level] {
            slot.reset();
        }
    }

    /// Resets everything, so the real pass starts like the pre-pass did.
    pub fn reset_all(&mut self) {
        for slot in &mut self.document {
            slot.reset();
        }
        for group in &mut self.per_group {
            for slot in group {
                slot.reset();
            }
        }
    }

    /// Every slot in a fixed order (document first, then groups outermost
    /// to innermost).
    pub fn slots(&self) -> impl Iterator<Item = &FunctionSlot> {
        self.document.iter().chain(self.per_group.iter().flatten())
    }

    /// Every slot, mutably, in the same order as `slots`.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut FunctionSlot> {
        self.document
            .iter_mut()
            .chain(self.per_group.iter_mut().flatten())
    }

    pub fn group_slots(&self, level: usize) -> &[FunctionSlot] {
        &self.per_group[level]
    }

    pub fn document_slots(&self) -> &[FunctionSlot] {
        &self.document
    }

    /// Resolves a (function, source) reference from the given scope: the
    /// named group level first, then enclosing levels, then the document
    /// slots.
    pub fn lookup(&self, scope: Option<usize>, def: &FunctionDef) -> Option<&FunctionSlot> {
        let key = def.key();
        if let Some(level) = scope {
            for l in (0..=level).rev() {
                if let Some(slot) = self.per_group[l].iter().find(|s| s.def.key() == key) {
                    return Some(slot);
                }
            }
        }
        self.document.iter().find(|s| s.def.key() == key)
    }
}
