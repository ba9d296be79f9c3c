//! The group state machine: break detection, cascade, and row counters.

use brass_types::{display_string, values_equal};
use serde_json::{Map, Value};

/// Mutable state for one nesting level.
#[derive(Debug)]
struct GroupState {
    column: String,
    /// The break value captured when the group last opened.
    break_value: Value,
    /// Occurrences since the group last started.
    group_row: usize,
    open: bool,
}

/// Tracks, for each nested group level, whether the group just started,
/// continues, or just ended, plus the per-level row counters.
///
/// Break cascade: a group is finished relative to a row transition if its
/// own break column changed **or** any shallower group is finished.
/// Detection therefore walks outermost-first and stops at the first
/// change; everything at or below that level closes.
#[derive(Debug)]
pub struct GroupTracker {
    states: Vec<GroupState>,
    document_group_row: usize,
}

impl GroupTracker {
    pub fn new(break_columns: &[String]) -> Self {
        let states = break_columns
            .iter()
            .map(|column| GroupState {
                column: column.clone(),
                break_value: Value::Null,
                group_row: 0,
                open: false,
            })
            .collect();
        Self { states, document_group_row: 0 }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The outermost level whose break value differs between the previous
    /// row and this one. Every level at or inside it is finished.
    pub fn first_finished_level(&self, row: &Map<String, Value>) -> Option<usize> {
        self.states.iter().position(|state| {
            let current = row.get(&state.column).cloned().unwrap_or(Value::Null);
            !values_equal(&state.break_value, &current)
        })
    }

    /// Whether one level is finished by the cascade rule.
    pub fn is_group_finished(&self, level: usize, row: &Map<String, Value>) -> bool {
        self.first_finished_level(row).is_some_and(|first| level >= first)
    }

    /// Marks a group (re)started on the given row: captures its break
    /// value, zeroes its row counter, and bumps the counter of the scope
    /// that contains it.
    pub fn group_started(&mut self, level: usize, row: &Map<String, Value>) {
        let value = row
            .get(&self.states[level].column)
            .cloned()
            .unwrap_or(Value::Null);
        let state = &mut self.states[level];
        state.break_value = value;
        state.group_row = 0;
        state.open = true;
        match level.checked_sub(1) {
            Some(outer) => self.states[outer].group_row += 1,
            None => self.document_group_row += 1,
        }
    }

    pub fn group_finished(&mut self, level: usize) {
        self.states[level].open = false;
    }

    pub fn is_open(&self, level: usize) -> bool {
        self.states.get(level).is_some_and(|s| s.open)
    }

    /// Counts one detail row against the innermost open scope.
    pub fn detail_row(&mut self) {
        match self.states.iter_mut().rev().find(|s| s.open) {
            Some(state) => state.group_row += 1,
            None => self.document_group_row += 1,
        }
    }

    /// The row counter a `GROUP_ROW` variable reads: the innermost open
    /// group's, or the document's when no groups are declared.
    pub fn innermost_group_row(&self) -> usize {
        self.states
            .iter()
            .rev()
            .find(|s| s.open)
            .map(|s| s.group_row)
            .unwrap_or(self.document_group_row)
    }

    /// The break value the given level captured when it opened.
    pub fn break_value(&self, level: usize) -> &Value {
        &self.states[level].break_value
    }

    /// Break values of every level outside `level`, outermost first,
    /// rendered as display strings. This is the structural prefix of a
    /// forward-reference cache key.
    pub fn breadcrumb(&self, level: usize) -> Vec<String> {
        self.states[..level]
            .iter()
            .map(|s| display_string(&s.break_value))
            .collect()
    }

    /// Forgets everything, so the real pass starts from the same state
    /// the pre-pass did.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.break_value = Value::Null;
            state.group_row = 0;
            state.open = false;
        }
        self.document_group_row = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(region: &str, city: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("region".into(), json!(region));
        m.insert("city".into(), json!(city));
        m
    }

    fn tracker() -> GroupTracker {
        GroupTracker::new(&["region".into(), "city".into()])
    }

    #[test]
    fn test_inner_break_leaves_outer_open() {
        let mut t = tracker();
        let first = row("north", "oslo");
        t.group_started(0, &first);
        t.group_started(1, &first);

        let next = row("north", "bergen");
        assert_eq!(t.first_finished_level(&next), Some(1));
        assert!(!t.is_group_finished(0, &next));
        assert!(t.is_group_finished(1, &next));
    }

    #[test]
    fn test_outer_break_cascades_to_inner() {
        let mut t = tracker();
        let first = row("north", "oslo");
        t.group_started(0, &first);
        t.group_started(1, &first);

        // Inner value unchanged, but the outer break still closes it.
        let next = row("south", "oslo");
        assert_eq!(t.first_finished_level(&next), Some(0));
        assert!(t.is_group_finished(1, &next));
    }

    #[test]
    fn test_group_row_counters() {
        let mut t = tracker();
        let first = row("north", "oslo");
        t.group_started(0, &first);
        t.group_started(1, &first);
        t.detail_row();
        t.detail_row();
        assert_eq!(t.innermost_group_row(), 2);

        // Restarting the inner group zeroes its counter and credits the
        // outer group with one occurrence.
        let next = row("north", "bergen");
        t.group_finished(1);
        t.group_started(1, &next);
        assert_eq!(t.innermost_group_row(), 0);
    }

    #[test]
    fn test_breadcrumb_is_outer_break_values() {
        let mut t = tracker();
        let first = row("north", "oslo");
        t.group_started(0, &first);
        t.group_started(1, &first);
        assert_eq!(t.breadcrumb(1), vec!["north".to_string()]);
        assert!(t.breadcrumb(0).is_empty());
    }

    #[test]
    fn test_no_groups_counts_against_document() {
        let mut t = GroupTracker::new(&[]);
        t.detail_row();
        t.detail_row();
        assert_eq!(t.innermost_group_row(), 2);
    }
}
