//! Assembles the blended namespace an expression evaluates against.
//!
//! Four reserved roots: `var` (report variables), `param` (bound
//! parameters), `col` (current row's columns) and `agg` (in-scope
//! aggregate values). Columns and aggregates are bound lazily — only when
//! the expression text actually mentions their prefix — so a band with no
//! column access (static header text, say) never requires a current row.

use brass_model::ReportVariable;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// The token that triggers column binding.
pub const COLUMN_TOKEN: &str = "col.";
/// The token that triggers aggregate binding.
pub const AGGREGATE_TOKEN: &str = "agg.";

/// Placeholder normalisation for names containing spaces, applied
/// consistently on both registration and lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Everything the variable namespace is built from.
pub struct NamespaceInput<'a> {
    pub row: &'a Map<String, Value>,
    pub params: &'a HashMap<String, Value>,
    pub report_name: &'a str,
    /// Position in the underlying result, 1-based.
    pub result_row: usize,
    /// Occurrences since the innermost group last started.
    pub group_row: usize,
    /// Current page, 1-based.
    pub page_no: usize,
    /// When the sink paginates natively, page variables are bound to
    /// their verbatim tokens so the sink substitutes them at paint time.
    pub pagination_tokens: bool,
}

impl NamespaceInput<'_> {
    /// The value of one report variable under the current position.
    pub fn variable(&self, variable: ReportVariable) -> Value {
        match variable {
            ReportVariable::Row => json!(self.result_row),
            ReportVariable::GroupRow => json!(self.group_row),
            ReportVariable::PageNo => {
                if self.pagination_tokens {
                    json!(variable.token())
                } else {
                    json!(self.page_no)
                }
            }
            ReportVariable::PageCount => {
                if self.pagination_tokens {
                    json!(variable.token())
                } else {
                    // Only knowable after full pagination; sinks that need
                    // it live must track pages themselves.
                    Value::Null
                }
            }
            ReportVariable::ReportName => json!(self.report_name),
        }
    }
}

/// Builds the namespace object for one evaluation. `agg_namespace` is
/// invoked only when the text references the aggregate prefix; the caller
/// decides which cache (live or forward-reference) backs it.
pub fn build_namespace(
    text: &str,
    input: &NamespaceInput,
    agg_namespace: &mut dyn FnMut() -> Value,
) -> Value {
    let mut root = Map::new();

    let mut vars = Map::new();
    for variable in [
        ReportVariable::Row,
        ReportVariable::GroupRow,
        ReportVariable::PageNo,
        ReportVariable::PageCount,
        ReportVariable::ReportName,
    ] {
        vars.insert(variable.key().to_string(), input.variable(variable));
    }
    root.insert("var".to_string(), Value::Object(vars));

    let mut params = Map::new();
    for (name, value) in input.params {
        params.insert(normalize_name(name), value.clone());
    }
    root.insert("param".to_string(), Value::Object(params));

    if text.contains(COLUMN_TOKEN) {
        let mut cols = Map::new();
        for (name, value) in input.row {
            cols.insert(normalize_name(name), value.clone());
        }
        root.insert("col".to_string(), Value::Object(cols));
    }

    if text.contains(AGGREGATE_TOKEN) {
        root.insert("agg".to_string(), agg_namespace());
    }

    Value::Object(root)
}

/// Inserts one aggregate value into an `agg` namespace object as
/// `agg.<function>.<source>`. Later insertions win, so callers insert
/// outer scopes first and the nearest enclosing scope last.
pub fn insert_aggregate(agg: &mut Map<String, Value>, function: &str, source: &str, value: Value) {
    let entry = agg
        .entry(function.to_lowercase())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(by_source) = entry {
        by_source.insert(normalize_name(source), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        row: &'a Map<String, Value>,
        params: &'a HashMap<String, Value>,
    ) -> NamespaceInput<'a> {
        NamespaceInput {
            row,
            params,
            report_name: "orders",
            result_row: 3,
            group_row: 1,
            page_no: 2,
            pagination_tokens: false,
        }
    }

    #[test]
    fn test_columns_bound_only_when_referenced() {
        let mut row = Map::new();
        row.insert("amount".into(), json!(10));
        let params = HashMap::new();
        let mut no_agg = || Value::Null;

        let with = build_namespace("col.amount + 1", &input(&row, &params), &mut no_agg);
        assert_eq!(with.get("col").and_then(|c| c.get("amount")), Some(&json!(10)));

        let without = build_namespace("var.ROW", &input(&row, &params), &mut no_agg);
        assert!(without.get("col").is_none());
    }

    #[test]
    fn test_space_names_normalised() {
        let mut row = Map::new();
        row.insert("unit price".into(), json!(4.5));
        let params = HashMap::new();
        let mut no_agg = || Value::Null;
        let ns = build_namespace("col.unit_price", &input(&row, &params), &mut no_agg);
        assert_eq!(ns.get("col").and_then(|c| c.get("unit_price")), Some(&json!(4.5)));
    }

    #[test]
    fn test_aggregates_lazy_and_nested() {
        let row = Map::new();
        let params = HashMap::new();
        let mut called = false;
        let mut agg = || {
            called = true;
            let mut m = Map::new();
            insert_aggregate(&mut m, "SUM", "amount", json!(60));
            Value::Object(m)
        };
        let ns = build_namespace("agg.sum.amount", &input(&row, &params), &mut agg);
        assert!(called);
        assert_eq!(
            ns.get("agg").and_then(|a| a.get("sum")).and_then(|s| s.get("amount")),
            Some(&json!(60))
        );
    }

    #[test]
    fn test_page_tokens_passed_through_verbatim() {
        let row = Map::new();
        let params = HashMap::new();
        let mut no_agg = || Value::Null;
        let mut i = input(&row, &params);
        i.pagination_tokens = true;
        let ns = build_namespace("var.PAGE_NO", &i, &mut no_agg);
        assert_eq!(
            ns.get("var").and_then(|v| v.get("PAGE_NO")),
            Some(&json!("var.PAGE_NO"))
        );
        assert_eq!(
            ns.get("var").and_then(|v| v.get("PAGE_COUNT")),
            Some(&json!("var.PAGE_COUNT"))
        );
    }

    #[test]
    fn test_live_page_number() {
        let row = Map::new();
        let params = HashMap::new();
        let mut no_agg = || Value::Null;
        let ns = build_namespace("var.PAGE_NO", &input(&row, &params), &mut no_agg);
        assert_eq!(ns.get("var").and_then(|v| v.get("PAGE_NO")), Some(&json!(2)));
        assert_eq!(ns.get("var").and_then(|v| v.get("PAGE_COUNT")), Some(&Value::Null));
    }
}
