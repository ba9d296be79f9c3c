//! Conditional style resolution for one cell instance.
//!
//! Order of precedence: the cell's static style, then row-level rules in
//! declared order, then cell-level rules in declared order. Later rules
//! win over earlier ones per property; cell rules win over row rules per
//! property. A rule only fires when its operand and candidate are of
//! compatible types — a mismatch is a silent no-op for that rule.

use brass_model::{CompareOp, ConditionalRule};
use brass_style::{Border, BorderEdges, CellStyle, StyleOverride};
use brass_types::as_number;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::cmp::Ordering;

/// A rule paired with the value it is judged against: the row expression's
/// result for row-level rules that declare one, otherwise the raw
/// candidate value of the cell being styled.
pub struct RuleCandidate<'a> {
    pub rule: &'a ConditionalRule,
    pub candidate: Value,
}

/// Computes the effective style for one cell instance.
///
/// `col`/`column_count` locate the cell within its band row; row-level
/// border overrides suppress interior vertical edges so a row border
/// renders as one rectangle rather than N cell rectangles.
pub fn resolve_style(
    base: &CellStyle,
    row_rules: &[RuleCandidate],
    cell_rules: &[RuleCandidate],
    col: usize,
    column_count: usize,
) -> CellStyle {
    let mut style = base.clone();

    for rc in row_rules {
        if rule_fires(rc.rule.op, &rc.candidate, &rc.rule.operand) {
            apply_row_override(&mut style, &rc.rule.set, col, column_count);
        }
    }
    for rc in cell_rules {
        if rule_fires(rc.rule.op, &rc.candidate, &rc.rule.operand) {
            style.apply(&rc.rule.set);
        }
    }
    style
}

fn apply_row_override(style: &mut CellStyle, patch: &StyleOverride, col: usize, column_count: usize) {
    let StyleOverride { border, .. } = patch;
    style.apply(&StyleOverride { border: None, ..patch.clone() });
    if let Some(border) = border {
        style.borders = Some(row_border_edges(border, col, column_count));
    }
}

/// Row borders keep top/bottom on every cell but only the outer vertical
/// edges: no left edge except on the first column, no right edge except
/// on the last.
fn row_border_edges(border: &Border, col: usize, column_count: usize) -> BorderEdges {
    BorderEdges {
        top: Some(border.clone()),
        bottom: Some(border.clone()),
        left: (col == 0).then(|| border.clone()),
        right: (col + 1 == column_count).then(|| border.clone()),
    }
}

/// Whether a rule's comparison holds. Only type-compatible pairs compare:
/// numeric-numeric, string-string, boolean-boolean, and date-date (dates
/// travel as strings and are recognised by parsing both sides).
pub fn rule_fires(op: CompareOp, candidate: &Value, operand: &Value) -> bool {
    match (candidate, operand) {
        (Value::Number(_), Value::Number(_)) => {
            let (Some(a), Some(b)) = (as_number(candidate), as_number(operand)) else {
                return false;
            };
            let Some(ordering) = a.partial_cmp(&b) else {
                return false;
            };
            ordering_matches(op, ordering)
        }
        (Value::Bool(a), Value::Bool(b)) => match op {
            CompareOp::Eq => a == b,
            CompareOp::NotEq => a != b,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => {
            if let (Some(da), Some(db)) = (parse_date(a), parse_date(b)) {
                return ordering_matches(op, da.cmp(&db));
            }
            match op {
                CompareOp::Contains => a.contains(b.as_str()),
                _ => ordering_matches(op, a.cmp(b)),
            }
        }
        _ => false,
    }
}

fn ordering_matches(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::LtEq => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::GtEq => ordering != Ordering::Less,
        CompareOp::Contains => false,
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brass_types::Color;
    use serde_json::json;

    fn red_bg_rule(op: CompareOp, operand: Value) -> ConditionalRule {
        ConditionalRule::new(op, operand, StyleOverride::background(Color::rgb(255, 0, 0)))
    }

    fn candidates<'a>(
        rules: &'a [ConditionalRule],
        candidate: &Value,
    ) -> Vec<RuleCandidate<'a>> {
        rules
            .iter()
            .map(|rule| RuleCandidate { rule, candidate: candidate.clone() })
            .collect()
    }

    #[test]
    fn test_numeric_rule_fires() {
        assert!(rule_fires(CompareOp::Gt, &json!(150), &json!(100)));
        assert!(!rule_fires(CompareOp::Gt, &json!(50), &json!(100)));
    }

    #[test]
    fn test_type_mismatch_is_silent_noop() {
        assert!(!rule_fires(CompareOp::Gt, &json!("150"), &json!(100)));
        assert!(!rule_fires(CompareOp::Eq, &json!(true), &json!(1)));
        assert!(!rule_fires(CompareOp::Eq, &json!(null), &json!(null)));
    }

    #[test]
    fn test_date_comparison() {
        assert!(rule_fires(CompareOp::Lt, &json!("2026-01-05"), &json!("2026-02-01")));
        assert!(!rule_fires(CompareOp::Gt, &json!("2026-01-05"), &json!("2026-02-01")));
    }

    #[test]
    fn test_string_contains() {
        assert!(rule_fires(CompareOp::Contains, &json!("northwest"), &json!("west")));
    }

    #[test]
    fn test_cell_rule_overrides_row_rule_per_property() {
        let row_rules = [red_bg_rule(CompareOp::Gt, json!(100))];
        let cell_rules = [ConditionalRule::new(
            CompareOp::Gt,
            json!(100),
            StyleOverride::background(Color::rgb(0, 0, 255)),
        )];
        let style = resolve_style(
            &CellStyle::default(),
            &candidates(&row_rules, &json!(150)),
            &candidates(&cell_rules, &json!(150)),
            0,
            3,
        );
        assert_eq!(style.background, Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_later_row_rule_wins() {
        let rules = [
            red_bg_rule(CompareOp::Gt, json!(100)),
            ConditionalRule::new(
                CompareOp::Gt,
                json!(100),
                StyleOverride::background(Color::rgb(0, 128, 0)),
            ),
        ];
        let style = resolve_style(
            &CellStyle::default(),
            &candidates(&rules, &json!(150)),
            &[],
            0,
            1,
        );
        assert_eq!(style.background, Some(Color::rgb(0, 128, 0)));
    }

    #[test]
    fn test_row_border_suppresses_interior_edges() {
        let rule = ConditionalRule::new(
            CompareOp::Gt,
            json!(100),
            StyleOverride { border: Some(Border::hairline()), ..Default::default() },
        );
        let rules = [rule];

        let first = resolve_style(
            &CellStyle::default(),
            &candidates(&rules, &json!(150)),
            &[],
            0,
            3,
        );
        let middle = resolve_style(
            &CellStyle::default(),
            &candidates(&rules, &json!(150)),
            &[],
            1,
            3,
        );
        let last = resolve_style(
            &CellStyle::default(),
            &candidates(&rules, &json!(150)),
            &[],
            2,
            3,
        );

        let f = first.borders.unwrap();
        assert!(f.left.is_some() && f.right.is_none());
        let m = middle.borders.unwrap();
        assert!(m.left.is_none() && m.right.is_none());
        assert!(m.top.is_some() && m.bottom.is_some());
        let l = last.borders.unwrap();
        assert!(l.left.is_none() && l.right.is_some());
    }
}
