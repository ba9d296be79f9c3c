mod common;

use brass::{
    Band, BandKind, CellDescriptor, Color, CompareOp, ConditionalRule, ReportLayout,
    StyleOverride,
};
use common::fixtures::region_amount_cursor;
use common::{TestResult, export_to_recording};
use serde_json::json;

const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

fn red_row_rule() -> ConditionalRule {
    ConditionalRule::new(CompareOp::Gt, json!(100), StyleOverride::background(RED))
        .with_expression("col.amount")
}

#[test]
fn row_rule_colors_every_cell_on_the_row() -> TestResult {
    let mut band = Band::single(vec![
        Some(CellDescriptor::column("region")),
        Some(CellDescriptor::column("amount")),
    ]);
    band.rows[0].conditions.push(red_row_rule());
    let layout = ReportLayout::new("orders", band);
    let cursor = region_amount_cursor(&[("A", 150), ("B", 50)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    let cells = sink.cells_in(BandKind::Detail);
    // Row 1 (amount 150): both cells red, not just the amount column.
    assert_eq!(cells[0].style.background, Some(RED));
    assert_eq!(cells[1].style.background, Some(RED));
    // Row 2 (amount 50): untouched.
    assert_eq!(cells[2].style.background, None);
    assert_eq!(cells[3].style.background, None);
    Ok(())
}

#[test]
fn cell_rule_overrides_row_rule() -> TestResult {
    let mut band = Band::single(vec![
        Some(CellDescriptor::column("region")),
        Some(
            CellDescriptor::column("amount").with_condition(ConditionalRule::new(
                CompareOp::Gt,
                json!(100),
                StyleOverride::background(BLUE),
            )),
        ),
    ]);
    band.rows[0].conditions.push(red_row_rule());
    let layout = ReportLayout::new("orders", band);
    let cursor = region_amount_cursor(&[("A", 150)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    let cells = sink.cells_in(BandKind::Detail);
    // The region cell keeps the row-level red; the amount cell's own rule
    // wins for the property both rules touch.
    assert_eq!(cells[0].style.background, Some(RED));
    assert_eq!(cells[1].style.background, Some(BLUE));
    Ok(())
}

#[test]
fn type_mismatch_is_a_noop_not_a_failure() -> TestResult {
    // Operand is a string, candidate a number: the rule silently never
    // fires and the export completes.
    let mut band = Band::single(vec![Some(CellDescriptor::column("amount"))]);
    band.rows[0].conditions.push(
        ConditionalRule::new(CompareOp::Gt, json!("100"), StyleOverride::background(RED))
            .with_expression("col.amount"),
    );
    let layout = ReportLayout::new("orders", band);
    let cursor = region_amount_cursor(&[("A", 150)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(sink.cells_in(BandKind::Detail)[0].style.background, None);
    Ok(())
}

#[test]
fn row_rule_without_expression_uses_each_cells_value() -> TestResult {
    let mut band = Band::single(vec![
        Some(CellDescriptor::column("region")),
        Some(CellDescriptor::column("amount")),
    ]);
    band.rows[0]
        .conditions
        .push(ConditionalRule::new(CompareOp::Gt, json!(100), StyleOverride::background(RED)));
    let layout = ReportLayout::new("orders", band);
    let cursor = region_amount_cursor(&[("A", 150)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    let cells = sink.cells_in(BandKind::Detail);
    // The raw candidate of the region cell is a string: type mismatch,
    // no fire. The amount cell fires on its own value.
    assert_eq!(cells[0].style.background, None);
    assert_eq!(cells[1].style.background, Some(RED));
    Ok(())
}

#[test]
fn row_border_override_forms_one_rectangle() -> TestResult {
    let mut band = Band::single(vec![
        Some(CellDescriptor::column("region")),
        Some(CellDescriptor::column("amount")),
        Some(CellDescriptor::column("amount")),
    ]);
    band.rows[0].conditions.push(
        ConditionalRule::new(
            CompareOp::Gt,
            json!(100),
            StyleOverride {
                border: Some(brass::style::Border::hairline()),
                ..Default::default()
            },
        )
        .with_expression("col.amount"),
    );
    let layout = ReportLayout::new("orders", band);
    let cursor = region_amount_cursor(&[("A", 150)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    let cells = sink.cells_in(BandKind::Detail);
    let first = cells[0].style.borders.as_ref().unwrap();
    let middle = cells[1].style.borders.as_ref().unwrap();
    let last = cells[2].style.borders.as_ref().unwrap();

    // No interior vertical edges: left only on the first column, right
    // only on the last.
    assert!(first.left.is_some() && first.right.is_none());
    assert!(middle.left.is_none() && middle.right.is_none());
    assert!(last.left.is_none() && last.right.is_some());
    assert!(first.top.is_some() && middle.top.is_some() && last.top.is_some());
    Ok(())
}

#[test]
fn date_rules_compare_as_dates() -> TestResult {
    let mut band = Band::single(vec![Some(CellDescriptor::column("due"))]);
    band.rows[0].conditions.push(ConditionalRule::new(
        CompareOp::Lt,
        json!("2026-06-01"),
        StyleOverride::background(RED),
    ));
    let layout = ReportLayout::new("invoices", band);
    let cursor = brass::RowsCursor::new(
        vec!["due".into()],
        vec![json!({"due": "2026-05-12"}), json!({"due": "2026-07-01"})],
    );
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    let cells = sink.cells_in(BandKind::Detail);
    assert_eq!(cells[0].style.background, Some(RED));
    assert_eq!(cells[1].style.background, None);
    Ok(())
}
