mod common;

use brass::{
    Band, BandKind, CellDescriptor, ExporterBuilder, RecordingSink, ReportLayout,
    ReportVariable,
};
use common::fixtures::{detail_layout, region_amount_cursor};
use common::{TestResult, export_to_recording};
use serde_json::json;

#[test]
fn expressions_blend_columns_params_and_variables() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::expression(
            "line",
            "concat(var.ROW, ': ', col.region, ' x', col.amount * param.factor)",
        ))]),
    );
    let mut sink = RecordingSink::new();
    let mut exporter = ExporterBuilder::new(
        layout,
        Box::new(region_amount_cursor(&[("A", 10), ("B", 20)])),
    )
    .param("factor", 2)
    .build();
    exporter.export(&mut sink)?;

    assert_eq!(
        sink.values_in(BandKind::Detail),
        vec![json!("1: A x20"), json!("2: B x40")]
    );
    Ok(())
}

#[test]
fn row_variable_counts_result_rows() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::variable(ReportVariable::Row))]),
    );
    let cursor = region_amount_cursor(&[("A", 1), ("B", 2), ("C", 3)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(
        sink.values_in(BandKind::Detail),
        vec![json!(1), json!(2), json!(3)]
    );
    Ok(())
}

#[test]
fn report_name_variable() -> TestResult {
    let layout = ReportLayout::new(
        "quarterly orders",
        Band::single(vec![Some(CellDescriptor::variable(ReportVariable::ReportName))]),
    );
    let cursor = region_amount_cursor(&[("A", 1)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(sink.values_in(BandKind::Detail), vec![json!("quarterly orders")]);
    Ok(())
}

#[test]
fn page_variables_resolve_live_for_plain_sinks() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::variable(ReportVariable::PageNo))]),
    );
    let cursor = region_amount_cursor(&[("A", 1)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(sink.values_in(BandKind::Detail), vec![json!(1)]);
    Ok(())
}

#[test]
fn page_tokens_pass_through_for_native_pagination_sinks() -> TestResult {
    // A sink that tracks live page numbers receives the verbatim tokens
    // and substitutes them at its own paint time.
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![
            Some(CellDescriptor::variable(ReportVariable::PageNo)),
            Some(CellDescriptor::variable(ReportVariable::PageCount)),
        ]),
    );
    let mut sink = RecordingSink::with_native_pagination();
    let mut exporter = ExporterBuilder::new(
        layout,
        Box::new(region_amount_cursor(&[("A", 1)])),
    )
    .build();
    exporter.export(&mut sink)?;

    assert_eq!(
        sink.values_in(BandKind::Detail),
        vec![json!("var.PAGE_NO"), json!("var.PAGE_COUNT")]
    );
    Ok(())
}

#[test]
fn space_bearing_column_names_normalise_consistently() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::expression(
            "total",
            "col.unit_price * col.qty",
        ))]),
    );
    let cursor = brass::RowsCursor::new(
        vec!["unit price".into(), "qty".into()],
        vec![json!({"unit price": 4.5, "qty": 2})],
    );
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(sink.values_in(BandKind::Detail), vec![json!(9)]);
    Ok(())
}

#[test]
fn detail_expression_reads_running_aggregates() -> TestResult {
    // Outside header regions, `agg.*` reads the live running value.
    let layout = detail_layout()
        .with_footer(Band::single(vec![Some(CellDescriptor::function("sum", "amount"))]));
    let mut layout = layout;
    layout.detail = Band::single(vec![Some(CellDescriptor::expression(
        "running",
        "agg.sum.amount",
    ))]);
    let cursor = region_amount_cursor(&[("A", 10), ("B", 20)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    // The detail prints before the current row is folded in, so the
    // running value lags one row.
    assert_eq!(sink.values_in(BandKind::Detail), vec![json!(null), json!(10)]);
    assert_eq!(sink.values_in(BandKind::Footer), vec![json!(30)]);
    Ok(())
}
