mod common;

use brass::sink::SinkEvent;
use brass::{
    Band, BandKind, CellDescriptor, GroupDef, ReportLayout, ReportVariable, ResolvedContent,
};
use common::fixtures::{grouped_layout, region_amount_cursor, region_city_cursor};
use common::{TestResult, export_to_recording};
use serde_json::json;

#[test]
fn group_footer_sums_only_its_own_rows() -> TestResult {
    // Rows [A, A, B]: the A footer must reflect the two A rows only, and
    // the aggregate must restart exactly once before B's detail prints.
    let cursor = region_amount_cursor(&[("A", 10), ("A", 20), ("B", 5)]);
    let (sink, _) = export_to_recording(grouped_layout(), Box::new(cursor))?;

    assert_eq!(
        sink.values_in(BandKind::GroupFooter(0)),
        vec![json!(30), json!(5)]
    );
    Ok(())
}

#[test]
fn group_footer_prints_before_next_groups_detail() -> TestResult {
    let cursor = region_amount_cursor(&[("A", 10), ("A", 20), ("B", 5)]);
    let (sink, _) = export_to_recording(grouped_layout(), Box::new(cursor))?;

    // Find the A footer and the B detail in the raw event stream.
    let footer_a = sink
        .events
        .iter()
        .position(|e| {
            matches!(e, SinkEvent::Cell(c)
                if c.band == BandKind::GroupFooter(0)
                && c.content == ResolvedContent::Value(json!(30)))
        })
        .expect("A footer emitted");
    let detail_b = sink
        .events
        .iter()
        .position(|e| {
            matches!(e, SinkEvent::Cell(c)
                if c.band == BandKind::Detail
                && c.content == ResolvedContent::Value(json!("B")))
        })
        .expect("B detail emitted");
    assert!(footer_a < detail_b);
    Ok(())
}

fn nested_layout() -> ReportLayout {
    ReportLayout::new(
        "orders",
        Band::single(vec![
            Some(CellDescriptor::column("city")),
            Some(CellDescriptor::column("amount")),
        ]),
    )
    .with_group(
        GroupDef::new("region")
            .with_header(Band::single(vec![Some(CellDescriptor::column("region"))]))
            .with_footer(Band::single(vec![Some(CellDescriptor::function("sum", "amount"))])),
    )
    .with_group(
        GroupDef::new("city")
            .with_footer(Band::single(vec![Some(CellDescriptor::function("sum", "amount"))])),
    )
}

#[test]
fn outer_break_closes_inner_groups_innermost_first() -> TestResult {
    // The region change at row 3 must close the city group too, even
    // though the city value repeats, and the city footer must precede the
    // region footer in the emission order.
    let cursor = region_city_cursor(&[
        ("north", "oslo", 10),
        ("north", "oslo", 20),
        ("south", "oslo", 5),
    ]);
    let (sink, _) = export_to_recording(nested_layout(), Box::new(cursor))?;

    // Two region instances, two city instances.
    assert_eq!(
        sink.values_in(BandKind::GroupHeader(0)),
        vec![json!("north"), json!("south")]
    );
    assert_eq!(
        sink.values_in(BandKind::GroupFooter(1)),
        vec![json!(30), json!(5)]
    );
    assert_eq!(
        sink.values_in(BandKind::GroupFooter(0)),
        vec![json!(30), json!(5)]
    );

    // Innermost-first: the first city footer precedes the first region
    // footer.
    let first_city_footer = sink
        .events
        .iter()
        .position(|e| matches!(e, SinkEvent::Cell(c) if c.band == BandKind::GroupFooter(1)))
        .unwrap();
    let first_region_footer = sink
        .events
        .iter()
        .position(|e| matches!(e, SinkEvent::Cell(c) if c.band == BandKind::GroupFooter(0)))
        .unwrap();
    assert!(first_city_footer < first_region_footer);
    Ok(())
}

#[test]
fn group_row_counter_resets_on_group_restart() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![
            Some(CellDescriptor::column("region")),
            Some(CellDescriptor::variable(ReportVariable::GroupRow)),
        ]),
    )
    .with_group(GroupDef::new("region"));
    let cursor = region_amount_cursor(&[("A", 1), ("A", 2), ("B", 3)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(
        sink.values_in(BandKind::Detail),
        vec![
            json!("A"),
            json!(1),
            json!("A"),
            json!(2),
            json!("B"),
            json!(1) // reset on restart
        ]
    );
    Ok(())
}

#[test]
fn group_header_sees_the_rows_first_values() -> TestResult {
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::column("amount"))]),
    )
    .with_group(
        GroupDef::new("region")
            .with_header(Band::single(vec![Some(CellDescriptor::column("region"))])),
    );
    let cursor = region_amount_cursor(&[("A", 10), ("B", 20)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(
        sink.values_in(BandKind::GroupHeader(0)),
        vec![json!("A"), json!("B")]
    );
    Ok(())
}

#[test]
fn footer_context_is_the_groups_last_row() -> TestResult {
    // A column reference in a group footer resolves against the last row
    // of the closing group, not the row that triggered the break.
    let layout = ReportLayout::new(
        "orders",
        Band::single(vec![Some(CellDescriptor::column("amount"))]),
    )
    .with_group(
        GroupDef::new("region")
            .with_footer(Band::single(vec![Some(CellDescriptor::column("region"))])),
    );
    let cursor = region_amount_cursor(&[("A", 10), ("B", 20)]);
    let (sink, _) = export_to_recording(layout, Box::new(cursor))?;

    assert_eq!(
        sink.values_in(BandKind::GroupFooter(0)),
        vec![json!("A"), json!("B")]
    );
    Ok(())
}
