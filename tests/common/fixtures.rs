use brass::{Band, CellDescriptor, GroupDef, ReportLayout, RowsCursor};
use serde_json::json;

/// A cursor over (region, amount) rows.
pub fn region_amount_cursor(rows: &[(&str, i64)]) -> RowsCursor {
    RowsCursor::new(
        vec!["region".into(), "amount".into()],
        rows.iter()
            .map(|(region, amount)| json!({"region": region, "amount": amount}))
            .collect(),
    )
}

/// A cursor over (region, city, amount) rows, for nested-group tests.
pub fn region_city_cursor(rows: &[(&str, &str, i64)]) -> RowsCursor {
    RowsCursor::new(
        vec!["region".into(), "city".into(), "amount".into()],
        rows.iter()
            .map(|(region, city, amount)| {
                json!({"region": region, "city": city, "amount": amount})
            })
            .collect(),
    )
}

/// The minimal layout: one detail band listing region and amount.
pub fn detail_layout() -> ReportLayout {
    ReportLayout::new(
        "orders",
        Band::single(vec![
            Some(CellDescriptor::column("region")),
            Some(CellDescriptor::column("amount")),
        ]),
    )
}

/// Detail plus one group on `region` with a `sum(amount)` footer.
pub fn grouped_layout() -> ReportLayout {
    detail_layout().with_group(
        GroupDef::new("region")
            .with_footer(Band::single(vec![Some(CellDescriptor::function("sum", "amount"))])),
    )
}
