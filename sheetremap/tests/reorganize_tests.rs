use sheetremap::aggregate::AggregateFunction;
use sheetremap::reorganize::{
    FooterLink, FooterSpec, MergeOptions, ReshuffleOptions, SourceTable, SplitOptions, merge_tables,
    reshuffle_sheet, split_by_category,
};
use sheetremap::{CellContent, HeaderOrder, Sheet};

fn ledger() -> Sheet {
    let mut sheet = Sheet::new("Ledger");
    for (col, name) in ["Region", "Item", "Qty", "Price", "Total"].iter().enumerate() {
        sheet.set(1, col as u32 + 1, CellContent::text(*name));
    }
    let rows = [
        ("North", "bolts", 10.0, 0.5),
        ("South", "nuts", 20.0, 0.25),
        ("North", "washers", 5.0, 0.1),
    ];
    for (idx, (region, item, qty, price)) in rows.into_iter().enumerate() {
        let row = idx as u32 + 2;
        sheet.set(row, 1, CellContent::text(region));
        sheet.set(row, 2, CellContent::text(item));
        sheet.set(row, 3, CellContent::Number(qty));
        sheet.set(row, 4, CellContent::Number(price));
        sheet.set(row, 5, CellContent::formula(format!("=C{}*D{}", row, row)));
    }
    sheet
}

#[test]
fn test_reshuffle_absolute_references_follow_header() {
    let mut sheet = ledger();
    sheet.set(1, 6, CellContent::text("Share"));
    sheet.set(2, 6, CellContent::formula("=E2/SUM($E$2:$E$4)"));

    let source = SourceTable::new(&sheet, 1);
    let destination = HeaderOrder::new(["Item", "Total", "Share", "Qty", "Price"]);
    let options = ReshuffleOptions {
        title: Some("Ledger".to_string()),
        footers: vec![FooterSpec::new("Total", AggregateFunction::Sum)],
        ..Default::default()
    };

    let out = reshuffle_sheet(&source, &destination, &options).unwrap();
    // Title on row 1, header on row 2, data on rows 3..=5, footer on row 6
    assert_eq!(out.content(3, 2), &CellContent::formula("=D3*E3"));
    assert_eq!(out.content(3, 3), &CellContent::formula("=B3/SUM($B$3:$B$5)"));
    assert_eq!(out.content(5, 2), &CellContent::formula("=D5*E5"));
    assert_eq!(out.content(6, 2), &CellContent::formula("=SUM(B3:B5)"));
}

#[test]
fn test_split_by_region() {
    let sheet = ledger();
    let source = SourceTable::new(&sheet, 1);
    let mut options = SplitOptions::new(
        "Region",
        HeaderOrder::new(["Item", "Qty", "Price", "Total"]),
        HeaderOrder::new(["Region", "Qty", "Total"]),
    );
    options.detail_footers = vec![FooterSpec::new("Total", AggregateFunction::Sum)];
    options.summary_footers = vec![FooterSpec::new("Total", AggregateFunction::Sum)];
    options.footer_links = vec![FooterLink::new("Total", "Total")];

    let workbook = split_by_category(&source, &options).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["汇总表", "North", "South"]);

    let north = workbook.get_sheet("North").unwrap();
    assert_eq!(north.content(4, 1), &CellContent::text("bolts"));
    assert_eq!(north.content(4, 4), &CellContent::formula("=B4*C4"));
    // Source row 4 is the second North row
    assert_eq!(north.content(5, 4), &CellContent::formula("=B5*C5"));
    assert_eq!(north.content(6, 4), &CellContent::formula("=SUM(D4:D5)"));

    let summary = workbook.get_sheet("汇总表").unwrap();
    assert_eq!(summary.content(3, 2), &CellContent::formula("='North'!B4"));
    assert_eq!(summary.content(3, 3), &CellContent::formula("='North'!D6"));
    assert_eq!(summary.content(4, 3), &CellContent::formula("='South'!D5"));
    assert_eq!(
        summary.content(5, 3),
        &CellContent::formula("=SUM('North'!D6,'South'!D5)")
    );
}

#[test]
fn test_merge_two_ledgers() {
    let first = ledger();
    let mut second = Sheet::new("Imported");
    for (col, name) in ["Item", "Total", "Qty", "Price"].iter().enumerate() {
        second.set(1, col as u32 + 1, CellContent::text(*name));
    }
    second.set(2, 1, CellContent::text("gears"));
    second.set(2, 2, CellContent::formula("=C2*D2"));
    second.set(2, 3, CellContent::Number(2.0));
    second.set(2, 4, CellContent::Number(3.0));

    let base = SourceTable::new(&first, 1);
    let data_source = SourceTable::new(&second, 1);
    let destination = HeaderOrder::new(["Item", "Qty", "Price", "Total"]);

    let out = merge_tables(&base, &data_source, &destination, &MergeOptions::default()).unwrap();
    assert_eq!(out.content(2, 4), &CellContent::formula("=B2*C2"));
    assert_eq!(out.content(5, 1), &CellContent::text("gears"));
    assert_eq!(out.content(5, 4), &CellContent::formula("=B5*C5"));
}
