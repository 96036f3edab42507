//! Aggregation formula builder for footer and roll-up cells

use serde::{Deserialize, Serialize};
use std::fmt;

/// Footer function of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    #[serde(alias = "合计")]
    Sum,
    #[serde(alias = "平均值")]
    Average,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Average => "AVERAGE",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `SUM(C4:C13)`
pub fn sum_formula(column: &str, start_row: u32, end_row: u32) -> String {
    aggregate_formula(AggregateFunction::Sum, column, start_row, end_row)
}

/// `AVERAGE(C4:C13)`
pub fn average_formula(column: &str, start_row: u32, end_row: u32) -> String {
    aggregate_formula(AggregateFunction::Average, column, start_row, end_row)
}

/// `FUNC(<col><start>:<col><end>)`
pub fn aggregate_formula(
    function: AggregateFunction,
    column: &str,
    start_row: u32,
    end_row: u32,
) -> String {
    format!("{}({}{}:{}{})", function, column, start_row, column, end_row)
}

/// Quote a sheet name for use in a reference, doubling embedded quotes
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// `'Sheet'!C20`
pub fn cross_sheet_cell(sheet: &str, column: &str, row: u32) -> String {
    format!("{}!{}{}", quote_sheet_name(sheet), column, row)
}

/// `'Sheet'!C4:C13`
pub fn cross_sheet_range(sheet: &str, column: &str, start_row: u32, end_row: u32) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet_name(sheet),
        column,
        start_row,
        column,
        end_row
    )
}

/// `FUNC('Sheet'!C4:C13)`
pub fn cross_sheet_aggregate(
    function: AggregateFunction,
    sheet: &str,
    column: &str,
    start_row: u32,
    end_row: u32,
) -> String {
    format!(
        "{}({})",
        function,
        cross_sheet_range(sheet, column, start_row, end_row)
    )
}

/// `FUNC(ref1,ref2,...)`; `None` when there is nothing to aggregate
pub fn multi_reference_aggregate<T: AsRef<str>>(
    function: AggregateFunction,
    references: &[T],
) -> Option<String> {
    if references.is_empty() {
        return None;
    }
    let joined = references
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",");
    Some(format!("{}({})", function, joined))
}

/// Combine the footer cells of several detail sheets:
/// `SUM('Cat1'!B20,'Cat2'!B20,'Cat3'!B20)`
pub fn rollup_formula<T: AsRef<str>>(
    function: AggregateFunction,
    sheets: &[T],
    column: &str,
    footer_row: u32,
) -> Option<String> {
    let references: Vec<String> = sheets
        .iter()
        .map(|sheet| cross_sheet_cell(sheet.as_ref(), column, footer_row))
        .collect();
    multi_reference_aggregate(function, &references)
}

/// `SUM(ref1,ref2,...)/<count>`: an average over several ranges with a known
/// total row count
pub fn sum_over_ranges_divided<T: AsRef<str>>(references: &[T], count: u32) -> Option<String> {
    if count == 0 {
        return None;
    }
    multi_reference_aggregate(AggregateFunction::Sum, references)
        .map(|sum| format!("{}/{}", sum, count))
}
