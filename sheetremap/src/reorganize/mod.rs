//! Reorganization planners
//!
//! Each planner reads one or more source tables and writes new sheets laid out
//! under a destination header order. Literal cells are copied by header name,
//! formulas go through the rewriter, and cells that cannot be carried over get
//! placeholder text.

pub mod merge;
pub mod reshuffle;
pub mod split;

pub use merge::{MergeOptions, MergeRow, TableId, merge_rows, merge_tables};
pub use reshuffle::{ReshuffleOptions, reshuffle_sheet};
pub use split::{FooterLink, SplitOptions, split_by_category};

use crate::aggregate::{AggregateFunction, aggregate_formula};
use crate::headers::{HeaderMap, HeaderOrder};
use crate::layout::RowLayout;
use crate::reader::{CellContent, Sheet};
use crate::reference::column_letters;
use crate::remap::RemapContext;
use crate::rewrite::{Placeholders, rewrite};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sheet names are limited to this many characters
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Name used for a category whose value is blank
pub const UNCATEGORIZED: &str = "未分类";

/// A footer aggregate under one destination column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterSpec {
    pub header: String,
    pub function: AggregateFunction,
}

impl FooterSpec {
    pub fn new(header: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            header: header.into(),
            function,
        }
    }
}

/// A source sheet together with where its header row sits
#[derive(Debug, Clone)]
pub struct SourceTable<'a> {
    pub sheet: &'a Sheet,
    pub headers: HeaderMap,
    pub layout: RowLayout,
}

impl<'a> SourceTable<'a> {
    /// Read the header row of `sheet`; data is everything below it
    pub fn new(sheet: &'a Sheet, header_row: u32) -> Self {
        Self {
            sheet,
            headers: HeaderMap::build(sheet, header_row, true),
            layout: RowLayout::new(header_row),
        }
    }

    /// Data rows holding at least one value, top to bottom
    pub fn data_rows(&self) -> Vec<u32> {
        self.sheet
            .non_empty_rows()
            .range(self.layout.data_start_row..)
            .copied()
            .collect()
    }

    /// Columns `1..=width` of a row as text (formula text for formulas), used
    /// to detect duplicate rows
    fn row_key(&self, row: u32, width: u32) -> Vec<String> {
        (1..=width)
            .map(|col| match self.sheet.get_cell(row, col) {
                Some(cell) => match cell.content.as_formula() {
                    Some(formula) => formula.to_string(),
                    None => cell.display_text(),
                },
                None => String::new(),
            })
            .collect()
    }

    /// Data rows with exact duplicates of an earlier row removed
    pub fn unique_data_rows(&self) -> Vec<u32> {
        let width = self.sheet.column_count();
        let mut seen = HashSet::new();
        self.data_rows()
            .into_iter()
            .filter(|&row| seen.insert(self.row_key(row, width)))
            .collect()
    }
}

/// Make a category value usable as a sheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        cleaned
    }
}

/// Sanitize `name` and append ` (2)`, ` (3)`, ... until it is not in `taken`.
/// The chosen name is added to `taken`.
pub fn unique_sheet_name(name: &str, taken: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_name(name);
    let mut candidate = base.clone();
    let mut counter = 2;
    while taken.contains(&candidate) {
        let suffix = format!(" ({})", counter);
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// `#'Sheet'!A1`, the target of an in-workbook hyperlink
pub fn internal_link(sheet: &str) -> String {
    format!("#{}!A1", crate::aggregate::quote_sheet_name(sheet))
}

/// Reject destination header orders the planners cannot lay out
fn check_destination(destination: &HeaderOrder, footers: &[FooterSpec]) -> Result<()> {
    if destination.is_empty() {
        bail!("Destination header order is empty");
    }
    if let Some(name) = destination.duplicates().first() {
        bail!("Destination header '{}' appears more than once", name);
    }
    for footer in footers {
        if !destination.contains(&footer.header) {
            bail!(
                "Footer header '{}' is not in the destination header order",
                footer.header
            );
        }
    }
    Ok(())
}

/// Write the header names into `row`
fn write_header_row(sheet: &mut Sheet, row: u32, destination: &HeaderOrder) {
    for (idx, name) in destination.names().iter().enumerate() {
        sheet.set(row, idx as u32 + 1, CellContent::text(name.clone()));
    }
}

/// Write a title into column A of `row`, merged across the table width
fn write_title_row(sheet: &mut Sheet, row: u32, title: &str, width: u32) {
    sheet.set(row, 1, CellContent::text(title));
    if width > 1 {
        sheet.merged_cells.push((row, 1, row, width));
    }
}

/// Copy one source row into `dest_row`, column by destination header name
fn copy_row(
    sheet: &mut Sheet,
    source: &SourceTable<'_>,
    src_row: u32,
    dest_row: u32,
    ctx: &RemapContext<'_>,
    placeholders: &Placeholders,
) {
    let ctx = ctx.at(src_row, dest_row);
    for (idx, name) in ctx.destination.names().iter().enumerate() {
        let dest_col = idx as u32 + 1;
        let content = match source.headers.lookup_by_name(name) {
            Some(src_col) => {
                carry_content(source.sheet.content(src_row, src_col), &ctx, placeholders)
            }
            None => CellContent::text(placeholders.unresolved.clone()),
        };
        if !content.is_empty() {
            sheet.set(dest_row, dest_col, content);
        }
    }
}

/// Destination content for one source cell
fn carry_content(
    content: &CellContent,
    ctx: &RemapContext<'_>,
    placeholders: &Placeholders,
) -> CellContent {
    match content {
        CellContent::Formula { formula, .. } => placeholders.render(&rewrite(formula, ctx)),
        CellContent::Hyperlink { text, .. } => CellContent::text(text.clone()),
        other => other.clone(),
    }
}

/// Write `FUNC(<col><start>:<col><end>)` under every footer column.
/// Nothing is written when the table has no data rows.
fn write_footer_row(
    sheet: &mut Sheet,
    layout: &RowLayout,
    destination: &HeaderOrder,
    footers: &[FooterSpec],
) {
    let (Some(footer_row), Some(last_row)) = (layout.footer_row, layout.last_data_row()) else {
        return;
    };
    if footers.is_empty() || last_row < layout.data_start_row {
        return;
    }
    for footer in footers {
        let Some(col) = destination.position(&footer.header) else {
            continue;
        };
        let Some(letters) = column_letters(col) else {
            continue;
        };
        let formula = aggregate_formula(footer.function, &letters, layout.data_start_row, last_row);
        sheet.set(footer_row, col, CellContent::formula(format!("={}", formula)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name("[x]*?\\"), "_x____");
        assert_eq!(sanitize_sheet_name("   "), UNCATEGORIZED);
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_unique_sheet_name_adds_suffix() {
        let mut taken = HashSet::new();
        taken.insert("汇总表".to_string());
        assert_eq!(unique_sheet_name("a/b", &mut taken), "a_b");
        assert_eq!(unique_sheet_name("a:b", &mut taken), "a_b (2)");
        assert_eq!(unique_sheet_name("a?b", &mut taken), "a_b (3)");
        assert_eq!(unique_sheet_name("汇总表", &mut taken), "汇总表 (2)");

        let long = "y".repeat(40);
        let first = unique_sheet_name(&long, &mut taken);
        let second = unique_sheet_name(&long, &mut taken);
        assert_eq!(first.chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(second.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(second.ends_with(" (2)"));
    }

    #[test]
    fn test_unique_data_rows_drops_duplicates() {
        let mut sheet = Sheet::new("Data");
        sheet.set(1, 1, CellContent::text("Name"));
        sheet.set(1, 2, CellContent::text("Amount"));
        let rows = [(2, "a", 1.0), (3, "b", 2.0), (4, "a", 1.0), (6, "c", 3.0)];
        for (row, name, amount) in rows {
            sheet.set(row, 1, CellContent::text(name));
            sheet.set(row, 2, CellContent::Number(amount));
        }
        let table = SourceTable::new(&sheet, 1);
        assert_eq!(table.data_rows(), vec![2, 3, 4, 6]);
        assert_eq!(table.unique_data_rows(), vec![2, 3, 6]);
    }

    #[test]
    fn test_data_rows_on_a_tall_sheet() {
        const ROWS: u32 = 40_000;
        let mut sheet = Sheet::new("Data");
        for col in 1..=10 {
            sheet.set(3, col, CellContent::text(format!("H{col}")));
        }
        for row in 4..=ROWS {
            if row % 5 == 0 {
                continue;
            }
            for col in 1..=10 {
                sheet.set(row, col, CellContent::Number(f64::from(row * col)));
            }
        }
        sheet.set(1, 1, CellContent::text("title"));

        let table = SourceTable::new(&sheet, 3);
        let rows = table.data_rows();
        assert_eq!(rows.len(), (ROWS - 3 - ROWS / 5) as usize);
        assert_eq!(rows.first(), Some(&4));
        assert_eq!(rows.last(), Some(&(ROWS - 1)));
        assert!(rows.iter().all(|row| row % 5 != 0));
        assert_eq!(table.unique_data_rows().len(), rows.len());
    }

    #[test]
    fn test_check_destination() {
        let ok = HeaderOrder::new(["A", "B"]);
        assert!(check_destination(&ok, &[FooterSpec::new("B", AggregateFunction::Sum)]).is_ok());
        assert!(check_destination(&ok, &[FooterSpec::new("C", AggregateFunction::Sum)]).is_err());
        assert!(check_destination(&HeaderOrder::new(Vec::<String>::new()), &[]).is_err());
        assert!(check_destination(&HeaderOrder::new(["A", "A"]), &[]).is_err());
    }

    #[test]
    fn test_internal_link_quotes_name() {
        assert_eq!(internal_link("汇总表"), "#'汇总表'!A1");
    }
}
