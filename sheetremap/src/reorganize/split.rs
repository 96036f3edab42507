//! Split one table into a detail sheet per category plus a summary sheet
//!
//! Detail sheet layout: row 1 links back to the summary, row 2 is the title,
//! row 3 the header, data starts on row 4 and the footer follows the data.
//! The summary has its title on row 1, the header on row 2 and one row per
//! category from row 3, optionally followed by a footer row.

use super::{
    FooterSpec, SourceTable, UNCATEGORIZED, check_destination, copy_row, internal_link,
    unique_sheet_name, write_footer_row, write_header_row, write_title_row,
};
use crate::aggregate::{
    AggregateFunction, cross_sheet_aggregate, cross_sheet_cell, cross_sheet_range,
    multi_reference_aggregate, sum_over_ranges_divided,
};
use crate::headers::HeaderOrder;
use crate::layout::RowLayout;
use crate::reader::{CellContent, Sheet, Workbook};
use crate::reference::column_letters;
use crate::remap::RemapContext;
use crate::rewrite::Placeholders;
use anyhow::{Result, bail};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

const DETAIL_HEADER_ROW: u32 = 3;
const SUMMARY_HEADER_ROW: u32 = 2;
const BACK_LINK_TEXT: &str = "返回汇总表";

/// A summary column that shows the footer cell of a detail column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterLink {
    pub summary_header: String,
    pub detail_header: String,
}

impl FooterLink {
    pub fn new(summary_header: impl Into<String>, detail_header: impl Into<String>) -> Self {
        Self {
            summary_header: summary_header.into(),
            detail_header: detail_header.into(),
        }
    }
}

/// Options for [`split_by_category`]
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Source header whose value picks the category of a row
    pub category_header: String,
    pub detail_headers: HeaderOrder,
    pub detail_footers: Vec<FooterSpec>,
    pub summary_headers: HeaderOrder,
    pub summary_footers: Vec<FooterSpec>,
    pub footer_links: Vec<FooterLink>,
    pub summary_name: String,
    pub placeholders: Placeholders,
}

impl SplitOptions {
    pub fn new(
        category_header: impl Into<String>,
        detail_headers: HeaderOrder,
        summary_headers: HeaderOrder,
    ) -> Self {
        Self {
            category_header: category_header.into(),
            detail_headers,
            detail_footers: Vec::new(),
            summary_headers,
            summary_footers: Vec::new(),
            footer_links: Vec::new(),
            summary_name: "汇总表".to_string(),
            placeholders: Placeholders::default(),
        }
    }

    fn summary_footer(&self, header: &str) -> Option<&FooterSpec> {
        self.summary_footers.iter().find(|f| f.header == header)
    }

    fn footer_link(&self, summary_header: &str) -> Option<&FooterLink> {
        self.footer_links
            .iter()
            .find(|l| l.summary_header == summary_header)
    }

    /// Column letters of a detail column, if the detail sheets have it
    fn detail_column(&self, header: &str) -> Option<String> {
        self.detail_headers
            .position(header)
            .and_then(column_letters)
    }

    /// Column letters of a detail column that carries a footer aggregate
    fn detail_footer_column(&self, header: &str) -> Option<String> {
        self.detail_footers
            .iter()
            .any(|f| f.header == header)
            .then(|| self.detail_column(header))
            .flatten()
    }
}

/// One category and the source rows that belong to it
#[derive(Debug, Clone)]
struct Category {
    value: String,
    sheet_name: String,
    rows: Vec<u32>,
}

impl Category {
    fn layout(&self) -> RowLayout {
        RowLayout::new(DETAIL_HEADER_ROW).with_data_rows(self.rows.len() as u32)
    }

    fn first_data_row(&self) -> u32 {
        self.layout().data_start_row
    }

    fn last_data_row(&self) -> u32 {
        self.first_data_row() + self.rows.len() as u32 - 1
    }

    fn footer_row(&self) -> u32 {
        self.first_data_row() + self.rows.len() as u32
    }
}

/// Build the summary sheet followed by one detail sheet per category.
///
/// Rows that repeat an earlier row exactly are dropped. Categories are sorted
/// by value; a blank value is named "未分类".
pub fn split_by_category(source: &SourceTable<'_>, options: &SplitOptions) -> Result<Workbook> {
    let Some(category_col) = source.headers.lookup_by_name(&options.category_header) else {
        bail!(
            "Category header '{}' is not in the source header row",
            options.category_header
        );
    };
    check_destination(&options.detail_headers, &options.detail_footers)?;
    check_destination(&options.summary_headers, &options.summary_footers)?;
    for link in &options.footer_links {
        if !options.summary_headers.contains(&link.summary_header) {
            bail!(
                "Linked header '{}' is not in the summary header order",
                link.summary_header
            );
        }
    }

    let categories = group_rows(source, category_col, &options.summary_name);
    info!(
        "Splitting '{}' into {} categories by '{}'",
        source.sheet.name,
        categories.len(),
        options.category_header
    );

    let details: Vec<Sheet> = categories
        .par_iter()
        .map(|category| build_detail(source, category, options))
        .collect();

    let mut workbook = Workbook::new();
    workbook
        .sheets
        .push(build_summary(&categories, source, options));
    workbook.sheets.extend(details);
    Ok(workbook)
}

fn group_rows(source: &SourceTable<'_>, category_col: u32, summary_name: &str) -> Vec<Category> {
    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in source.unique_data_rows() {
        let value = source
            .sheet
            .get_cell(row, category_col)
            .map(|cell| cell.display_text())
            .unwrap_or_default();
        groups.entry(value).or_default().push(row);
    }

    let mut taken = HashSet::from([summary_name.to_string()]);
    groups
        .into_iter()
        .map(|(value, rows)| Category {
            sheet_name: unique_sheet_name(&value, &mut taken),
            value,
            rows,
        })
        .collect()
}

fn build_detail(source: &SourceTable<'_>, category: &Category, options: &SplitOptions) -> Sheet {
    let layout = category.layout();
    let destination = &options.detail_headers;
    let mut sheet = Sheet::new(category.sheet_name.clone());

    sheet.set(
        1,
        1,
        CellContent::hyperlink(BACK_LINK_TEXT, internal_link(&options.summary_name)),
    );
    let title = format!("{}: {}", options.category_header, category.value);
    write_title_row(&mut sheet, 2, &title, destination.len() as u32);
    write_header_row(&mut sheet, layout.header_row, destination);

    let ctx = RemapContext::new(&source.headers, destination, source.layout, layout);
    for (offset, &src_row) in category.rows.iter().enumerate() {
        let dest_row = layout.data_start_row + offset as u32;
        copy_row(&mut sheet, source, src_row, dest_row, &ctx, &options.placeholders);
    }
    write_footer_row(&mut sheet, &layout, destination, &options.detail_footers);

    debug!(
        "Built sheet '{}' with {} rows",
        category.sheet_name,
        category.rows.len()
    );
    sheet
}

fn build_summary(
    categories: &[Category],
    source: &SourceTable<'_>,
    options: &SplitOptions,
) -> Sheet {
    let headers = &options.summary_headers;
    let mut sheet = Sheet::new(options.summary_name.clone());

    let title = format!("汇总表（按{}分类）", options.category_header);
    write_title_row(&mut sheet, 1, &title, headers.len() as u32);
    write_header_row(&mut sheet, SUMMARY_HEADER_ROW, headers);

    let first_row = SUMMARY_HEADER_ROW + 1;
    for (offset, category) in categories.iter().enumerate() {
        let row = first_row + offset as u32;
        for (idx, header) in headers.names().iter().enumerate() {
            let content = summary_cell(header, category, source, options);
            sheet.set(row, idx as u32 + 1, content);
        }
    }

    if !options.summary_footers.is_empty() {
        let footer_row = first_row + categories.len() as u32;
        for footer in &options.summary_footers {
            let Some(col) = headers.position(&footer.header) else {
                continue;
            };
            if let Some(formula) = summary_footer_formula(footer, categories, options) {
                sheet.set(footer_row, col, CellContent::formula(format!("={}", formula)));
            }
        }
    }

    sheet
}

fn summary_cell(
    header: &str,
    category: &Category,
    source: &SourceTable<'_>,
    options: &SplitOptions,
) -> CellContent {
    let unresolved = || CellContent::text(options.placeholders.unresolved.clone());

    if let Some(link) = options.footer_link(header) {
        return match options.detail_footer_column(&link.detail_header) {
            Some(letters) => CellContent::formula(format!(
                "={}",
                cross_sheet_cell(&category.sheet_name, &letters, category.footer_row())
            )),
            None => unresolved(),
        };
    }

    if header == options.category_header {
        let text = if category.value.is_empty() {
            UNCATEGORIZED
        } else {
            category.value.as_str()
        };
        return CellContent::hyperlink(text, internal_link(&category.sheet_name));
    }

    if source.headers.lookup_by_name(header).is_none() {
        return unresolved();
    }
    let Some(letters) = options.detail_column(header) else {
        return unresolved();
    };

    let formula = match options.summary_footer(header) {
        Some(footer) => cross_sheet_aggregate(
            footer.function,
            &category.sheet_name,
            &letters,
            category.first_data_row(),
            category.last_data_row(),
        ),
        None => cross_sheet_cell(&category.sheet_name, &letters, category.first_data_row()),
    };
    CellContent::formula(format!("={}", formula))
}

/// Combine the categories for one summary footer cell.
///
/// A linked column aggregates the detail footer cells. Otherwise the detail
/// data ranges are combined directly; an average over ranges is their sum
/// divided by the total row count so every row weighs the same.
fn summary_footer_formula(
    footer: &FooterSpec,
    categories: &[Category],
    options: &SplitOptions,
) -> Option<String> {
    if let Some(link) = options.footer_link(&footer.header) {
        let letters = options.detail_footer_column(&link.detail_header)?;
        let cells: Vec<String> = categories
            .iter()
            .map(|c| cross_sheet_cell(&c.sheet_name, &letters, c.footer_row()))
            .collect();
        return multi_reference_aggregate(footer.function, &cells);
    }

    let letters = options.detail_column(&footer.header)?;
    let ranges: Vec<String> = categories
        .iter()
        .map(|c| cross_sheet_range(&c.sheet_name, &letters, c.first_data_row(), c.last_data_row()))
        .collect();
    match footer.function {
        AggregateFunction::Sum => multi_reference_aggregate(AggregateFunction::Sum, &ranges),
        AggregateFunction::Average => {
            let total: usize = categories.iter().map(|c| c.rows.len()).sum();
            sum_over_ranges_divided(&ranges, total as u32)
        }
    }
}
