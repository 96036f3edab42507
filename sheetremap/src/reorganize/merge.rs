//! Append the rows of two tables under one header order

use super::{
    FooterSpec, SourceTable, check_destination, copy_row, write_footer_row, write_header_row,
    write_title_row,
};
use crate::headers::HeaderOrder;
use crate::layout::RowLayout;
use crate::reader::Sheet;
use crate::remap::{Provenance, RemapContext};
use crate::rewrite::Placeholders;
use anyhow::{Result, bail};
use log::info;
use serde::{Deserialize, Serialize};

/// Which input table a row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableId {
    Base,
    DataSource,
}

/// One row to copy into the merged sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRow {
    pub table: TableId,
    pub row: u32,
    /// Whether the column numbers in this row's formulas are known to refer to
    /// `table`. Formulas on unattributed rows are never rewritten.
    pub attributed: bool,
}

impl MergeRow {
    pub fn known(table: TableId, row: u32) -> Self {
        Self {
            table,
            row,
            attributed: true,
        }
    }

    pub fn unattributed(table: TableId, row: u32) -> Self {
        Self {
            table,
            row,
            attributed: false,
        }
    }
}

/// Options for [`merge_tables`] and [`merge_rows`]
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub sheet_name: String,
    pub title: Option<String>,
    pub footers: Vec<FooterSpec>,
    pub placeholders: Placeholders,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            sheet_name: "合并表".to_string(),
            title: None,
            footers: Vec::new(),
            placeholders: Placeholders::default(),
        }
    }
}

/// All data rows of `base` followed by all data rows of `data_source`
pub fn merge_tables(
    base: &SourceTable<'_>,
    data_source: &SourceTable<'_>,
    destination: &HeaderOrder,
    options: &MergeOptions,
) -> Result<Sheet> {
    let rows: Vec<MergeRow> = base
        .data_rows()
        .into_iter()
        .map(|row| MergeRow::known(TableId::Base, row))
        .chain(
            data_source
                .data_rows()
                .into_iter()
                .map(|row| MergeRow::known(TableId::DataSource, row)),
        )
        .collect();
    merge_rows(base, data_source, destination, &rows, options)
}

/// Copy the given rows, in order, under `destination`
pub fn merge_rows(
    base: &SourceTable<'_>,
    data_source: &SourceTable<'_>,
    destination: &HeaderOrder,
    rows: &[MergeRow],
    options: &MergeOptions,
) -> Result<Sheet> {
    check_destination(destination, &options.footers)?;

    let table_of = |id: TableId| match id {
        TableId::Base => base,
        TableId::DataSource => data_source,
    };
    for merge_row in rows {
        let table = table_of(merge_row.table);
        if merge_row.row < table.layout.data_start_row {
            bail!(
                "Row {} of the {:?} table is not a data row",
                merge_row.row,
                merge_row.table
            );
        }
    }

    let header_row = if options.title.is_some() { 2 } else { 1 };
    let layout = RowLayout::new(header_row).with_data_rows(rows.len() as u32);
    let mut sheet = Sheet::new(options.sheet_name.clone());

    if let Some(title) = &options.title {
        write_title_row(&mut sheet, 1, title, destination.len() as u32);
    }
    write_header_row(&mut sheet, header_row, destination);

    for (offset, merge_row) in rows.iter().enumerate() {
        let table = table_of(merge_row.table);
        let mut ctx = RemapContext::new(&table.headers, destination, table.layout, layout);
        if !merge_row.attributed {
            ctx.source = Provenance::Ambiguous(vec![&base.headers, &data_source.headers]);
        }
        let dest_row = layout.data_start_row + offset as u32;
        copy_row(&mut sheet, table, merge_row.row, dest_row, &ctx, &options.placeholders);
    }
    write_footer_row(&mut sheet, &layout, destination, &options.footers);

    info!(
        "Merged {} rows from '{}' and '{}'",
        rows.len(),
        base.sheet.name,
        data_source.sheet.name
    );
    Ok(sheet)
}
