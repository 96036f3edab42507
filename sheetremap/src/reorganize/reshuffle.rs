//! Copy one table into a new column order

use super::{
    FooterSpec, SourceTable, check_destination, copy_row, write_footer_row, write_header_row,
    write_title_row,
};
use crate::headers::HeaderOrder;
use crate::layout::RowLayout;
use crate::reader::Sheet;
use crate::remap::RemapContext;
use crate::rewrite::Placeholders;
use anyhow::Result;
use log::info;

/// Options for [`reshuffle_sheet`]
#[derive(Debug, Clone, Default)]
pub struct ReshuffleOptions {
    /// Name of the produced sheet; the source name when `None`
    pub sheet_name: Option<String>,
    /// Title written above the header row
    pub title: Option<String>,
    pub footers: Vec<FooterSpec>,
    pub placeholders: Placeholders,
}

/// Lay the data rows of `source` out under `destination`.
///
/// The result holds an optional title row, the header row, one row per source
/// data row and, when footers are configured, a footer row of aggregates.
pub fn reshuffle_sheet(
    source: &SourceTable<'_>,
    destination: &HeaderOrder,
    options: &ReshuffleOptions,
) -> Result<Sheet> {
    check_destination(destination, &options.footers)?;

    let rows = source.data_rows();
    let header_row = if options.title.is_some() { 2 } else { 1 };
    let layout = RowLayout::new(header_row).with_data_rows(rows.len() as u32);

    let name = options
        .sheet_name
        .clone()
        .unwrap_or_else(|| source.sheet.name.clone());
    let mut sheet = Sheet::new(name);

    if let Some(title) = &options.title {
        write_title_row(&mut sheet, 1, title, destination.len() as u32);
    }
    write_header_row(&mut sheet, header_row, destination);

    let ctx = RemapContext::new(&source.headers, destination, source.layout, layout);
    for (offset, &src_row) in rows.iter().enumerate() {
        let dest_row = layout.data_start_row + offset as u32;
        copy_row(&mut sheet, source, src_row, dest_row, &ctx, &options.placeholders);
    }
    write_footer_row(&mut sheet, &layout, destination, &options.footers);

    info!(
        "Reshuffled {} rows of '{}' into {} columns",
        rows.len(),
        source.sheet.name,
        destination.len()
    );
    Ok(sheet)
}
