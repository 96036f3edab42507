//! Header index maps: which header text names which column

use crate::reader::SheetSource;
use log::trace;
use std::collections::{BTreeMap, HashSet};

/// Column index (1-based) to header text for one header row of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: BTreeMap<u32, String>,
}

impl HeaderMap {
    /// Read the header row of `sheet`.
    ///
    /// Each cell contributes its display text, falling back to its stringified
    /// value, trimmed; cells that end up empty contribute nothing. Headers are
    /// always keyed by physical column, so a blank header never shifts the
    /// columns after it. `include_empty` also walks the blank cells, which only
    /// shows up in the trace log.
    pub fn build<S: SheetSource + ?Sized>(
        sheet: &S,
        header_row: u32,
        include_empty: bool,
    ) -> Self {
        let mut columns = BTreeMap::new();

        for col in 1..=sheet.column_count() {
            let text = sheet
                .cell(header_row, col)
                .map(|cell| cell.display_text())
                .unwrap_or_default();
            if text.is_empty() {
                if include_empty {
                    trace!("header row {header_row}: column {col} is blank");
                }
                continue;
            }
            columns.insert(col, text);
        }

        Self { columns }
    }

    /// Map physical columns 1..=n to the given names; blank names are skipped
    pub fn from_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                let name = name.as_ref().trim();
                (!name.is_empty()).then(|| (idx as u32 + 1, name.to_string()))
            })
            .collect();
        Self { columns }
    }

    /// Header text of a column
    pub fn lookup_by_column(&self, col: u32) -> Option<&str> {
        self.columns.get(&col).map(String::as_str)
    }

    /// First column carrying this header text
    pub fn lookup_by_name(&self, name: &str) -> Option<u32> {
        self.columns
            .iter()
            .find(|(_, header)| header.as_str() == name)
            .map(|(col, _)| *col)
    }

    /// Header names in column order, duplicates removed
    pub fn names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.columns
            .values()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// (column, header) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.columns.iter().map(|(col, name)| (*col, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Destination header names in column order (A first)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOrder {
    names: Vec<String>,
}

impl HeaderOrder {
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 1-based destination column of a header; first match wins
    pub fn position(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| idx as u32 + 1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names that appear more than once, in order of their second appearance
    pub fn duplicates(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) && !duplicates.contains(&name.as_str()) {
                duplicates.push(name.as_str());
            }
        }
        duplicates
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Union of the header names of several sheets; first appearance wins
pub fn collect_header_names<S: SheetSource>(
    sheets: &[&S],
    header_row: u32,
    include_empty: bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for sheet in sheets {
        let map = HeaderMap::build(*sheet, header_row, include_empty);
        for name in map.names() {
            if seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }
    }

    names
}
