//! Workbook data structures
//!
//! Rows and columns are 1-based throughout, matching spreadsheet notation.

use std::collections::{BTreeSet, HashMap};

/// Represents a complete workbook
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Get all sheet names
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Represents a worksheet
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), Cell>,
    /// Merged cell ranges: (start_row, start_col, end_row, end_col)
    pub merged_cells: Vec<(u32, u32, u32, u32)>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            merged_cells: Vec::new(),
        }
    }

    /// Get a cell at the given position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Content at the given position, `Empty` when the cell does not exist
    pub fn content(&self, row: u32, col: u32) -> &CellContent {
        static EMPTY: CellContent = CellContent::Empty;
        self.get_cell(row, col).map(|c| &c.content).unwrap_or(&EMPTY)
    }

    /// Store content at the given position, replacing what was there
    pub fn set(&mut self, row: u32, col: u32, content: CellContent) {
        self.cells.insert((row, col), Cell::new(row, col, content));
    }

    /// Store content together with the text a spreadsheet would display
    pub fn set_with_text(
        &mut self,
        row: u32,
        col: u32,
        content: CellContent,
        text: impl Into<String>,
    ) {
        let mut cell = Cell::new(row, col, content);
        cell.text = Some(text.into());
        self.cells.insert((row, col), cell);
    }

    /// Highest row holding a non-empty cell (0 for an empty sheet)
    pub fn row_count(&self) -> u32 {
        self.non_empty_cells().map(|c| c.row).max().unwrap_or(0)
    }

    /// Highest column holding a non-empty cell (0 for an empty sheet)
    pub fn column_count(&self) -> u32 {
        self.non_empty_cells().map(|c| c.col).max().unwrap_or(0)
    }

    /// Rows holding at least one non-empty cell, in one pass over the cells
    pub fn non_empty_rows(&self) -> BTreeSet<u32> {
        self.non_empty_cells().map(|c| c.row).collect()
    }

    fn non_empty_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|c| !c.content.is_empty())
    }
}

/// Represents a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub content: CellContent,
    /// Text as displayed by a spreadsheet application, when known
    pub text: Option<String>,
}

impl Cell {
    pub fn new(row: u32, col: u32, content: CellContent) -> Self {
        Self {
            row,
            col,
            content,
            text: None,
        }
    }

    /// Display text if present, else the stringified content; trimmed
    pub fn display_text(&self) -> String {
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.content.to_text().trim().to_string(),
        }
    }
}

/// Cell contents, decided once when a cell is read
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Formula {
        formula: String,
        /// Last computed result, as text
        cached: Option<String>,
    },
    Hyperlink {
        text: String,
        target: String,
    },
}

impl CellContent {
    /// Create a formula cell without a cached result
    pub fn formula(f: impl Into<String>) -> Self {
        CellContent::Formula {
            formula: f.into(),
            cached: None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellContent::Text(s.into())
    }

    pub fn hyperlink(text: impl Into<String>, target: impl Into<String>) -> Self {
        CellContent::Hyperlink {
            text: text.into(),
            target: target.into(),
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellContent::Empty => true,
            CellContent::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Get the formula if this is a formula cell
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellContent::Formula { formula, .. } => Some(formula),
            _ => None,
        }
    }

    /// Stringified value; formulas yield their cached result
    pub fn to_text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Number(n) => n.to_string(),
            CellContent::Text(s) => s.clone(),
            CellContent::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellContent::Formula { cached, .. } => cached.clone().unwrap_or_default(),
            CellContent::Hyperlink { text, .. } => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_prefers_text() {
        let mut cell = Cell::new(1, 1, CellContent::Number(45139.0));
        assert_eq!(cell.display_text(), "45139");

        cell.text = Some(" 2023/08/01 ".to_string());
        assert_eq!(cell.display_text(), "2023/08/01");

        cell.text = Some("   ".to_string());
        assert_eq!(cell.display_text(), "45139");
    }

    #[test]
    fn test_content_to_text() {
        assert_eq!(CellContent::Number(1.5).to_text(), "1.5");
        assert_eq!(CellContent::Boolean(true).to_text(), "TRUE");
        assert_eq!(CellContent::hyperlink("Docs", "https://x").to_text(), "Docs");
        assert_eq!(CellContent::formula("=A1").to_text(), "");
        assert_eq!(
            CellContent::Formula {
                formula: "=A1".to_string(),
                cached: Some("3".to_string())
            }
            .to_text(),
            "3"
        );
    }

    #[test]
    fn test_sheet_extent() {
        let mut sheet = Sheet::new("Data");
        assert_eq!(sheet.row_count(), 0);

        sheet.set(1, 1, CellContent::text("Name"));
        sheet.set(3, 4, CellContent::Number(2.0));
        sheet.set(9, 9, CellContent::Empty);
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.column_count(), 4);
        assert_eq!(sheet.non_empty_rows().into_iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(sheet.content(2, 2), &CellContent::Empty);
    }
}
