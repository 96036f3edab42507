//! Row layout of a table: where its header, data and footer rows sit

use serde::{Deserialize, Serialize};

/// Row positions of one table (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLayout {
    pub header_row: u32,
    pub data_start_row: u32,
    /// Row holding the totals; data references must stay above it
    pub footer_row: Option<u32>,
}

impl RowLayout {
    /// Header at `header_row`, data immediately below, no known footer
    pub fn new(header_row: u32) -> Self {
        Self {
            header_row,
            data_start_row: header_row.saturating_add(1),
            footer_row: None,
        }
    }

    /// Same layout with a fixed number of data rows; the footer follows them
    pub fn with_data_rows(mut self, count: u32) -> Self {
        self.footer_row = Some(self.data_start_row.saturating_add(count));
        self
    }

    /// Same layout with data starting at an explicit row
    pub fn with_data_start(mut self, row: u32) -> Self {
        self.data_start_row = row;
        self
    }

    /// Last data row, when the data row count is known
    pub fn last_data_row(&self) -> Option<u32> {
        self.footer_row.map(|footer| footer.saturating_sub(1))
    }

    /// Whether a data reference may point at `row`: not above the header and
    /// not on or below the footer
    pub fn accepts_data_row(&self, row: i64) -> bool {
        if row < i64::from(self.header_row) {
            return false;
        }
        match self.footer_row {
            Some(footer) => row < i64::from(footer),
            None => row <= i64::from(crate::reference::tokenizer::MAX_ROW),
        }
    }
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::new(1)
    }
}
