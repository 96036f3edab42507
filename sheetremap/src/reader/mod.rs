//! Read-side model of the spreadsheets being reorganized
//!
//! Parsing files is left to the caller; this module defines the in-memory
//! workbook the engine reads headers and formulas from and the planners write to.

pub mod workbook;

pub use workbook::{Cell, CellContent, Sheet, Workbook};

/// Read accessors the engine needs from a worksheet
pub trait SheetSource {
    fn cell(&self, row: u32, col: u32) -> Option<&Cell>;
    /// Last row holding data (1-based, 0 when empty)
    fn row_count(&self) -> u32;
    /// Last column holding data (1-based, 0 when empty)
    fn column_count(&self) -> u32;
}

impl SheetSource for Sheet {
    fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.get_cell(row, col)
    }

    fn row_count(&self) -> u32 {
        Sheet::row_count(self)
    }

    fn column_count(&self) -> u32 {
        Sheet::column_count(self)
    }
}
