//! sheetremap: formula reference remapping for reorganized spreadsheets
//!
//! When rows and columns of a table are copied into a new layout, formulas
//! that point at cells of the same sheet must be rewritten so they still refer
//! to the same logical data. Columns are followed by header name and rows by
//! their position relative to the header row or to the formula's own row.
//! References to other sheets are left alone.

pub mod aggregate;
pub mod config;
pub mod headers;
pub mod layout;
pub mod reader;
pub mod reference;
pub mod remap;
pub mod reorganize;
pub mod report;
pub mod rewrite;

pub use aggregate::AggregateFunction;
pub use config::{FormulaEntry, FormulaResult, RemapConfig, TableConfig};
pub use headers::{HeaderMap, HeaderOrder};
pub use layout::RowLayout;
pub use reader::{Cell, CellContent, Sheet, SheetSource, Workbook};
pub use reference::{ReferenceKind, ReferenceToken, column_index, column_letters, tokenize};
pub use remap::{Provenance, RemapContext, RemapOutcome, UnresolvedReason, remap_token};
pub use report::{IssueScope, RemapIssue, Severity};
pub use rewrite::{Placeholders, rewrite};
