//! Spreadsheet reference syntax: column letters and formula reference tokens

pub mod letters;
pub mod tokenizer;

pub use letters::{column_index, column_letters, parse_cell_address};
pub use tokenizer::{Axis, Endpoint, ReferenceKind, ReferenceToken, tokenize};
