//! Reference tokenizer
//!
//! Scans formula text for A1-style references: single cells (`B2`, `$B$2`),
//! cell ranges (`A1:C10`), column ranges (`A:C`) and row ranges (`2:5`).
//! Anything else in the formula (operators, function names, literals) is not
//! reported and therefore never rewritten.

use super::letters::{column_index, column_letters};
use log::trace;
use regex::{Captures, Regex};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

/// Largest column a worksheet can address (XFD)
pub const MAX_COLUMN: u32 = 16_384;
/// Largest row a worksheet can address
pub const MAX_ROW: u32 = 1_048_576;

/// How far back (in characters) a sheet qualifier is searched for
const QUALIFIER_LOOKBACK: usize = 50;

// Group layout:
//   1-4  : cell (col abs, col, row abs, row)
//   5-8  : optional range end of a cell reference
//   9-12 : column range (abs, col, abs, col)
//   13-16: row range (abs, row, abs, row)
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(\$?)([A-Za-z]+)(\$?)([0-9]+)(?::(\$?)([A-Za-z]+)(\$?)([0-9]+))?",
        r"|(\$?)([A-Za-z]+):(\$?)([A-Za-z]+)",
        r"|(\$?)([0-9]+):(\$?)([0-9]+)",
    ))
    .expect("reference pattern is a valid regex")
});

// `'Any text'!` or `Name!` (optionally followed by spaces) at the end of the text
static SHEET_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:'[^']*'|[\w.]+)!\s*$").expect("sheet qualifier pattern is a valid regex")
});

/// Shape of a reference token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    SingleCell,
    CellRange,
    ColumnRange,
    RowRange,
}

/// One axis of a reference endpoint with its `$` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
    pub value: u32,
    pub absolute: bool,
}

impl Axis {
    pub fn new(value: u32, absolute: bool) -> Self {
        Self { value, absolute }
    }

    fn marker(&self) -> &'static str {
        if self.absolute { "$" } else { "" }
    }
}

/// One side of a reference. Column ranges carry no row, row ranges no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub column: Option<Axis>,
    pub row: Option<Axis>,
}

impl Endpoint {
    pub fn cell(column: Axis, row: Axis) -> Self {
        Self {
            column: Some(column),
            row: Some(row),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(column) = &self.column {
            let letters = column_letters(column.value).unwrap_or_default();
            write!(f, "{}{}", column.marker(), letters)?;
        }
        if let Some(row) = &self.row {
            write!(f, "{}{}", row.marker(), row.value)?;
        }
        Ok(())
    }
}

/// A reference found in formula text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub kind: ReferenceKind,
    pub start: Endpoint,
    /// Second endpoint for the three range kinds
    pub end: Option<Endpoint>,
    /// Byte span of the token in the formula it was read from
    pub span: Range<usize>,
}

impl ReferenceToken {
    /// Endpoints in text order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        std::iter::once(&self.start).chain(self.end.as_ref())
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;
        if let Some(end) = &self.end {
            write!(f, ":{}", end)?;
        }
        Ok(())
    }
}

/// Find every same-sheet reference in `formula`, in left-to-right order.
///
/// Sheet-qualified references (`'Other'!A1`, `Other!A1:B2`), text inside string
/// literals or quoted sheet names, and letter-digit runs glued to identifiers
/// (`LOG10(`, `Sheet1!`) are not returned.
pub fn tokenize(formula: &str) -> Vec<ReferenceToken> {
    let quoted = quoted_spans(formula);
    let mut tokens = Vec::new();

    for caps in REFERENCE_PATTERN.captures_iter(formula) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let span = whole.range();

        if quoted.iter().any(|q| q.contains(&span.start)) {
            continue;
        }
        if !has_token_boundaries(formula, &span) {
            continue;
        }
        if is_sheet_qualified(formula, span.start)
            || follows_quoted_sheet(formula, &span, &quoted)
        {
            trace!("Skipping sheet-qualified reference '{}'", whole.as_str());
            continue;
        }

        if let Some(token) = build_token(&caps, span) {
            tokens.push(token);
        }
    }

    tokens
}

/// Whether the reference starting at byte `start` is preceded by `'Name'!` or `Name!`
pub fn is_sheet_qualified(formula: &str, start: usize) -> bool {
    let before = &formula[..start];
    let window_start = before
        .char_indices()
        .rev()
        .take(QUALIFIER_LOOKBACK)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    SHEET_QUALIFIER.is_match(&before[window_start..])
}

/// `'Name'!` ending right before the reference, however long the quoted name is
fn follows_quoted_sheet(formula: &str, span: &Range<usize>, quoted: &[Range<usize>]) -> bool {
    let Some(bang) = formula[..span.start].trim_end().strip_suffix('!') else {
        return false;
    };
    quoted
        .iter()
        .any(|q| q.end == bang.len() && formula[q.start..].starts_with('\''))
}

fn has_token_boundaries(formula: &str, span: &Range<usize>) -> bool {
    let glued_before = formula[..span.start]
        .chars()
        .next_back()
        .is_some_and(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.');
    let glued_after = formula[span.end..]
        .chars()
        .next()
        .is_some_and(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '(' | '!'));
    !glued_before && !glued_after
}

/// Byte ranges covered by `"string literals"` and `'quoted sheet names'`
fn quoted_spans(formula: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;
    let mut chars = formula.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match open {
            None => {
                if ch == '"' || ch == '\'' {
                    open = Some((ch, idx));
                }
            }
            Some((quote, start)) if ch == quote => {
                // A doubled quote is an escaped quote inside the literal
                if chars.peek().is_some_and(|&(_, next)| next == quote) {
                    chars.next();
                } else {
                    spans.push(start..idx + ch.len_utf8());
                    open = None;
                }
            }
            Some(_) => {}
        }
    }

    if let Some((_, start)) = open {
        spans.push(start..formula.len());
    }
    spans
}

fn build_token(caps: &Captures<'_>, span: Range<usize>) -> Option<ReferenceToken> {
    if caps.get(2).is_some() {
        let start = Endpoint::cell(column_axis(caps, 1, 2)?, row_axis(caps, 3, 4)?);
        let end = if caps.get(6).is_some() {
            Some(Endpoint::cell(column_axis(caps, 5, 6)?, row_axis(caps, 7, 8)?))
        } else {
            None
        };
        let kind = if end.is_some() {
            ReferenceKind::CellRange
        } else {
            ReferenceKind::SingleCell
        };
        return Some(ReferenceToken {
            kind,
            start,
            end,
            span,
        });
    }

    if caps.get(10).is_some() {
        return Some(ReferenceToken {
            kind: ReferenceKind::ColumnRange,
            start: Endpoint {
                column: Some(column_axis(caps, 9, 10)?),
                row: None,
            },
            end: Some(Endpoint {
                column: Some(column_axis(caps, 11, 12)?),
                row: None,
            }),
            span,
        });
    }

    if caps.get(14).is_some() {
        return Some(ReferenceToken {
            kind: ReferenceKind::RowRange,
            start: Endpoint {
                column: None,
                row: Some(row_axis(caps, 13, 14)?),
            },
            end: Some(Endpoint {
                column: None,
                row: Some(row_axis(caps, 15, 16)?),
            }),
            span,
        });
    }

    None
}

fn is_marked(caps: &Captures<'_>, group: usize) -> bool {
    caps.get(group).is_some_and(|m| m.as_str() == "$")
}

fn column_axis(caps: &Captures<'_>, marker: usize, group: usize) -> Option<Axis> {
    let letters = caps.get(group)?.as_str();
    // Longer runs are names, not columns
    if letters.len() > 3 {
        return None;
    }
    let value = column_index(letters)?;
    if value > MAX_COLUMN {
        return None;
    }
    Some(Axis::new(value, is_marked(caps, marker)))
}

fn row_axis(caps: &Captures<'_>, marker: usize, group: usize) -> Option<Axis> {
    let value = caps.get(group)?.as_str().parse::<u32>().ok()?;
    if value == 0 || value > MAX_ROW {
        return None;
    }
    Some(Axis::new(value, is_marked(caps, marker)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(formula: &str) -> Vec<String> {
        tokenize(formula)
            .into_iter()
            .map(|t| formula[t.span].to_string())
            .collect()
    }

    #[test]
    fn test_single_cell_markers() {
        let tokens = tokenize("=$B$2+C3+$D4+E$5");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, ReferenceKind::SingleCell);
        assert_eq!(tokens[0].start, Endpoint::cell(Axis::new(2, true), Axis::new(2, true)));
        assert_eq!(tokens[1].start, Endpoint::cell(Axis::new(3, false), Axis::new(3, false)));
        assert_eq!(tokens[2].start, Endpoint::cell(Axis::new(4, true), Axis::new(4, false)));
        assert_eq!(tokens[3].start, Endpoint::cell(Axis::new(5, false), Axis::new(5, true)));
    }

    #[test]
    fn test_range_shapes() {
        let tokens = tokenize("=SUM(B2:B10)+SUM(A:C)+SUM(2:5)");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReferenceKind::CellRange,
                ReferenceKind::ColumnRange,
                ReferenceKind::RowRange
            ]
        );
        assert_eq!(tokens[0].to_string(), "B2:B10");
        assert_eq!(tokens[1].to_string(), "A:C");
        assert_eq!(tokens[2].to_string(), "2:5");
    }

    #[test]
    fn test_lowercase_is_normalized_in_display() {
        let tokens = tokenize("=b2*2");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].to_string(), "B2");
        assert_eq!(tokens[0].span, 1..3);
    }

    #[test]
    fn test_sheet_qualified_tokens_are_dropped() {
        assert_eq!(texts("='汇总表'!A1+B2"), vec!["B2"]);
        assert_eq!(texts("=Sheet1!A1:B3*C4"), vec!["C4"]);
        assert_eq!(texts("='Q1 2024'!$A$1+D2"), vec!["D2"]);
        assert_eq!(texts("=汇总表!A1+B2"), vec!["B2"]);
        assert_eq!(texts("=[1]Data!C3+B2"), vec!["B2"]);
    }

    #[test]
    fn test_long_sheet_names_past_the_lookback() {
        let quoted = format!("=SUM('Quarterly results {}'!A1:B2)+C3", "x".repeat(60));
        assert_eq!(texts(&quoted), vec!["C3"]);

        let spaced = format!("='{}'! $A$1+D2", "y".repeat(70));
        assert_eq!(texts(&spaced), vec!["D2"]);

        let bare = format!("={}!A1+B2", "Data_".repeat(15));
        assert_eq!(texts(&bare), vec!["B2"]);
    }

    #[test]
    fn test_function_names_are_not_references() {
        assert_eq!(texts("=LOG10(A2)+ATAN2(B2,C2)"), vec!["A2", "B2", "C2"]);
    }

    #[test]
    fn test_string_literals_are_skipped() {
        assert_eq!(texts(r#"=IF(A2="B2","say ""C3""",D4)"#), vec!["A2", "D4"]);
    }

    #[test]
    fn test_names_longer_than_columns_are_skipped() {
        assert_eq!(texts("=TOTAL2024+B2"), vec!["B2"]);
        assert!(tokenize("=A0").is_empty());
    }

    #[test]
    fn test_spans_are_in_text_order() {
        let formula = "=A1+B2:C3-D4";
        let spans: Vec<_> = tokenize(formula).into_iter().map(|t| t.span).collect();
        assert_eq!(spans, vec![1..3, 4..9, 10..12]);
    }

    #[test]
    fn test_no_references() {
        assert!(tokenize("=1+2*PI()").is_empty());
        assert!(tokenize("").is_empty());
    }
}
