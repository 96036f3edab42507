//! Reference remapper
//!
//! Moves one reference token from a source layout to a destination layout.
//! Columns are followed by header name rather than by position: the source
//! column is named through the source [`HeaderMap`] and the name is looked up
//! in the destination [`HeaderOrder`]. Rows follow the [`RowLayout`] rules:
//!
//! - a reference to the source header row points at the destination header row;
//! - an absolute (`$`) row keeps its offset from the header row;
//! - a relative row keeps its distance from the row holding the formula.
//!
//! A data reference that would land above the destination header or on/after
//! its footer fails, so a rewritten formula can never reach into a total row.

use crate::headers::{HeaderMap, HeaderOrder};
use crate::layout::RowLayout;
use crate::reference::{Axis, Endpoint, ReferenceToken, column_letters};
use thiserror::Error;

/// Which source table the columns of a formula belong to
#[derive(Debug, Clone)]
pub enum Provenance<'a> {
    Known(&'a HeaderMap),
    /// The caller cannot tell which table the formula came from. Remapping
    /// always fails; the candidates are only consulted to name missing headers.
    Ambiguous(Vec<&'a HeaderMap>),
}

/// Everything needed to move references from one layout to another
#[derive(Debug, Clone)]
pub struct RemapContext<'a> {
    pub source: Provenance<'a>,
    pub destination: &'a HeaderOrder,
    pub source_layout: RowLayout,
    pub destination_layout: RowLayout,
    /// Source row of the cell holding the formula
    pub formula_row: u32,
    /// Destination row that cell is written to
    pub destination_row: u32,
}

impl<'a> RemapContext<'a> {
    pub fn new(
        source: &'a HeaderMap,
        destination: &'a HeaderOrder,
        source_layout: RowLayout,
        destination_layout: RowLayout,
    ) -> Self {
        Self {
            source: Provenance::Known(source),
            destination,
            source_layout,
            destination_layout,
            formula_row: source_layout.data_start_row,
            destination_row: destination_layout.data_start_row,
        }
    }

    /// Same context for a formula at `formula_row` written to `destination_row`
    pub fn at(&self, formula_row: u32, destination_row: u32) -> Self {
        Self {
            formula_row,
            destination_row,
            ..self.clone()
        }
    }

    /// Header names the source gives to a column (one per candidate table)
    fn source_names(&self, col: u32) -> Vec<&'a str> {
        match &self.source {
            Provenance::Known(map) => map.lookup_by_column(col).into_iter().collect(),
            Provenance::Ambiguous(candidates) => candidates
                .iter()
                .filter_map(|map| map.lookup_by_column(col))
                .collect(),
        }
    }
}

/// Why a reference could not be moved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("column {column} has no header in the source table")]
    NoSourceHeader { column: String },
    #[error("row {row} falls outside the destination table")]
    RowOutOfBounds { row: i64 },
    #[error("column {column} cannot be attributed to a single source table")]
    AmbiguousProvenance { column: String },
}

/// Result of remapping a reference or a whole formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapOutcome {
    Rewritten(String),
    /// Headers referenced by the source that the destination does not have,
    /// in order of first appearance
    MissingHeaders(Vec<String>),
    /// No equivalent reference exists. `missing` holds whatever header names a
    /// best-effort scan could still attribute.
    Unresolvable {
        reason: UnresolvedReason,
        missing: Vec<String>,
    },
}

impl RemapOutcome {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, RemapOutcome::Rewritten(_))
    }

    /// The rewritten text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            RemapOutcome::Rewritten(text) => Some(text),
            _ => None,
        }
    }

    /// Missing header names carried by either failure kind
    pub fn missing_headers(&self) -> &[String] {
        match self {
            RemapOutcome::Rewritten(_) => &[],
            RemapOutcome::MissingHeaders(names) => names,
            RemapOutcome::Unresolvable { missing, .. } => missing,
        }
    }
}

enum EndpointFailure {
    Missing(String),
    Unresolved(UnresolvedReason),
}

/// Remap one token. Range endpoints are moved independently and rejoined in
/// their original left/right order; if either fails the whole range fails.
pub fn remap_token(token: &ReferenceToken, ctx: &RemapContext<'_>) -> RemapOutcome {
    let mut remapped = Vec::with_capacity(2);
    let mut missing: Vec<String> = Vec::new();
    let mut unresolved = None;

    for endpoint in token.endpoints() {
        match remap_endpoint(endpoint, ctx) {
            Ok(moved) => remapped.push(moved),
            Err(EndpointFailure::Missing(name)) => {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
            Err(EndpointFailure::Unresolved(reason)) => {
                unresolved.get_or_insert(reason);
            }
        }
    }

    if let Some(reason) = unresolved {
        return RemapOutcome::Unresolvable {
            reason,
            missing: Vec::new(),
        };
    }
    if !missing.is_empty() {
        return RemapOutcome::MissingHeaders(missing);
    }

    let text = remapped
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(":");
    RemapOutcome::Rewritten(text)
}

fn remap_endpoint(
    endpoint: &Endpoint,
    ctx: &RemapContext<'_>,
) -> Result<Endpoint, EndpointFailure> {
    let column = endpoint
        .column
        .map(|axis| remap_column(axis, ctx))
        .transpose()?;
    let row = endpoint.row.map(|axis| remap_row(axis, ctx)).transpose()?;
    Ok(Endpoint { column, row })
}

fn remap_column(axis: Axis, ctx: &RemapContext<'_>) -> Result<Axis, EndpointFailure> {
    let letters = || column_letters(axis.value).unwrap_or_default();

    let header = match &ctx.source {
        Provenance::Known(map) => map.lookup_by_column(axis.value).ok_or_else(|| {
            EndpointFailure::Unresolved(UnresolvedReason::NoSourceHeader { column: letters() })
        })?,
        Provenance::Ambiguous(_) => {
            return Err(EndpointFailure::Unresolved(
                UnresolvedReason::AmbiguousProvenance { column: letters() },
            ));
        }
    };

    let position = ctx
        .destination
        .position(header)
        .ok_or_else(|| EndpointFailure::Missing(header.to_string()))?;
    Ok(Axis::new(position, axis.absolute))
}

fn remap_row(axis: Axis, ctx: &RemapContext<'_>) -> Result<Axis, EndpointFailure> {
    let source = &ctx.source_layout;
    let destination = &ctx.destination_layout;

    if axis.value == source.header_row {
        return Ok(Axis::new(destination.header_row, axis.absolute));
    }

    let original = i64::from(axis.value);
    let row = if axis.absolute {
        i64::from(destination.header_row) + (original - i64::from(source.header_row))
    } else {
        i64::from(ctx.destination_row) + (original - i64::from(ctx.formula_row))
    };

    if !destination.accepts_data_row(row) {
        return Err(EndpointFailure::Unresolved(UnresolvedReason::RowOutOfBounds { row }));
    }
    let row = u32::try_from(row)
        .map_err(|_| EndpointFailure::Unresolved(UnresolvedReason::RowOutOfBounds { row }))?;
    Ok(Axis::new(row, axis.absolute))
}

/// Header names referenced by `tokens` that the destination lacks.
///
/// Best effort: columns the source cannot name are ignored, and with ambiguous
/// provenance every candidate table's name for a column is considered.
pub fn missing_headers(tokens: &[ReferenceToken], ctx: &RemapContext<'_>) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();

    for endpoint in tokens.iter().flat_map(ReferenceToken::endpoints) {
        let Some(column) = endpoint.column else {
            continue;
        };
        for name in ctx.source_names(column.value) {
            if !ctx.destination.contains(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
    }

    missing
}
