//! Issue reporting for formulas that could not be carried over

use crate::config::FormulaResult;
use crate::reference::{column_letters, parse_cell_address};
use crate::remap::RemapOutcome;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity level of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Where an issue applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueScope {
    Sheet(String),
    Cell(String, CellReference),
}

impl IssueScope {
    pub fn sheet_name(&self) -> &str {
        match self {
            IssueScope::Sheet(name) | IssueScope::Cell(name, _) => name,
        }
    }
}

impl PartialOrd for IssueScope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IssueScope {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IssueScope::Sheet(a), IssueScope::Sheet(b)) => a.cmp(b),
            (IssueScope::Sheet(a), IssueScope::Cell(b, _)) => a.cmp(b).then(Ordering::Less),
            (IssueScope::Cell(a, _), IssueScope::Sheet(b)) => a.cmp(b).then(Ordering::Greater),
            (IssueScope::Cell(sheet_a, cell_a), IssueScope::Cell(sheet_b, cell_b)) => {
                sheet_a.cmp(sheet_b).then_with(|| cell_a.cmp(cell_b))
            }
        }
    }
}

/// Cell reference (1-based row and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellReference {
    pub row: u32,
    pub col: u32,
}

impl CellReference {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1 address such as "C2"
    pub fn parse(address: &str) -> Option<Self> {
        parse_cell_address(address).map(|(row, col)| Self::new(row, col))
    }
}

impl PartialOrd for CellReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then_with(|| self.col.cmp(&other.col))
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = column_letters(self.col).unwrap_or_default();
        write!(f, "{}{}", letters, self.row)
    }
}

/// A formula that was not carried over as a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapIssue {
    pub scope: IssueScope,
    pub message: String,
    pub severity: Severity,
}

impl RemapIssue {
    pub fn new(scope: IssueScope, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            scope,
            message: message.into(),
            severity,
        }
    }

    /// Issue describing a failed outcome; `None` when the formula was rewritten
    pub fn from_outcome(scope: IssueScope, formula: &str, outcome: &RemapOutcome) -> Option<Self> {
        match outcome {
            RemapOutcome::Rewritten(_) => None,
            RemapOutcome::MissingHeaders(names) => Some(Self::new(
                scope,
                format!(
                    "'{}' references headers missing from the destination: {}",
                    formula,
                    names.join(", ")
                ),
                Severity::Warning,
            )),
            RemapOutcome::Unresolvable { reason, missing } => {
                let mut message = format!("'{}' cannot be rewritten: {}", formula, reason);
                if !missing.is_empty() {
                    message.push_str(&format!(" (missing headers: {})", missing.join(", ")));
                }
                Some(Self::new(scope, message, Severity::Error))
            }
        }
    }
}

impl PartialOrd for RemapIssue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RemapIssue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| other.severity.cmp(&self.severity))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Issues for every failed formula of a plan run, sorted by cell
pub fn collect_issues(sheet_name: &str, results: &[FormulaResult]) -> Vec<RemapIssue> {
    let mut issues: Vec<RemapIssue> = results
        .iter()
        .filter_map(|result| {
            let scope = match CellReference::parse(&result.entry.cell) {
                Some(cell) => IssueScope::Cell(sheet_name.to_string(), cell),
                None => IssueScope::Sheet(sheet_name.to_string()),
            };
            RemapIssue::from_outcome(scope, &result.entry.formula, &result.outcome)
        })
        .collect();
    issues.sort();
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormulaEntry;
    use crate::remap::UnresolvedReason;

    fn result(cell: &str, formula: &str, outcome: RemapOutcome) -> FormulaResult {
        FormulaResult {
            entry: FormulaEntry {
                cell: cell.to_string(),
                dest_row: 2,
                formula: formula.to_string(),
            },
            outcome,
        }
    }

    #[test]
    fn test_cell_reference_display() {
        assert_eq!(CellReference::new(2, 3).to_string(), "C2");
        assert_eq!(CellReference::parse("AA10"), Some(CellReference::new(10, 27)));
    }

    #[test]
    fn test_collect_issues_sorted_by_cell() {
        let results = vec![
            result("B3", "=A3", RemapOutcome::Rewritten("=A4".to_string())),
            result("C9", "=Z9", RemapOutcome::MissingHeaders(vec!["Tax".to_string()])),
            result(
                "C2",
                "=Q2",
                RemapOutcome::Unresolvable {
                    reason: UnresolvedReason::NoSourceHeader {
                        column: "Q".to_string(),
                    },
                    missing: vec!["Tax".to_string()],
                },
            ),
        ];

        let issues = collect_issues("Data", &results);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].scope, IssueScope::Cell("Data".to_string(), CellReference::new(2, 3)));
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].message.contains("column Q has no header"));
        assert!(issues[0].message.contains("missing headers: Tax"));
        assert_eq!(issues[1].severity, Severity::Warning);
        assert!(issues[1].message.ends_with("Tax"));
    }

    #[test]
    fn test_sheet_scope_sorts_before_cells() {
        let sheet = IssueScope::Sheet("A".to_string());
        let cell = IssueScope::Cell("A".to_string(), CellReference::new(1, 1));
        let other = IssueScope::Sheet("B".to_string());
        assert!(sheet < cell);
        assert!(cell < other);
    }
}
