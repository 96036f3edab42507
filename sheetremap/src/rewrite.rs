//! Formula rewriter: remaps every same-sheet reference of a formula

use crate::reader::CellContent;
use crate::reference::tokenize;
use crate::remap::{RemapContext, RemapOutcome, missing_headers, remap_token};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Rewrite `formula` for the destination described by `ctx`.
///
/// Tokens are replaced right to left so the byte spans of tokens further left
/// stay valid. A single failing token fails the whole formula; the reported
/// header names then come from a scan of every column the formula references,
/// so all missing headers are listed rather than only the first one hit.
/// `Unresolvable` takes precedence over `MissingHeaders`.
pub fn rewrite(formula: &str, ctx: &RemapContext<'_>) -> RemapOutcome {
    let tokens = tokenize(formula);
    let mut output = formula.to_string();
    let mut failure: Option<RemapOutcome> = None;

    for token in tokens.iter().rev() {
        match remap_token(token, ctx) {
            RemapOutcome::Rewritten(text) => {
                if failure.is_none() {
                    output.replace_range(token.span.clone(), &text);
                }
            }
            outcome @ RemapOutcome::MissingHeaders(_) => {
                failure.get_or_insert(outcome);
            }
            outcome @ RemapOutcome::Unresolvable { .. } => {
                if !matches!(failure, Some(RemapOutcome::Unresolvable { .. })) {
                    failure = Some(outcome);
                }
            }
        }
    }

    match failure {
        None => {
            debug!("Rewrote '{}' -> '{}'", formula, output);
            RemapOutcome::Rewritten(output)
        }
        Some(RemapOutcome::Unresolvable { reason, .. }) => {
            let missing = missing_headers(&tokens, ctx);
            warn!("Cannot rewrite '{}': {}", formula, reason);
            RemapOutcome::Unresolvable { reason, missing }
        }
        Some(_) => {
            let missing = missing_headers(&tokens, ctx);
            warn!(
                "Cannot rewrite '{}': missing headers {}",
                formula,
                missing.join(", ")
            );
            RemapOutcome::MissingHeaders(missing)
        }
    }
}

/// Rewrite the formula held by a cell; `None` for non-formula content
pub fn rewrite_content(content: &CellContent, ctx: &RemapContext<'_>) -> Option<RemapOutcome> {
    content.as_formula().map(|formula| rewrite(formula, ctx))
}

/// Text written in place of a formula that could not be rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    /// Written before the missing header names
    pub missing_prefix: String,
    /// Joins several missing header names
    pub separator: String,
    /// Written when no header name can be given
    pub unresolved: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            missing_prefix: "缺少".to_string(),
            separator: ", ".to_string(),
            unresolved: "F-Null".to_string(),
        }
    }
}

impl Placeholders {
    /// Placeholder text for a failed outcome, `None` for a rewritten one
    pub fn text_for(&self, outcome: &RemapOutcome) -> Option<String> {
        if outcome.is_rewritten() {
            return None;
        }
        let missing = outcome.missing_headers();
        if missing.is_empty() {
            Some(self.unresolved.clone())
        } else {
            Some(format!("{}{}", self.missing_prefix, missing.join(&self.separator)))
        }
    }

    /// Destination cell content for an outcome
    pub fn render(&self, outcome: &RemapOutcome) -> CellContent {
        match outcome {
            RemapOutcome::Rewritten(formula) => CellContent::formula(formula.clone()),
            _ => CellContent::Text(self.text_for(outcome).unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{HeaderMap, HeaderOrder};
    use crate::layout::RowLayout;
    use crate::remap::UnresolvedReason;

    #[test]
    fn test_rewrite_splices_every_token() {
        let source = HeaderMap::from_names(["Name", "Amount", "Date"]);
        let destination = HeaderOrder::new(["Date", "Name", "Amount"]);
        let ctx = RemapContext::new(&source, &destination, RowLayout::new(1), RowLayout::new(1))
            .at(2, 5);

        let outcome = rewrite("=IF(B2>0,B2*2,C2)&A$1", &ctx);
        assert_eq!(outcome, RemapOutcome::Rewritten("=IF(C5>0,C5*2,A5)&B$1".to_string()));
    }

    #[test]
    fn test_rewrite_handles_length_changes() {
        let names: Vec<String> = (1..=30).map(|i| format!("H{}", i)).collect();
        let source = HeaderMap::from_names(&names);
        let mut reversed = names.clone();
        reversed.reverse();
        let destination = HeaderOrder::new(reversed);
        let ctx = RemapContext::new(&source, &destination, RowLayout::new(1), RowLayout::new(1))
            .at(2, 2);

        // A -> AD (30), AD -> A
        let outcome = rewrite("=A2+AD2+B2", &ctx);
        assert_eq!(outcome, RemapOutcome::Rewritten("=AD2+A2+AC2".to_string()));
    }

    #[test]
    fn test_rewrite_reports_all_missing_headers() {
        let source = HeaderMap::from_names(["Name", "Amount", "Date"]);
        let destination = HeaderOrder::new(["Name"]);
        let ctx = RemapContext::new(&source, &destination, RowLayout::new(1), RowLayout::new(1))
            .at(2, 2);

        let outcome = rewrite("=B2+C2+A2", &ctx);
        assert_eq!(
            outcome,
            RemapOutcome::MissingHeaders(vec!["Amount".to_string(), "Date".to_string()])
        );
    }

    #[test]
    fn test_unresolvable_still_names_missing_headers() {
        let source = HeaderMap::from_names(["Name", "Amount"]);
        let destination = HeaderOrder::new(["Name"]);
        let ctx = RemapContext::new(&source, &destination, RowLayout::new(1), RowLayout::new(1))
            .at(2, 2);

        let outcome = rewrite("=B2+F2", &ctx);
        assert_eq!(
            outcome,
            RemapOutcome::Unresolvable {
                reason: UnresolvedReason::NoSourceHeader {
                    column: "F".to_string()
                },
                missing: vec!["Amount".to_string()]
            }
        );
    }

    #[test]
    fn test_formula_without_references_is_unchanged() {
        let source = HeaderMap::from_names(["Name"]);
        let destination = HeaderOrder::new(["Name"]);
        let ctx = RemapContext::new(&source, &destination, RowLayout::new(1), RowLayout::new(1));

        assert_eq!(rewrite("=1+2", &ctx), RemapOutcome::Rewritten("=1+2".to_string()));
        assert_eq!(rewrite_content(&CellContent::Number(1.0), &ctx), None);
    }

    #[test]
    fn test_placeholders() {
        let placeholders = Placeholders::default();
        let missing = RemapOutcome::MissingHeaders(vec!["Amount".to_string(), "Date".to_string()]);
        assert_eq!(placeholders.text_for(&missing).as_deref(), Some("缺少Amount, Date"));

        let unresolved = RemapOutcome::Unresolvable {
            reason: UnresolvedReason::RowOutOfBounds { row: 0 },
            missing: Vec::new(),
        };
        assert_eq!(placeholders.render(&unresolved), CellContent::text("F-Null"));

        let ok = RemapOutcome::Rewritten("=A2".to_string());
        assert_eq!(placeholders.text_for(&ok), None);
        assert_eq!(placeholders.render(&ok), CellContent::formula("=A2"));
    }
}
