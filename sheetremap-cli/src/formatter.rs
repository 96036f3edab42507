//! Output formatters for remap results and issues

use anyhow::Result;
use colored::*;
use sheetremap::{
    FormulaEntry, FormulaResult, IssueScope, Placeholders, RemapIssue, RemapOutcome, Severity,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Print issues grouped by sheet and cell
pub fn print_issues_human(plan_path: &Path, issues: &[RemapIssue]) {
    println!("{}", format!("Checking: {}", plan_path.display()).bold());
    println!();

    if issues.is_empty() {
        println!("{}", "✓ Every formula can be rewritten!".green().bold());
        return;
    }

    let mut sheet_issues: BTreeMap<&str, Vec<&RemapIssue>> = BTreeMap::new();
    let mut cell_issues: BTreeMap<&str, Vec<(String, &RemapIssue)>> = BTreeMap::new();

    for issue in issues {
        match &issue.scope {
            IssueScope::Sheet(sheet) => sheet_issues.entry(sheet.as_str()).or_default().push(issue),
            IssueScope::Cell(sheet, cell) => cell_issues
                .entry(sheet.as_str())
                .or_default()
                .push((cell.to_string(), issue)),
        }
    }

    for (sheet_name, issues) in &sheet_issues {
        println!("{} {}", "Sheet:".bold(), sheet_name.cyan().bold());
        for issue in issues {
            print_issue(issue, 1);
        }
        println!();
    }

    // Issues arrive sorted by cell, so consecutive entries share a cell
    for (sheet_name, cells) in &cell_issues {
        println!("{} {}", "Sheet:".bold(), sheet_name.cyan().bold());
        let mut current: Option<&str> = None;
        for (cell_ref, issue) in cells {
            if current != Some(cell_ref.as_str()) {
                println!("  {} {}", "Cell:".bold(), cell_ref.yellow());
                current = Some(cell_ref.as_str());
            }
            print_issue(issue, 2);
        }
        println!();
    }

    println!("{}", "Summary:".bold().underline());
    let errors = count(issues, Severity::Error);
    let warnings = count(issues, Severity::Warning);
    if errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), errors);
    }
    if warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), warnings);
    }
}

fn print_issue(issue: &RemapIssue, indent: usize) {
    let indent_str = "  ".repeat(indent);
    let severity_str = match issue.severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warning => "WARN".yellow().bold(),
    };
    println!("{}{} {}", indent_str, severity_str, issue.message);
}

fn count(issues: &[RemapIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Print issues in JSON format
pub fn print_issues_json(plan_path: &Path, issues: &[RemapIssue]) -> Result<()> {
    let output = serde_json::json!({
        "plan": plan_path.display().to_string(),
        "issues": issues,
        "summary": {
            "total": issues.len(),
            "errors": count(issues, Severity::Error),
            "warnings": count(issues, Severity::Warning),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print every plan formula next to what it becomes
pub fn print_results_human(placeholders: &Placeholders, results: &[FormulaResult]) {
    for result in results {
        print_single(placeholders, &result.entry, &result.outcome);
    }
}

/// One line per formula: source cell, destination row, and the new text
pub fn print_single(placeholders: &Placeholders, entry: &FormulaEntry, outcome: &RemapOutcome) {
    let location = format!("{} -> row {}", entry.cell, entry.dest_row);
    match outcome {
        RemapOutcome::Rewritten(text) => {
            println!("{} {}  {}", location.yellow(), entry.formula.bright_black(), text.green());
        }
        _ => {
            let text = placeholders.text_for(outcome).unwrap_or_default();
            println!("{} {}  {}", location.yellow(), entry.formula.bright_black(), text.red());
        }
    }
}

/// Print plan results in JSON format
pub fn print_results_json(placeholders: &Placeholders, results: &[FormulaResult]) -> Result<()> {
    let entries: Vec<_> = results
        .iter()
        .map(|result| {
            let (status, text) = match &result.outcome {
                RemapOutcome::Rewritten(text) => ("rewritten", text.clone()),
                RemapOutcome::MissingHeaders(_) => (
                    "missing_headers",
                    placeholders.text_for(&result.outcome).unwrap_or_default(),
                ),
                RemapOutcome::Unresolvable { .. } => (
                    "unresolvable",
                    placeholders.text_for(&result.outcome).unwrap_or_default(),
                ),
            };
            serde_json::json!({
                "cell": result.entry.cell,
                "dest_row": result.entry.dest_row,
                "formula": result.entry.formula,
                "status": status,
                "output": text,
                "missing_headers": result.outcome.missing_headers(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
