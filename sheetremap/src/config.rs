//! Remap plan configuration
//!
//! A plan is a versioned value describing the source and destination tables
//! and the formulas to move between them. It replaces any ambient "current
//! header list" state: everything a remap needs is passed in explicitly.

use crate::headers::{HeaderMap, HeaderOrder};
use crate::layout::RowLayout;
use crate::reference::parse_cell_address;
use crate::remap::{RemapContext, RemapOutcome};
use crate::rewrite::{Placeholders, rewrite};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Plan format version understood by this library
pub const CONFIG_VERSION: u32 = 1;

/// Main remap plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapConfig {
    pub version: u32,
    #[serde(default)]
    pub placeholders: Placeholders,
    pub source: TableConfig,
    pub destination: TableConfig,
    #[serde(default)]
    pub formulas: Vec<FormulaEntry>,
}

impl RemapConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Validate the plan before any formula is touched
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            anyhow::bail!(
                "Configuration error: unsupported version {} (expected {})",
                self.version,
                CONFIG_VERSION
            );
        }

        self.source.validate("source")?;
        self.destination.validate("destination")?;

        let order = self.destination_order();
        let duplicates = order.duplicates();
        if !duplicates.is_empty() {
            anyhow::bail!(
                "Configuration error: duplicate destination headers: {}",
                duplicates.join(", ")
            );
        }

        for entry in &self.formulas {
            if entry.source_row().is_none() {
                anyhow::bail!(
                    "Configuration error: invalid cell address '{}' for formula '{}'",
                    entry.cell,
                    entry.formula
                );
            }
            if entry.dest_row == 0 {
                anyhow::bail!(
                    "Configuration error: dest_row must be at least 1 for cell '{}'",
                    entry.cell
                );
            }
        }

        Ok(())
    }

    pub fn source_map(&self) -> HeaderMap {
        HeaderMap::from_names(&self.source.headers)
    }

    pub fn destination_order(&self) -> HeaderOrder {
        HeaderOrder::new(self.destination.headers.iter().map(|h| h.trim().to_string()))
    }

    /// Validate the plan, then rewrite every formula in plan order
    pub fn rewrite_all(&self) -> Result<Vec<FormulaResult>> {
        self.validate()?;

        let source = self.source_map();
        let destination = self.destination_order();
        let base = RemapContext::new(
            &source,
            &destination,
            self.source.layout(),
            self.destination.layout(),
        );

        self.formulas
            .iter()
            .map(|entry| -> Result<FormulaResult> {
                let row = entry.source_row().ok_or_else(|| {
                    anyhow::anyhow!("Invalid cell address '{}'", entry.cell)
                })?;
                Ok(FormulaResult {
                    entry: entry.clone(),
                    outcome: rewrite(&entry.formula, &base.at(row, entry.dest_row)),
                })
            })
            .collect()
    }
}

impl FromStr for RemapConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: RemapConfig = toml::from_str(s)?;
        Ok(config)
    }
}

fn default_header_row() -> u32 {
    1
}

/// One table's headers and row layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Header texts, column A first
    pub headers: Vec<String>,
    #[serde(default = "default_header_row")]
    pub header_row: u32,
    /// Defaults to the row after the header
    #[serde(default)]
    pub data_start_row: Option<u32>,
    /// Number of data rows; when set, references may not reach the footer
    #[serde(default)]
    pub data_rows: Option<u32>,
}

impl TableConfig {
    pub fn layout(&self) -> RowLayout {
        let mut layout = RowLayout::new(self.header_row);
        if let Some(start) = self.data_start_row {
            layout = layout.with_data_start(start);
        }
        if let Some(count) = self.data_rows {
            layout = layout.with_data_rows(count);
        }
        layout
    }

    fn validate(&self, table: &str) -> Result<()> {
        if self.header_row == 0 {
            anyhow::bail!("Configuration error: {}.header_row must be at least 1", table);
        }
        if let Some(start) = self.data_start_row {
            if start <= self.header_row {
                anyhow::bail!(
                    "Configuration error: {}.data_start_row must come after header_row",
                    table
                );
            }
        }
        if self.headers.iter().all(|h| h.trim().is_empty()) {
            anyhow::bail!("Configuration error: {}.headers is empty", table);
        }
        Ok(())
    }
}

/// A formula to move: where it sits in the source and which row it goes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEntry {
    /// Source cell address, e.g. "C2"
    pub cell: String,
    pub dest_row: u32,
    pub formula: String,
}

impl FormulaEntry {
    /// Source row parsed from `cell`
    pub fn source_row(&self) -> Option<u32> {
        parse_cell_address(&self.cell).map(|(row, _)| row)
    }
}

/// A plan entry with the outcome of rewriting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaResult {
    pub entry: FormulaEntry,
    pub outcome: RemapOutcome,
}
