use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calamine::{Reader, Xlsx};
use serde::{Deserialize, Serialize};

use super::extract::cell_text;

// ---------------------------------------------------------------------------
// Ledger – external batch-tracking table (quality/status metadata)
// ---------------------------------------------------------------------------

/// One ledger row: named fields as displayed text.
#[derive(Debug, Clone, Default)]
pub struct LedgerRow {
    pub fields: BTreeMap<String, String>,
}

impl LedgerRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// A read-only snapshot of the batch-tracking table, with the original
/// column order preserved for display.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub columns: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

// ---------------------------------------------------------------------------
// Matching – canonical label → ledger row
// ---------------------------------------------------------------------------

/// How labels are reconciled against the ledger when no exact match exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Exact match, then substring match on the concatenated last two
    /// hyphen segments of the label.
    ExactThenFragment,
    /// Exact match only.
    ExactOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Ledger column holding the batch code.
    pub code_field: String,
    pub strategy: MatchStrategy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            code_field: "Lote".to_string(),
            strategy: MatchStrategy::ExactThenFragment,
        }
    }
}

/// Find the ledger row for a canonical batch label.
///
/// Exact comparison first (case-insensitive, whitespace-trimmed). Failing
/// that, labels with at least two hyphen segments fall back to a substring
/// match of the concatenated last two segments against the code field.
/// First row in table order wins; duplicate codes are tolerated silently.
/// An empty ledger simply yields no match.
pub fn match_ledger<'a>(
    label: &str,
    ledger: &'a Ledger,
    config: &MatcherConfig,
) -> Option<&'a LedgerRow> {
    let wanted = label.trim();

    let exact = ledger.rows.iter().find(|row| {
        row.get(&config.code_field)
            .is_some_and(|code| code.trim().eq_ignore_ascii_case(wanted))
    });
    if exact.is_some() || config.strategy == MatchStrategy::ExactOnly {
        return exact;
    }

    let fragment = fragment_code(wanted)?;
    ledger.rows.iter().find(|row| {
        row.get(&config.code_field)
            .is_some_and(|code| code.to_lowercase().contains(&fragment.to_lowercase()))
    })
}

/// Fallback numeric-code fragment: the last two hyphen segments of the
/// label, concatenated. `None` when the label has fewer than two segments.
fn fragment_code(label: &str) -> Option<String> {
    let segments: Vec<&str> = label.split('-').collect();
    if segments.len() < 2 {
        return None;
    }
    Some(format!(
        "{}{}",
        segments[segments.len() - 2],
        segments[segments.len() - 1]
    ))
}

// ---------------------------------------------------------------------------
// Ledger sources
// ---------------------------------------------------------------------------

/// Anything that can produce a ledger snapshot. The production tool pulls
/// the table from a shared spreadsheet; tests and offline use read a local
/// file. Fetch failures degrade to "no metadata", they never block charts.
pub trait LedgerSource {
    fn fetch(&mut self) -> Result<Ledger>;

    /// Stable identity used as the cache key.
    fn identity(&self) -> String;
}

/// File-backed source: comma-delimited `.csv` or `.xlsx`, first row as
/// header.
#[derive(Debug, Clone)]
pub struct FileLedgerSource {
    path: PathBuf,
}

impl FileLedgerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerSource for FileLedgerSource {
    fn fetch(&mut self) -> Result<Ledger> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => read_csv_ledger(&self.path),
            "xlsx" => read_xlsx_ledger(&self.path),
            other => bail!("unsupported ledger format: .{other}"),
        }
    }

    fn identity(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_csv_ledger(path: &Path) -> Result<Ledger> {
    let mut reader = csv::Reader::from_path(path).context("opening ledger CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading ledger headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("reading ledger row")?;
        let mut fields = BTreeMap::new();
        for (i, col) in columns.iter().enumerate() {
            fields.insert(col.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(LedgerRow { fields });
    }
    Ok(Ledger { columns, rows })
}

fn read_xlsx_ledger(path: &Path) -> Result<Ledger> {
    let bytes = std::fs::read(path).context("reading ledger workbook")?;
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).context("opening ledger workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("ledger workbook has no worksheets")?
        .context("reading ledger worksheet")?;

    let mut raw_rows = range.rows();
    let columns: Vec<String> = raw_rows
        .next()
        .context("ledger worksheet is empty")?
        .iter()
        .map(|c| cell_text(c).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in raw_rows {
        let mut fields = BTreeMap::new();
        for (i, col) in columns.iter().enumerate() {
            let value = row.get(i).map(cell_text).unwrap_or_default();
            fields.insert(col.clone(), value);
        }
        rows.push(LedgerRow { fields });
    }
    Ok(Ledger { columns, rows })
}
