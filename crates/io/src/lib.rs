// Roster loading - CSV/TSV and spreadsheets

pub mod csv;
pub mod xlsx;

use std::path::Path;

use rosteraudit_recon::fields::{required_columns, MEMBER_NUMBER};
use rosteraudit_recon::{ReconError, Record, Roster, Side, Value};

/// Leading rows searched for the header when none is given.
pub const HEADER_SCAN_ROWS: usize = 10;

/// Raw cells in source order. Row `i` is source row `i + 1`.
pub type Grid = Vec<Vec<Value>>;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet name (spreadsheets only). First sheet when `None`.
    pub sheet: Option<String>,
    /// 1-indexed header row. Located automatically when `None`.
    pub header_row: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, ReconError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => Ok(Self::Spreadsheet),
            Some("csv" | "txt") => Ok(Self::Csv),
            Some("tsv") => Ok(Self::Tsv),
            _ => Err(ReconError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Load one roster from disk.
pub fn load_roster(path: &Path, side: Side, options: &LoadOptions) -> Result<Roster, ReconError> {
    let grid = match SourceFormat::from_path(path)? {
        SourceFormat::Csv => csv::read_grid(path, None)?,
        SourceFormat::Tsv => csv::read_grid(path, Some(b'\t'))?,
        SourceFormat::Spreadsheet => xlsx::read_grid(path, options.sheet.as_deref())?,
    };
    let roster = build_roster(side, grid, options.header_row)?;
    log::debug!(
        "{side} roster: {} records, {} columns from {}",
        roster.len(),
        roster.headers.len(),
        path.display()
    );
    Ok(roster)
}

/// Turn a raw grid into a roster: locate the header, then collect every
/// non-blank row below it.
pub fn build_roster(side: Side, grid: Grid, header_row: Option<usize>) -> Result<Roster, ReconError> {
    if grid.iter().all(|row| is_blank(row)) {
        return Err(ReconError::EmptySource { side });
    }

    let header_idx = match header_row {
        Some(n) if n == 0 || n > grid.len() => {
            return Err(ReconError::Io(format!(
                "{side} roster: header row {n} is outside the sheet ({} rows)",
                grid.len()
            )));
        }
        Some(n) => n - 1,
        None => locate_header(side, &grid)?,
    };

    let headers = cell_names(&grid[header_idx]);
    let mut records = Vec::new();
    for (idx, row) in grid.into_iter().enumerate().skip(header_idx + 1) {
        if is_blank(&row) {
            continue;
        }
        let mut record = Record::new(idx + 1);
        // Short rows leave trailing columns unset, which read back as Empty.
        for (name, value) in headers.iter().zip(row) {
            if !name.is_empty() {
                record.fields.entry(name.clone()).or_insert(value);
            }
        }
        records.push(record);
    }

    Ok(Roster {
        side,
        headers,
        records,
    })
}

/// First row among the leading `HEADER_SCAN_ROWS` naming every required column.
fn locate_header(side: Side, grid: &Grid) -> Result<usize, ReconError> {
    let required = required_columns(side);
    let has_all = |names: &[String]| required.iter().all(|c| names.iter().any(|n| n == c));

    if let Some(idx) = grid
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| has_all(&cell_names(row)))
    {
        if idx > 0 {
            log::debug!("{side} roster: header found on row {}", idx + 1);
        }
        return Ok(idx);
    }

    // Report against the first non-blank row, which is where a reader would
    // expect the header.
    let names = grid
        .iter()
        .find(|row| !is_blank(row))
        .map(|row| cell_names(row))
        .unwrap_or_default();
    let missing = required
        .iter()
        .copied()
        .find(|c| !names.iter().any(|n| n == c))
        .unwrap_or(MEMBER_NUMBER);
    Err(ReconError::missing_column(side, missing))
}

fn cell_names(row: &[Value]) -> Vec<String> {
    row.iter().map(|v| v.render().unwrap_or_default()).collect()
}

fn is_blank(row: &[Value]) -> bool {
    row.iter().all(Value::is_empty)
}
