// CSV/TSV roster import

use std::io::Read;
use std::path::Path;

use rosteraudit_recon::{ReconError, Value};

use crate::Grid;

/// Read a delimited file into a grid. The delimiter is sniffed when `None`.
pub fn read_grid(path: &Path, delimiter: Option<u8>) -> Result<Grid, ReconError> {
    let content = read_file_as_utf8(path)
        .map_err(|e| ReconError::Io(format!("{}: {}", path.display(), e)))?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    grid_from_str(&content, delimiter)
        .map_err(|e| ReconError::Io(format!("{}: {}", path.display(), e)))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // A title line above the header may hold a single field, so the
        // widest line sets the target rather than the first.
        let target = counts.iter().copied().max().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    // Excel's "CSV UTF-8" export prepends a BOM to the first header cell
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn grid_from_str(content: &str, delimiter: u8) -> Result<Grid, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Grid::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        grid.push(record.iter().map(field_value).collect());
    }
    Ok(grid)
}

fn field_value(field: &str) -> Value {
    if field.trim().is_empty() {
        Value::Empty
    } else {
        Value::Text(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_each_candidate() {
        for delim in [b',', b';', b'\t', b'|'] {
            let d = delim as char;
            let content = format!(
                "Member Number{d}First Name{d}Last Name\n100{d}Jane{d}Doe\n200{d}Ann{d}Roe\n"
            );
            assert_eq!(sniff_delimiter(&content), delim, "delimiter {:?}", d);
        }
    }

    #[test]
    fn test_sniff_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("Employee\nDoe\n"), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        // Employee names carry a comma; the delimiter is still the semicolon
        let content = "Member Number;Employee;SCD\n100;\"Doe, Jane\";1/2/2020\n200;\"Roe, Ann\";3/4/2021\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_ignores_title_line() {
        let content = "Local Roster\nMember Number;Employee;SCD\n100;Doe;1/2/2020\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_blank_fields_are_empty() {
        let grid = grid_from_str("a,,  ,b\n", b',').unwrap();
        assert_eq!(
            grid[0],
            vec![Value::from("a"), Value::Empty, Value::Empty, Value::from("b")]
        );
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        // "Müller" in Windows-1252
        fs::write(&path, b"Employee\nM\xfcller\n").unwrap();

        let grid = read_grid(&path, None).unwrap();
        assert_eq!(grid[1][0], Value::from("Müller"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        fs::write(&path, "\u{feff}Member Number,Employee\n1,A\n").unwrap();

        let grid = read_grid(&path, None).unwrap();
        assert_eq!(grid[0][0], Value::from("Member Number"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_grid(&dir.path().join("nope.csv"), None).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }
}
