// Excel/ODS roster import

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use rosteraudit_recon::{ReconError, Value};

use crate::Grid;

/// Read one worksheet (xlsx, xlsm, xls, xlsb, ods) into a grid.
///
/// Uses the first sheet unless `sheet` names another one.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<Grid, ReconError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ReconError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                ReconError::Io(format!(
                    "{}: no sheet named '{}' (available: {})",
                    path.display(),
                    wanted,
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ReconError::Io(format!("{}: workbook contains no sheets", path.display())))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ReconError::Io(format!("Failed to read sheet '{}': {}", name, e)))?;

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Value::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_value));
        grid.push(cells);
    }

    log::debug!("{}: sheet '{}' read, {} rows", path.display(), name, grid.len());
    Ok(grid)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(_) => Value::Text("#ERR".to_string()),
        Data::DateTime(dt) => {
            // 1900 date system assumed; calamine does not expose the 1904 flag.
            let serial = dt.as_f64();
            serial_to_date(serial).map(Value::Date).unwrap_or(Value::Number(serial))
        }
        Data::DateTimeIso(s) => iso_to_date(s)
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

/// Excel serial (1900 system) to calendar date. Time of day is dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Day zero is 1899-12-30 so that serials after Excel's phantom
    // 1900-02-29 land on the right day.
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(TimeDelta::try_days(serial.floor() as i64)?)
}

fn iso_to_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|dt| dt.date())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_conversion() {
        assert_eq!(serial_to_date(45358.0), NaiveDate::from_ymd_opt(2024, 3, 7));
        assert_eq!(serial_to_date(43831.75), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(serial_to_date(61.0), NaiveDate::from_ymd_opt(1900, 3, 1));
        assert_eq!(serial_to_date(0.5), None);
        assert_eq!(serial_to_date(f64::NAN), None);
    }

    #[test]
    fn iso_strings() {
        assert_eq!(iso_to_date("2024-03-07"), NaiveDate::from_ymd_opt(2024, 3, 7));
        assert_eq!(
            iso_to_date("2024-03-07T13:45:00"),
            NaiveDate::from_ymd_opt(2024, 3, 7)
        );
        assert_eq!(iso_to_date("not a date"), None);
    }

    #[test]
    fn scalar_cells() {
        assert_eq!(cell_value(&Data::Empty), Value::Empty);
        assert_eq!(cell_value(&Data::Int(100)), Value::Number(100.0));
        assert_eq!(cell_value(&Data::Float(2.5)), Value::Number(2.5));
        assert_eq!(cell_value(&Data::Bool(true)), Value::from("TRUE"));
        assert_eq!(
            cell_value(&Data::String("Doe, Jane".into())),
            Value::from("Doe, Jane")
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("2020-01-02".into())),
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
        );
    }
}
