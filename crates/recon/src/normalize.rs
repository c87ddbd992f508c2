use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ReconError;
use crate::fields::{self, TrackedField, LOCAL_EMPLOYEE, MEMBER_NUMBER};
use crate::model::{member_key, render_number, Roster, Value};

/// Text layouts recognized as dates before re-rendering.
const DATE_LAYOUTS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Short-date rendering: `%m/%d/%Y`, leading zeros stripped, `/0` collapsed.
///
/// The rule is textual. Years below 1000 lose their leading zero as well:
/// `0005-01-01` renders `1/1/005`.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y")
        .to_string()
        .trim_start_matches('0')
        .replace("/0", "/")
}

/// Normalize a date-bearing cell. `None` means the value is missing.
///
/// Text that parses as a date is re-rendered; any other text passes through
/// trimmed, so applying the rule twice yields the same value.
pub fn normalize_date(raw: &Value) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match raw {
        Value::Date(d) => Some(format_short_date(*d)),
        Value::Text(s) => {
            let s = s.trim();
            Some(parse_date_text(s).map(format_short_date).unwrap_or_else(|| s.to_string()))
        }
        Value::Number(n) => Some(render_number(*n)),
        Value::Empty => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
        .or_else(|| {
            DATETIME_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
                .map(|dt| dt.date())
        })
}

/// A local record with its tracked fields already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub member_key: Option<String>,
    pub employee: String,
    pub source_row: usize,
    /// Indexed by `TrackedField::index`.
    pub fields: [Option<String>; 4],
}

impl NormalizedRecord {
    pub fn field(&self, field: TrackedField) -> Option<&str> {
        self.fields[field.index()].as_deref()
    }
}

/// Run the normalizer once over the local roster.
pub fn normalize_local(roster: &Roster) -> Result<Vec<NormalizedRecord>, ReconError> {
    fields::check_columns(roster)?;

    let normalized: Vec<NormalizedRecord> = roster
        .records
        .iter()
        .map(|record| NormalizedRecord {
            member_key: member_key(record.get(MEMBER_NUMBER)),
            employee: record.get(LOCAL_EMPLOYEE).render().unwrap_or_default(),
            source_row: record.source_row,
            fields: TrackedField::ALL.map(|f| normalize_date(record.get(f.local_column()))),
        })
        .collect();

    log::debug!("normalized {} local records", normalized.len());
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, Side};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn strips_leading_zeros_from_month_and_day() {
        assert_eq!(format_short_date(ymd(2024, 3, 7)), "3/7/2024");
        assert_eq!(format_short_date(ymd(2024, 10, 20)), "10/20/2024");
        assert_eq!(format_short_date(ymd(1999, 12, 1)), "12/1/1999");
    }

    #[test]
    fn collapses_zero_after_every_slash() {
        // The year keeps its digits: only the "/0" prefix is collapsed.
        assert_eq!(format_short_date(ymd(2005, 1, 9)), "1/9/2005");
        assert_eq!(format_short_date(ymd(5, 1, 1)), "1/1/005");
        assert_eq!(format_short_date(ymd(987, 6, 30)), "6/30/987");
    }

    #[test]
    fn date_value_renders_short() {
        assert_eq!(normalize_date(&Value::Date(ymd(2024, 3, 7))), Some("3/7/2024".into()));
    }

    #[test]
    fn text_dates_are_rerendered() {
        assert_eq!(normalize_date(&Value::from("03/07/2024")), Some("3/7/2024".into()));
        assert_eq!(normalize_date(&Value::from("2024-03-07")), Some("3/7/2024".into()));
        assert_eq!(
            normalize_date(&Value::from("2024-03-07 00:00:00")),
            Some("3/7/2024".into())
        );
        assert_eq!(normalize_date(&Value::from(" 3/7/2024 ")), Some("3/7/2024".into()));
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        assert_eq!(
            normalize_date(&Value::from("2024-03-07T00:00:00.000")),
            Some("3/7/2024".into())
        );
        assert_eq!(
            normalize_date(&Value::from("2024-03-07 12:30:00.5")),
            Some("3/7/2024".into())
        );
    }

    #[test]
    fn non_date_text_passes_through_trimmed() {
        assert_eq!(normalize_date(&Value::from("  pending ")), Some("pending".into()));
        assert_eq!(normalize_date(&Value::from("13/45/2024")), Some("13/45/2024".into()));
    }

    #[test]
    fn numbers_render_as_text() {
        assert_eq!(normalize_date(&Value::Number(5.0)), Some("5".into()));
    }

    #[test]
    fn absence_propagates() {
        assert_eq!(normalize_date(&Value::Empty), None);
        assert_eq!(normalize_date(&Value::from("")), None);
        assert_eq!(normalize_date(&Value::from("   ")), None);
        assert_eq!(normalize_date(&Value::Number(f64::NAN)), None);
    }

    #[test]
    fn already_stripped_strings_are_stable() {
        for s in ["3/7/2024", "1/1/005", "12/31/1999", "10/1/2010"] {
            let once = normalize_date(&Value::from(s)).unwrap();
            assert_eq!(once, s);
            assert_eq!(normalize_date(&Value::Text(once.clone())), Some(once));
        }
    }

    #[test]
    fn normalize_local_builds_records() {
        let headers: Vec<String> = fields::required_columns(Side::Local)
            .into_iter()
            .map(String::from)
            .collect();
        let mut roster = Roster::new(Side::Local, headers);
        roster.records.push(
            Record::new(3)
                .with("Member Number", 100.0)
                .with("Employee", "Doe, Jane")
                .with("CumBUD", ymd(2020, 1, 2))
                .with("EOD FAA", "2019-05-06"),
        );

        let normalized = normalize_local(&roster).unwrap();
        assert_eq!(normalized.len(), 1);
        let rec = &normalized[0];
        assert_eq!(rec.member_key.as_deref(), Some("100"));
        assert_eq!(rec.employee, "Doe, Jane");
        assert_eq!(rec.source_row, 3);
        assert_eq!(rec.field(TrackedField::CumulativeBu), Some("1/2/2020"));
        assert_eq!(rec.field(TrackedField::CurrentBu), None);
        assert_eq!(rec.field(TrackedField::EntryOnDuty), Some("5/6/2019"));
        assert_eq!(rec.field(TrackedField::ServiceComputation), None);
    }

    #[test]
    fn normalize_local_requires_columns() {
        let roster = Roster::new(Side::Local, vec!["Member Number".into()]);
        assert!(matches!(
            normalize_local(&roster),
            Err(ReconError::MissingColumn { side: Side::Local, .. })
        ));
    }
}
