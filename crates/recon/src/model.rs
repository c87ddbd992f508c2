use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which roster a record or column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Local,
    National,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::National => write!(f, "national"),
        }
    }
}

/// A single typed cell as handed over by the roster loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// Blank text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Date(_) => false,
        }
    }

    /// Display form of the value, `None` when empty.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Number(n) => Some(render_number(*n)),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// Whole numbers render without a fractional part (`5`, not `5.0`).
pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Largest magnitude at which every whole `f64` is exact (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// One roster row, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// 1-indexed row in the source file (0 when built in memory).
    pub source_row: usize,
    pub fields: HashMap<String, Value>,
}

impl Record {
    pub fn new(source_row: usize) -> Self {
        Self {
            source_row,
            fields: HashMap::new(),
        }
    }

    /// Builder used by loaders and tests.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(column.to_string(), value.into());
        self
    }

    /// Missing columns read as `Empty`; column presence is checked per roster.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&Value::Empty)
    }
}

/// An ordered set of records from one source.
#[derive(Debug, Clone)]
pub struct Roster {
    pub side: Side,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Roster {
    pub fn new(side: Side, headers: Vec<String>) -> Self {
        Self {
            side,
            headers,
            records: Vec::new(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Canonical member number: trimmed, whole numbers without a fractional part.
/// `None` for an empty cell; such records never match.
pub fn member_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if !n.is_nan() => Some(render_number(*n)),
        Value::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            // Integers parse exactly at any length; only fractional or
            // exponent forms go through f64, and only while it is exact.
            if let Ok(n) = s.parse::<i128>() {
                return Some(n.to_string());
            }
            match s.parse::<f64>() {
                Ok(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                    Some(render_number(n))
                }
                _ => Some(s.to_string()),
            }
        }
        Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// A field-level mismatch between a national record and its local match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub member_id: String,
    pub member_name: String,
    pub field: String,
    pub national: String,
    pub local: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Unmatched,
    Ambiguous,
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unmatched => write!(f, "unmatched"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// A national record that could not be paired with exactly one local record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub member_id: String,
    pub member_name: String,
    /// Number of local records sharing the member number.
    pub local_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum Finding {
    Unmatched(Notice),
    Ambiguous(Notice),
    Mismatch(Discrepancy),
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub national_records: usize,
    pub local_records: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub mismatches: usize,
    pub members_with_mismatches: usize,
    pub field_counts: BTreeMap<String, usize>,
}

impl AuditSummary {
    pub fn is_clean(&self) -> bool {
        self.unmatched == 0 && self.ambiguous == 0 && self.mismatches == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditResult {
    pub summary: AuditSummary,
    pub findings: Vec<Finding>,
}

impl AuditResult {
    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Mismatch(d) => Some(d),
            _ => None,
        })
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Unmatched(n) | Finding::Ambiguous(n) => Some(n),
            Finding::Mismatch(_) => None,
        })
    }
}
