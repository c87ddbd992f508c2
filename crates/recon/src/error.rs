use std::fmt;

use crate::model::Side;

/// Structural failures. Data-quality findings are never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// A roster lacks a column the audit depends on.
    MissingColumn { side: Side, column: String },
    /// The source has no header and no data rows.
    EmptySource { side: Side },
    /// File extension not handled by any loader.
    UnsupportedFormat { path: String },
    /// IO error (file read, corrupt workbook, unknown sheet).
    Io(String),
}

impl ReconError {
    pub fn missing_column(side: Side, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            side,
            column: column.into(),
        }
    }

    /// True for errors caused by the shape of the data rather than its source.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::EmptySource { .. })
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { side, column } => {
                write!(f, "{side} roster: missing column '{column}'")
            }
            Self::EmptySource { side } => write!(f, "{side} roster: source contains no rows"),
            Self::UnsupportedFormat { path } => {
                write!(f, "unsupported roster format: {path} (expected .xlsx, .xls, .ods or .csv)")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
