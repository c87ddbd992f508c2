//! Fixed column contract between the roster loader and the engine.

use crate::error::ReconError;
use crate::model::{Roster, Side};

pub const MEMBER_NUMBER: &str = "Member Number";

pub const NATIONAL_FIRST_NAME: &str = "First Name";
pub const NATIONAL_LAST_NAME: &str = "Last Name";
pub const LOCAL_EMPLOYEE: &str = "Employee";

/// The four fields compared between rosters, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedField {
    CumulativeBu,
    CurrentBu,
    EntryOnDuty,
    ServiceComputation,
}

impl TrackedField {
    pub const ALL: [TrackedField; 4] = [
        Self::CumulativeBu,
        Self::CurrentBu,
        Self::EntryOnDuty,
        Self::ServiceComputation,
    ];

    /// Report label; also the national column name.
    pub fn label(&self) -> &'static str {
        self.national_column()
    }

    pub fn national_column(&self) -> &'static str {
        match self {
            Self::CumulativeBu => "Cumulative BU",
            Self::CurrentBu => "Current BU",
            Self::EntryOnDuty => "Entry on Duty Date",
            Self::ServiceComputation => "Service Computation Date",
        }
    }

    pub fn local_column(&self) -> &'static str {
        match self {
            Self::CumulativeBu => "CumBUD",
            Self::CurrentBu => "BUD",
            Self::EntryOnDuty => "EOD FAA",
            Self::ServiceComputation => "SCD",
        }
    }

    /// Position in `ALL`, used to index normalized records.
    pub fn index(&self) -> usize {
        match self {
            Self::CumulativeBu => 0,
            Self::CurrentBu => 1,
            Self::EntryOnDuty => 2,
            Self::ServiceComputation => 3,
        }
    }
}

impl std::fmt::Display for TrackedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Columns a roster must carry for the given side, in the order the roster
/// exports list them.
pub fn required_columns(side: Side) -> Vec<&'static str> {
    match side {
        Side::Local => {
            let mut cols: Vec<&'static str> =
                TrackedField::ALL.iter().map(|f| f.local_column()).collect();
            cols.push(MEMBER_NUMBER);
            cols.push(LOCAL_EMPLOYEE);
            cols
        }
        Side::National => {
            let mut cols = vec![MEMBER_NUMBER, NATIONAL_FIRST_NAME, NATIONAL_LAST_NAME];
            cols.extend(TrackedField::ALL.iter().map(|f| f.national_column()));
            cols
        }
    }
}

/// Fail on the first required column the roster lacks.
pub fn check_columns(roster: &Roster) -> Result<(), ReconError> {
    for column in required_columns(roster.side) {
        if !roster.has_column(column) {
            return Err(ReconError::missing_column(roster.side, column));
        }
    }
    Ok(())
}
