//! `rosteraudit-recon`: member roster reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded rosters, returns ordered findings.
//! No CLI or IO dependencies.

pub mod engine;
pub mod error;
pub mod evidence;
pub mod fields;
pub mod model;
pub mod normalize;

pub use engine::{reconcile, reconcile_normalized};
pub use error::ReconError;
pub use fields::TrackedField;
pub use model::{
    AuditResult, AuditSummary, Discrepancy, Finding, Notice, NoticeKind, Record, Roster, Side,
    Value,
};
pub use normalize::{format_short_date, normalize_date, normalize_local, NormalizedRecord};
