//! One audit run: load both rosters, normalize the local one, reconcile.

use std::path::PathBuf;

use serde::Serialize;

use rosteraudit_io::{load_roster, LoadOptions};
use rosteraudit_recon::{
    normalize_local, reconcile_normalized, AuditSummary, Finding, ReconError, Side,
};

/// Everything needed to run an audit.
#[derive(Debug, Clone, Default)]
pub struct AuditRequest {
    pub local: PathBuf,
    pub national: PathBuf,
    pub local_options: LoadOptions,
    pub national_options: LoadOptions,
}

impl AuditRequest {
    pub fn new(local: impl Into<PathBuf>, national: impl Into<PathBuf>) -> Self {
        Self {
            local: local.into(),
            national: national.into(),
            ..Self::default()
        }
    }
}

/// Pipeline stages reported while an audit runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Formatting,
    Auditing,
}

impl Stage {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Reading => "Reading files...",
            Self::Formatting => "Formatting dates...",
            Self::Auditing => "Auditing...",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditMeta {
    pub engine_version: String,
    pub run_at: String,
    pub local_path: String,
    pub national_path: String,
}

/// JSON output contract of `rosteraudit audit --json`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub meta: AuditMeta,
    pub summary: AuditSummary,
    pub findings: Vec<Finding>,
}

/// Run the full pipeline, calling `progress` as each stage begins.
pub fn run_audit(
    request: &AuditRequest,
    mut progress: impl FnMut(Stage),
) -> Result<AuditReport, ReconError> {
    progress(Stage::Reading);
    let local = load_roster(&request.local, Side::Local, &request.local_options)?;
    let national = load_roster(&request.national, Side::National, &request.national_options)?;

    progress(Stage::Formatting);
    let normalized = normalize_local(&local)?;

    progress(Stage::Auditing);
    let result = reconcile_normalized(&normalized, &national)?;

    Ok(AuditReport {
        meta: AuditMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            local_path: request.local.display().to_string(),
            national_path: request.national.display().to_string(),
        },
        summary: result.summary,
        findings: result.findings,
    })
}
