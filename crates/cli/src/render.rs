//! Console transcript of an audit.
//!
//! Each finding is one block preceded by a blank line. The layout is part of
//! the CLI contract; `tests/golden_transcript.rs` pins it.

use rosteraudit_recon::{AuditSummary, Finding};

pub const COMPLETED: &str = "Audit completed successfully.";

/// Shown in place of a local value the roster does not carry.
pub const MISSING: &str = "(missing)";

/// Transcript lines for `findings`, in finding order.
pub fn transcript_lines(findings: &[Finding]) -> Vec<String> {
    let mut lines = Vec::new();
    for finding in findings {
        lines.push(String::new());
        match finding {
            Finding::Unmatched(n) => lines.push(
                format!("National member not found in local: {} {}", n.member_id, n.member_name)
                    .trim_end()
                    .to_string(),
            ),
            Finding::Ambiguous(n) => lines.push(
                format!(
                    "Multiple local members found for national member: {} {}",
                    n.member_id, n.member_name
                )
                .trim_end()
                .to_string(),
            ),
            Finding::Mismatch(d) => {
                lines.push(format!("{} mismatch: {}", d.field, d.member_id));
                lines.push(d.member_name.clone());
                lines.push(format!("National: {}", d.national));
                lines.push(format!("Local: {}", d.local.as_deref().unwrap_or(MISSING)));
            }
        }
    }
    lines
}

/// Full transcript, newline-terminated.
pub fn transcript(findings: &[Finding]) -> String {
    let mut out = String::new();
    for line in transcript_lines(findings) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// One-line tally printed after the transcript.
pub fn summary_line(summary: &AuditSummary) -> String {
    format!(
        "{} national / {} local records: {} matched, {} not found, {} ambiguous, {} field mismatches ({} members)",
        summary.national_records,
        summary.local_records,
        summary.matched,
        summary.unmatched,
        summary.ambiguous,
        summary.mismatches,
        summary.members_with_mismatches,
    )
}
