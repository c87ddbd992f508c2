use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AuditSummary, Finding};

/// Compute summary statistics from ordered findings.
pub fn compute_summary(
    findings: &[Finding],
    local_records: usize,
    national_records: usize,
    matched: usize,
) -> AuditSummary {
    let mut field_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut members_with_mismatches: BTreeSet<&str> = BTreeSet::new();
    let mut unmatched = 0;
    let mut ambiguous = 0;
    let mut mismatches = 0;

    for f in findings {
        match f {
            Finding::Unmatched(_) => unmatched += 1,
            Finding::Ambiguous(_) => ambiguous += 1,
            Finding::Mismatch(d) => {
                mismatches += 1;
                *field_counts.entry(d.field.clone()).or_insert(0) += 1;
                members_with_mismatches.insert(d.member_id.as_str());
            }
        }
    }

    AuditSummary {
        national_records,
        local_records,
        matched,
        unmatched,
        ambiguous,
        mismatches,
        members_with_mismatches: members_with_mismatches.len(),
        field_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Discrepancy, Notice, NoticeKind};

    fn mismatch(member: &str, field: &str) -> Finding {
        Finding::Mismatch(Discrepancy {
            member_id: member.into(),
            member_name: "n".into(),
            field: field.into(),
            national: "1/1/2020".into(),
            local: None,
        })
    }

    fn notice(kind: NoticeKind) -> Notice {
        Notice {
            kind,
            member_id: "k".into(),
            member_name: "n".into(),
            local_matches: 0,
        }
    }

    #[test]
    fn summary_counts() {
        let findings = vec![
            Finding::Unmatched(notice(NoticeKind::Unmatched)),
            mismatch("1", "SCD"),
            mismatch("1", "BUD"),
            mismatch("2", "SCD"),
            Finding::Ambiguous(notice(NoticeKind::Ambiguous)),
        ];
        let summary = compute_summary(&findings, 10, 6, 3);
        assert_eq!(summary.local_records, 10);
        assert_eq!(summary.national_records, 6);
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.ambiguous, 1);
        assert_eq!(summary.mismatches, 3);
        assert_eq!(summary.members_with_mismatches, 2);
        assert_eq!(summary.field_counts["SCD"], 2);
        assert_eq!(summary.field_counts["BUD"], 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn empty_findings_are_clean() {
        let summary = compute_summary(&[], 2, 2, 2);
        assert!(summary.is_clean());
        assert!(summary.field_counts.is_empty());
    }
}
