use std::collections::HashMap;

use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::fields::{self, TrackedField, MEMBER_NUMBER, NATIONAL_FIRST_NAME, NATIONAL_LAST_NAME};
use crate::model::{
    member_key, AuditResult, Discrepancy, Finding, Notice, NoticeKind, Record, Roster, Value,
};
use crate::normalize::{normalize_date, normalize_local, NormalizedRecord};

/// Reconcile a national roster against a local roster.
///
/// Findings come out in national iteration order and, within a member, in
/// `TrackedField::ALL` order. Fails only when a roster lacks a required column.
pub fn reconcile(local: &Roster, national: &Roster) -> Result<AuditResult, ReconError> {
    fields::check_columns(national)?;
    let normalized = normalize_local(local)?;
    reconcile_normalized(&normalized, national)
}

/// Reconcile against a local roster already passed through `normalize_local`.
pub fn reconcile_normalized(
    normalized: &[NormalizedRecord],
    national: &Roster,
) -> Result<AuditResult, ReconError> {
    fields::check_columns(national)?;
    let index = index_by_member(normalized);

    let mut findings = Vec::new();
    let mut matched = 0;

    for record in &national.records {
        let member_id = national_member_id(record);
        let member_name = national_display_name(record);

        let candidates: &[usize] = member_key(record.get(MEMBER_NUMBER))
            .and_then(|key| index.get(&key))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        match candidates {
            [] => findings.push(Finding::Unmatched(Notice {
                kind: NoticeKind::Unmatched,
                member_id,
                member_name,
                local_matches: 0,
            })),
            [only] => {
                matched += 1;
                compare_fields(record, &normalized[*only], &member_id, &mut findings);
            }
            many => findings.push(Finding::Ambiguous(Notice {
                kind: NoticeKind::Ambiguous,
                member_id,
                member_name,
                local_matches: many.len(),
            })),
        }
    }

    let summary = compute_summary(&findings, normalized.len(), national.len(), matched);
    log::info!(
        "audited {} national records against {} local: {} matched, {} unmatched, {} ambiguous, {} mismatches",
        summary.national_records,
        summary.local_records,
        summary.matched,
        summary.unmatched,
        summary.ambiguous,
        summary.mismatches,
    );

    Ok(AuditResult { summary, findings })
}

/// Member key -> positions in the normalized local roster, in roster order.
fn index_by_member(records: &[NormalizedRecord]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, rec) in records.iter().enumerate() {
        if let Some(ref key) = rec.member_key {
            index.entry(key.clone()).or_default().push(i);
        }
    }

    let mut duplicates: Vec<(&String, usize)> = index
        .iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|(key, rows)| (key, rows.len()))
        .collect();
    duplicates.sort();
    for (key, count) in duplicates {
        log::warn!("local roster: member number {key} appears {count} times");
    }

    index
}

fn compare_fields(
    national: &Record,
    local: &NormalizedRecord,
    member_id: &str,
    findings: &mut Vec<Finding>,
) {
    for field in TrackedField::ALL {
        let raw = national.get(field.national_column());
        // No national value means no assertion to check.
        let Some(expected) = normalize_date(raw) else {
            continue;
        };
        let actual = local.field(field);
        if actual != Some(expected.as_str()) {
            // Text is reported as written; typed dates in the compared form.
            let national = match raw {
                Value::Date(_) => expected,
                _ => raw.render().unwrap_or(expected),
            };
            findings.push(Finding::Mismatch(Discrepancy {
                member_id: member_id.to_string(),
                member_name: local.employee.clone(),
                field: field.label().to_string(),
                national,
                local: actual.map(str::to_string),
            }));
        }
    }
}

fn national_member_id(record: &Record) -> String {
    let value = record.get(MEMBER_NUMBER);
    member_key(value).unwrap_or_default()
}

fn national_display_name(record: &Record) -> String {
    let first = record.get(NATIONAL_FIRST_NAME).render().unwrap_or_default();
    let last = record.get(NATIONAL_LAST_NAME).render().unwrap_or_default();
    format!("{first} {last}").trim().to_string()
}
