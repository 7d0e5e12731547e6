//! Compliance Module
//!
//! Maps compliance-standard keys to display labels and fans source rows out
//! into one table row per selected standard tag.

use crate::source_row::{ScanResult, SourceRow};
use std::collections::BTreeSet;

/// Known standard keys and the labels printed in reports.
const COMPLIANCE_MAPPING: &[(&str, &str)] = &[
    ("hipaa", "HIPAA"),
    ("nist_800_53", "NIST"),
    ("pci_dss", "PCI DSS"),
    ("gdpr_IV", "GDPR"),
];

/// One `{key, value}` pair from a finding's compliance column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceTag {
    pub key: String,
    pub value: String,
}

/// Returns the display label for a standard key, or the key itself when it
/// is not part of the mapping.
pub fn standard_label(key: &str) -> &str {
    COMPLIANCE_MAPPING
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

/// All keys the mapping knows about, in declaration order.
pub fn known_standard_keys() -> impl Iterator<Item = &'static str> {
    COMPLIANCE_MAPPING.iter().map(|(k, _)| *k)
}

/// One (finding x matched standard) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredRow {
    pub computer_name: String,
    pub rule_title: String,
    pub standard_label: String,
    pub standard_rule_value: String,
    /// Upper-cased raw result, e.g. `PASSED` or `FAILED`.
    pub status: String,
    pub remediation: String,
}

impl FilteredRow {
    /// True when the status denotes a failed check (`FAIL` or `FAILED`).
    pub fn is_failure(&self) -> bool {
        matches!(self.status.as_str(), "FAIL" | "FAILED")
    }
}

/// Emits one [`FilteredRow`] per tag of `row` whose key is selected.
///
/// Rows whose result is not applicable never produce output. Emission order
/// follows the row's tag order.
pub fn filter_row(
    row: &SourceRow,
    computer_name: &str,
    selected: &BTreeSet<String>,
) -> Vec<FilteredRow> {
    if row.result == ScanResult::NotApplicable {
        return Vec::new();
    }

    row.compliance_tags
        .iter()
        .filter(|tag| selected.contains(&tag.key))
        .map(|tag| FilteredRow {
            computer_name: computer_name.to_string(),
            rule_title: row.title.clone(),
            standard_label: standard_label(&tag.key).to_string(),
            standard_rule_value: tag.value.clone(),
            status: row.result.status(),
            remediation: row.remediation.clone(),
        })
        .collect()
}

/// Runs [`filter_row`] over a whole table, keeping file order.
pub fn filter_rows(
    rows: &[SourceRow],
    computer_name: &str,
    selected: &BTreeSet<String>,
) -> Vec<FilteredRow> {
    rows.iter()
        .flat_map(|row| filter_row(row, computer_name, selected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: &str, value: &str) -> ComplianceTag {
        ComplianceTag {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn row(result: &str, tags: Vec<ComplianceTag>) -> SourceRow {
        SourceRow {
            title: "Ensure firewall is enabled".to_string(),
            description: "Checks the firewall".to_string(),
            references: "N/A".to_string(),
            rationale: "Reduces exposure".to_string(),
            result: ScanResult::parse(result),
            remediation: "Enable the firewall".to_string(),
            compliance_tags: tags,
        }
    }

    fn selected(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn maps_known_keys_and_falls_back_to_raw_key() {
        assert_eq!(standard_label("hipaa"), "HIPAA");
        assert_eq!(standard_label("pci_dss"), "PCI DSS");
        assert_eq!(standard_label("gdpr_IV"), "GDPR");
        assert_eq!(standard_label("iso_27001"), "iso_27001");
        assert_eq!(known_standard_keys().count(), 4);
    }

    #[test]
    fn fans_out_one_row_per_matched_tag_in_tag_order() {
        let source = row(
            "failed",
            vec![
                tag("pci_dss", "1.1"),
                tag("cis", "2.3"),
                tag("hipaa", "164.312"),
                tag("pci_dss", "8.2"),
            ],
        );
        let out = filter_row(&source, "ws-01", &selected(&["hipaa", "pci_dss"]));

        assert_eq!(out.len(), 3);
        let labels: Vec<_> = out.iter().map(|r| r.standard_label.as_str()).collect();
        assert_eq!(labels, ["PCI DSS", "HIPAA", "PCI DSS"]);
        assert!(out.iter().all(|r| r.status == "FAILED"));
        assert!(out.iter().all(|r| r.remediation == "Enable the firewall"));
        assert!(out.iter().all(|r| r.computer_name == "ws-01"));
        assert_eq!(out[1].standard_rule_value, "164.312");
    }

    #[test]
    fn not_applicable_rows_never_produce_output() {
        let source = row("Not Applicable", vec![tag("hipaa", "164.312")]);
        assert!(filter_row(&source, "ws-01", &selected(&["hipaa"])).is_empty());
    }

    #[test]
    fn unselected_tags_produce_nothing() {
        let source = row("PASSED", vec![tag("nist_800_53", "AC-2")]);
        assert!(filter_row(&source, "ws-01", &selected(&["hipaa"])).is_empty());
    }

    #[test]
    fn unmapped_selected_key_keeps_raw_label() {
        let source = row("PASSED", vec![tag("soc2", "CC6.1")]);
        let out = filter_row(&source, "ws-01", &selected(&["soc2"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].standard_label, "soc2");
        assert!(!out[0].is_failure());
    }

    #[test]
    fn filters_whole_tables_in_file_order() {
        let rows = vec![
            row("FAILED", vec![tag("hipaa", "a")]),
            row("NOT APPLICABLE", vec![tag("hipaa", "b")]),
            row("PASSED", vec![tag("hipaa", "c")]),
        ];
        let out = filter_rows(&rows, "ws-01", &selected(&["hipaa"]));
        let values: Vec<_> = out.iter().map(|r| r.standard_rule_value.as_str()).collect();
        assert_eq!(values, ["a", "c"]);
        assert!(out[0].is_failure());
    }
}
