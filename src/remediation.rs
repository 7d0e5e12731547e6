//! Remediation Module
//!
//! Writes the plain-text remediation extract that accompanies a compliance
//! table: one block per failing row.

use crate::compliance::FilteredRow;
use crate::error::ReportError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR_WIDTH: usize = 80;

/// Renders the extract for `rows`. Rows that did not fail are skipped.
pub fn render_remediation(rows: &[FilteredRow]) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    rows.iter()
        .filter(|row| row.is_failure())
        .map(|row| {
            format!(
                "Compliance Standard: {}\nRule Information: {}\nRemediation: {}\n{}\n",
                row.standard_label, row.rule_title, row.remediation, separator
            )
        })
        .collect()
}

/// File name for the extract of one source table.
///
/// The source stem is part of the name so a batch sharing one title does
/// not overwrite its own extracts.
pub fn remediation_file_name(title: &str, source_stem: &str) -> String {
    let title: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if title.is_empty() {
        format!("{source_stem}_Remediation.txt")
    } else {
        format!("{title}_{source_stem}_Remediation.txt")
    }
}

/// Writes the extract to `path`, returning the number of blocks written.
pub fn write_remediation(rows: &[FilteredRow], path: &Path) -> Result<usize, ReportError> {
    let file = File::create(path).map_err(|e| ReportError::output(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_remediation(rows).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| ReportError::output(path, e))?;

    let blocks = rows.iter().filter(|row| row.is_failure()).count();
    info!("Wrote {} remediation entries to {:?}", blocks, path);
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, status: &str) -> FilteredRow {
        FilteredRow {
            computer_name: "WS-01".to_string(),
            rule_title: title.to_string(),
            standard_label: "HIPAA".to_string(),
            standard_rule_value: "164.312".to_string(),
            status: status.to_string(),
            remediation: format!("Remediate {title}"),
        }
    }

    #[test]
    fn writes_one_block_per_failure() {
        let text = render_remediation(&[row("A", "FAILED"), row("B", "PASSED"), row("C", "FAILED")]);
        let expected = format!(
            "Compliance Standard: HIPAA\nRule Information: A\nRemediation: Remediate A\n{sep}\n\
             Compliance Standard: HIPAA\nRule Information: C\nRemediation: Remediate C\n{sep}\n",
            sep = "-".repeat(80)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn passing_rows_produce_an_empty_extract() {
        assert!(render_remediation(&[row("A", "PASSED"), row("B", "WARNING")]).is_empty());
    }

    #[test]
    fn names_are_unique_per_source_and_filesystem_safe() {
        assert_eq!(
            remediation_file_name("Q3 Audit", "WS-01"),
            "Q3 Audit_WS-01_Remediation.txt"
        );
        assert_eq!(
            remediation_file_name("a/b: c", "WS-01"),
            "a_b_ c_WS-01_Remediation.txt"
        );
        assert_eq!(remediation_file_name("  ", "WS-01"), "WS-01_Remediation.txt");
    }

    #[test]
    fn writes_the_extract_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.txt");
        let blocks = write_remediation(&[row("A", "FAILED"), row("B", "PASSED")], &path).unwrap();
        assert_eq!(blocks, 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Compliance Standard: HIPAA\n"));
    }

    #[test]
    fn unwritable_path_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_remediation(&[], &dir.path().join("missing/extract.txt")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Output);
    }
}
