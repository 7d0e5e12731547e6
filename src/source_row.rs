//! Source Row Module
//!
//! Reads a scan-result CSV and normalizes each row into a [`SourceRow`],
//! including the embedded compliance-tag list.

use crate::compliance::ComplianceTag;
use crate::error::ReportError;
use csv::StringRecord;
use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Placeholder for optional columns that are absent.
pub const NOT_AVAILABLE: &str = "N/A";

const TITLE: &str = "Title";
const DESCRIPTION: &str = "Description";
const REFERENCES: &str = "References";
const RATIONALE: &str = "Rationale";
const RESULT: &str = "Result";
const REMEDIATION: &str = "Remediation";
const COMPLIANCE: &str = "Compliance";

/// Normalized outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Passed,
    Failed,
    NotApplicable,
    /// Any other result, upper-cased.
    Other(String),
}

impl ScanResult {
    /// Case-insensitive parse of the `Result` column.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "PASS" | "PASSED" => ScanResult::Passed,
            "FAIL" | "FAILED" => ScanResult::Failed,
            "NOT APPLICABLE" | "NOT_APPLICABLE" => ScanResult::NotApplicable,
            _ => ScanResult::Other(upper),
        }
    }

    /// The upper-case status string printed in reports.
    pub fn status(&self) -> String {
        match self {
            ScanResult::Passed => "PASSED".to_string(),
            ScanResult::Failed => "FAILED".to_string(),
            ScanResult::NotApplicable => "NOT APPLICABLE".to_string(),
            ScanResult::Other(raw) => raw.clone(),
        }
    }
}

/// One scan finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub title: String,
    pub description: String,
    pub references: String,
    pub rationale: String,
    pub result: ScanResult,
    pub remediation: String,
    pub compliance_tags: Vec<ComplianceTag>,
}

/// All rows of one source table.
#[derive(Debug)]
pub struct SourceTable {
    pub path: PathBuf,
    /// File name without its extension, used as the host name in reports.
    pub computer_name: String,
    pub rows: Vec<SourceRow>,
}

/// Header positions of the columns we read.
#[derive(Debug)]
struct ColumnIndex {
    title: usize,
    description: usize,
    references: Option<usize>,
    rationale: usize,
    result: usize,
    remediation: Option<usize>,
    compliance: Option<usize>,
}

impl ColumnIndex {
    fn resolve(
        headers: &StringRecord,
        path: &Path,
        require_compliance: bool,
    ) -> Result<Self, ReportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let require = |name: &'static str| {
            find(name).ok_or_else(|| ReportError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
        };

        let compliance = if require_compliance {
            Some(require(COMPLIANCE)?)
        } else {
            find(COMPLIANCE)
        };

        Ok(ColumnIndex {
            title: require(TITLE)?,
            description: require(DESCRIPTION)?,
            references: find(REFERENCES),
            rationale: require(RATIONALE)?,
            result: require(RESULT)?,
            remediation: find(REMEDIATION),
            compliance,
        })
    }
}

#[derive(Deserialize)]
struct RawTag {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Decodes the compliance column.
///
/// Scanners often emit the list with single quotes, so every `'` is replaced
/// with `"` before parsing. Returns `None` when the result is still not a
/// list of `{key, value}` objects.
pub fn parse_compliance_tags(raw: &str) -> Option<Vec<ComplianceTag>> {
    if raw.trim().is_empty() {
        return Some(Vec::new());
    }
    let repaired = raw.replace('\'', "\"");
    let tags: Vec<RawTag> = serde_json::from_str(&repaired).ok()?;
    Some(
        tags.into_iter()
            .map(|tag| ComplianceTag {
                key: tag.key,
                value: match tag.value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect(),
    )
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

fn optional_field(record: &StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn normalize_row(record: &StringRecord, columns: &ColumnIndex, line: usize) -> SourceRow {
    let compliance_tags = match columns.compliance.and_then(|i| record.get(i)) {
        Some(raw) => parse_compliance_tags(raw).unwrap_or_else(|| {
            warn!("Row {}: unparsable compliance data, treating as untagged.", line);
            Vec::new()
        }),
        None => Vec::new(),
    };

    SourceRow {
        title: field(record, columns.title),
        description: field(record, columns.description),
        references: optional_field(record, columns.references),
        rationale: field(record, columns.rationale),
        result: ScanResult::parse(&field(record, columns.result)),
        remediation: optional_field(record, columns.remediation),
        compliance_tags,
    }
}

/// Reads every row from `reader`. `path` is used for error reporting and to
/// derive the computer name.
pub fn read_source_rows<R: Read>(
    reader: R,
    path: &Path,
    require_compliance: bool,
) -> Result<Vec<SourceRow>, ReportError> {
    let source_err = |source| ReportError::SourceRead {
        path: path.to_path_buf(),
        source,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(source_err)?.clone();
    let columns = ColumnIndex::resolve(&headers, path, require_compliance)?;

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record.map_err(source_err)?;
        // Header is line 1.
        rows.push(normalize_row(&record, &columns, i + 2));
    }
    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Opens and reads a whole source table.
pub fn read_source_table(path: &Path, require_compliance: bool) -> Result<SourceTable, ReportError> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::SourceRead {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let rows = read_source_rows(file, path, require_compliance)?;
    Ok(SourceTable {
        path: path.to_path_buf(),
        computer_name: computer_name(path),
        rows,
    })
}

/// The file name with its extension stripped.
pub fn computer_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
