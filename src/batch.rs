//! Batch Module
//!
//! Per-file report pipelines and the status records handed back to callers.
//! Every failure ends up in a [`FileReport`]; nothing here aborts a batch.

use crate::compliance::filter_rows;
use crate::document_builder::{
    RenderContext, build_compliance_table_pdf, build_failure_list_pdf, write_pdf,
};
use crate::error::{ErrorKind, ReportError};
use crate::logo::LogoSpec;
use crate::remediation::{remediation_file_name, write_remediation};
use crate::report_model::{ComplianceTable, FailureList};
use crate::source_row::{computer_name, read_source_table};
use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome for one artifact of one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Written { path: PathBuf },
    Failed { kind: ErrorKind, reason: String },
}

impl ArtifactStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactStatus::Written { .. })
    }

    fn from_result(result: Result<PathBuf, ReportError>) -> Self {
        match result {
            Ok(path) => ArtifactStatus::Written { path },
            Err(e) => ArtifactStatus::from_error(&e),
        }
    }

    fn from_error(e: &ReportError) -> Self {
        ArtifactStatus::Failed {
            kind: e.kind(),
            reason: e.to_string(),
        }
    }
}

/// Status of one processed source table.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub pdf: ArtifactStatus,
    /// Only set for compliance-table reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<ArtifactStatus>,
    /// Rows that made it into the report.
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.pdf.is_written() && self.remediation.as_ref().is_none_or(ArtifactStatus::is_written)
    }

    /// One human-readable line, e.g. for a status bar.
    pub fn status_line(&self) -> String {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match (&self.pdf, &self.remediation) {
            (ArtifactStatus::Failed { kind, reason }, _) => {
                format!("PDF generation failed for {name} ({} error): {reason}", kind.label())
            }
            (_, Some(ArtifactStatus::Failed { kind, reason })) => format!(
                "PDF generated for {name}, remediation extract failed ({} error): {reason}",
                kind.label()
            ),
            _ => format!("PDF generation successful for {name}"),
        }
    }
}

/// Statuses for every file of a run, in processing order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| !f.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Writes the report as pretty JSON.
    pub fn write_summary(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;
        fs::write(path, json).with_context(|| format!("Failed to write summary to {:?}", path))
    }
}

/// Inputs shared by every file of one run.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings<'a> {
    pub footer: &'a str,
    pub logo: Option<&'a LogoSpec>,
}

/// Lists the `.csv` files directly inside `folder`, sorted by name.
pub fn collect_sources(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read input folder {:?}", folder))?;
    let mut sources = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list input folder {:?}", folder))?
            .path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// `<output_dir>/<source stem>.pdf`
pub fn derived_pdf_path(source: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.pdf", computer_name(source)))
}

/// Builds a failure-list PDF for `source`.
pub fn process_failure_list(
    source: &Path,
    output: &Path,
    title: &str,
    settings: RunSettings,
) -> FileReport {
    let table = match read_source_table(source, false) {
        Ok(table) => table,
        Err(e) => return failed_input(source, e, false),
    };

    let model = FailureList::build(table.rows);
    let ctx = RenderContext::new(title, settings.footer, settings.logo);
    let rendered = build_failure_list_pdf(&model, &ctx);
    let pdf = ArtifactStatus::from_result(write_pdf(&rendered, output).map(|_| output.to_path_buf()));
    if let ArtifactStatus::Failed { reason, .. } = &pdf {
        error!("{}", reason);
    }

    FileReport {
        source: source.to_path_buf(),
        pdf,
        remediation: None,
        rows: model.rows.len(),
        pages: Some(rendered.page_count),
    }
}

/// Builds a compliance-table PDF for `source` plus its remediation extract
/// next to the source table. Each artifact succeeds or fails on its own.
pub fn process_compliance_table(
    source: &Path,
    output: &Path,
    title: &str,
    selected: &BTreeSet<String>,
    settings: RunSettings,
) -> FileReport {
    let table = match read_source_table(source, true) {
        Ok(table) => table,
        Err(e) => return failed_input(source, e, true),
    };

    let rows = filter_rows(&table.rows, &table.computer_name, selected);
    info!(
        "{:?}: {} findings fanned out into {} table rows",
        table.path,
        table.rows.len(),
        rows.len()
    );

    let model = ComplianceTable::build(&rows);
    let ctx = RenderContext::new(title, settings.footer, settings.logo);
    let rendered = build_compliance_table_pdf(&model, &ctx);
    let pdf = ArtifactStatus::from_result(write_pdf(&rendered, output).map(|_| output.to_path_buf()));

    let remediation_dir = source.parent().unwrap_or_else(|| Path::new(""));
    let remediation_path =
        remediation_dir.join(remediation_file_name(title, &table.computer_name));
    let remediation = ArtifactStatus::from_result(
        write_remediation(&rows, &remediation_path).map(|_| remediation_path.clone()),
    );

    for status in [&pdf, &remediation] {
        if let ArtifactStatus::Failed { reason, .. } = status {
            error!("{}", reason);
        }
    }

    FileReport {
        source: source.to_path_buf(),
        pdf,
        remediation: Some(remediation),
        rows: rows.len(),
        pages: Some(rendered.page_count),
    }
}

fn failed_input(source: &Path, e: ReportError, with_remediation: bool) -> FileReport {
    error!("{}", e);
    let status = ArtifactStatus::from_error(&e);
    FileReport {
        source: source.to_path_buf(),
        pdf: status.clone(),
        remediation: with_remediation.then_some(status),
        rows: 0,
        pages: None,
    }
}
