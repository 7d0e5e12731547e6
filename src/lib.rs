//! ScanReport - Core Library
//!
//! This file contains the primary logic for the application, orchestrating
//! source-table parsing, compliance filtering, logo scaling, PDF layout and
//! the remediation extract for one file or a whole folder.

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// Define modules for different functionalities
pub mod batch;
pub mod compliance;
pub mod document_builder;
pub mod error;
pub mod layout;
pub mod logo;
pub mod remediation;
pub mod report_model;
pub mod source_row;

use batch::{BatchReport, FileReport, RunSettings};
use logo::{LogoAnchor, LogoSpec};

/// Name of the run summary written with `--summary`.
pub const SUMMARY_FILE_NAME: &str = "report_summary.json";

/// The two report shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Every finding as a text block, capped at 30 findings. Portrait.
    FailureList,
    /// Findings fanned out per selected standard into a table. Landscape.
    ComplianceTable,
}

impl ReportMode {
    /// The dimension the logo is capped on in this mode.
    pub fn logo_anchor(self) -> LogoAnchor {
        match self {
            ReportMode::FailureList => LogoAnchor::Width,
            ReportMode::ComplianceTable => LogoAnchor::Height,
        }
    }
}

/// Application configuration structure.
#[derive(Debug)]
pub struct Config {
    /// A source CSV, or a folder of them.
    pub input: PathBuf,
    /// PDF path for a single file, output folder for a folder. Defaults to
    /// the source's folder.
    pub output: Option<PathBuf>,
    pub mode: ReportMode,
    pub logo: Option<PathBuf>,
    /// Document title. In failure-list batches an empty title becomes
    /// `Workstation: <file stem>`.
    pub title: String,
    pub footer: String,
    /// Standard keys to keep in compliance-table mode.
    pub standards: BTreeSet<String>,
    pub write_summary: bool,
}

/// Loads the logo once for the run. Failures only cost the logo.
fn load_run_logo(config: &Config) -> Option<LogoSpec> {
    let path = config.logo.as_ref()?;
    match logo::load_logo(path, config.mode.logo_anchor()) {
        Ok(spec) => Some(spec),
        Err(e) => {
            warn!("{}. Continuing without a logo.", e);
            None
        }
    }
}

fn document_title(config: &Config, source: &Path, batch: bool) -> String {
    if batch && config.mode == ReportMode::FailureList && config.title.trim().is_empty() {
        format!("Workstation: {}", source_row::computer_name(source))
    } else {
        config.title.clone()
    }
}

fn process_one(
    config: &Config,
    source: &Path,
    output: &Path,
    title: &str,
    settings: RunSettings,
) -> FileReport {
    match config.mode {
        ReportMode::FailureList => batch::process_failure_list(source, output, title, settings),
        ReportMode::ComplianceTable => {
            batch::process_compliance_table(source, output, title, &config.standards, settings)
        }
    }
}

/// The main function that orchestrates report generation.
///
/// Per-file failures are recorded in the returned [`BatchReport`]; only an
/// unusable input path or configuration fails the whole run.
pub fn run(config: Config) -> Result<BatchReport> {
    info!("Initializing processing with config: {:?}", config);

    if config.mode == ReportMode::ComplianceTable && config.standards.is_empty() {
        bail!("Compliance-table reports need at least one selected standard");
    }

    let is_batch = config.input.is_dir();
    let sources = if is_batch {
        batch::collect_sources(&config.input)?
    } else if config.input.is_file() {
        vec![config.input.clone()]
    } else {
        bail!("Input path {:?} is neither a file nor a folder", config.input);
    };

    let output_dir = match (&config.output, is_batch) {
        (Some(dir), true) => dir.clone(),
        (_, true) => config.input.clone(),
        (Some(path), false) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        (None, false) => config.input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if is_batch && !output_dir.exists() {
        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    }

    let logo = load_run_logo(&config);
    let settings = RunSettings {
        footer: &config.footer,
        logo: logo.as_ref(),
    };

    if sources.is_empty() {
        warn!("No CSV files found in {:?}", config.input);
    }
    info!("Processing {} source table(s) in {:?} mode", sources.len(), config.mode);

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Generating reports [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let mut report = BatchReport::default();
    for source in &sources {
        let output = match (&config.output, is_batch) {
            (Some(path), false) => path.clone(),
            _ => batch::derived_pdf_path(source, &output_dir),
        };
        let title = document_title(&config, source, is_batch);
        let file_report = process_one(&config, source, &output, &title, settings);
        info!("{}", file_report.status_line());
        pb.set_message(file_report.status_line());
        pb.inc(1);
        report.files.push(file_report);
    }
    pb.finish_with_message(format!(
        "{} of {} reports generated",
        report.files.len() - report.failed(),
        report.files.len()
    ));

    if config.write_summary {
        let summary_path = output_dir.join(SUMMARY_FILE_NAME);
        report.write_summary(&summary_path)?;
        info!("Wrote run summary to {:?}", summary_path);
    }

    Ok(report)
}
