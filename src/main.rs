//! ScanReport - Main Application Entrypoint
//!
//! This file is responsible for parsing command-line arguments, initializing
//! the application environment (like logging), and dispatching the core
//! processing logic.

use clap::{Parser, ValueEnum};
use log::{error, info};
use scanreport::compliance::known_standard_keys;
use scanreport::{ReportMode, run};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// A command-line tool that turns compliance scan results into PDF audit reports.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a scan-result CSV, or a folder of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF (single file) or output folder (folder input). Defaults to
    /// the source's folder
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report layout
    #[arg(short, long, value_enum, default_value_t = Mode::FailureList)]
    mode: Mode,

    /// Logo image placed at the top of the report
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Document title
    #[arg(short, long, default_value_t = String::new())]
    title: String,

    /// Label printed in every page footer (e.g. a URL)
    #[arg(short, long, default_value_t = String::new())]
    footer: String,

    /// Compliance standard to include (compliance-table mode, repeatable)
    #[arg(short, long = "standard", value_enum)]
    standards: Vec<Standard>,

    /// Write a JSON summary of per-file statuses next to the reports
    #[arg(long)]
    summary: bool,

    /// Logging verbosity level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Mode {
    FailureList,
    ComplianceTable,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Standard {
    Hipaa,
    #[value(name = "nist-800-53")]
    Nist80053,
    PciDss,
    GdprIv,
}

impl Standard {
    /// The compliance-mapping key behind this choice.
    fn key(&self) -> Option<&'static str> {
        let name = self.to_possible_value()?.get_name().replace('-', "_");
        known_standard_keys().find(|key| key.eq_ignore_ascii_case(&name))
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Info,
    Debug,
}

fn main() {
    let code = {
        #[cfg(feature = "dhat-heap")]
        let _profiler = dhat::Profiler::new_heap();
        run_cli(Args::parse())
    };
    std::process::exit(code);
}

/// Runs the tool and returns the process exit code.
fn run_cli(args: Args) -> i32 {
    // 1. Initialize Logger
    let log_level = match args.log_level {
        LogLevel::Error => "error",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting ScanReport...");

    // 2. Validate input
    if !args.input.exists() {
        error!("Input path does not exist: {:?}", args.input);
        return 1;
    }
    let mode = match args.mode {
        Mode::FailureList => ReportMode::FailureList,
        Mode::ComplianceTable => ReportMode::ComplianceTable,
    };
    if mode == ReportMode::ComplianceTable && args.standards.is_empty() {
        error!("Select at least one compliance standard with --standard.");
        return 1;
    }

    // 3. Create a configuration object from arguments
    let config = scanreport::Config {
        input: args.input,
        output: args.output,
        mode,
        logo: args.logo,
        title: args.title,
        footer: args.footer,
        standards: args
            .standards
            .iter()
            .filter_map(Standard::key)
            .map(str::to_string)
            .collect::<BTreeSet<_>>(),
        write_summary: args.summary,
    };

    // 4. Run the main application logic
    match run(config) {
        Ok(report) if report.all_succeeded() => {
            info!("Processing completed successfully.");
            0
        }
        Ok(report) => {
            error!(
                "{} of {} reports failed.",
                report.failed(),
                report.files.len()
            );
            3
        }
        Err(e) => {
            error!("Application failed: {:#}", e);
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_standard_choice_resolves_to_a_mapping_key() {
        let keys: Vec<_> = Standard::value_variants()
            .iter()
            .filter_map(Standard::key)
            .collect();
        assert_eq!(keys, ["hipaa", "nist_800_53", "pci_dss", "gdpr_IV"]);
    }
}
