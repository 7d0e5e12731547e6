mod common;

use common::*;
use scanreport::{ReportMode, SUMMARY_FILE_NAME, run};
use std::fs;
use tempfile::TempDir;

fn tagged(title: &str, result: &str) -> String {
    finding(title, result, "[{'key':'hipaa','value':'164.308'}]")
}

#[test]
fn folder_runs_report_each_file_and_keep_going_after_failures() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "alpha.csv", FINDING_HEADER, &[tagged("A", "FAILED")]);
    write_csv(dir.path(), "beta.csv", "Title,Result", &["B,FAILED".to_string()]);
    write_csv(dir.path(), "gamma.csv", FINDING_HEADER, &[tagged("C", "FAILED")]);
    fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

    let mut cfg = config(dir.path(), ReportMode::ComplianceTable);
    cfg.standards = standards(&["hipaa"]);
    cfg.write_summary = true;
    let report = run(cfg).unwrap();

    let names: Vec<_> = report
        .files
        .iter()
        .map(|f| f.source.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["alpha.csv", "beta.csv", "gamma.csv"]);
    assert_eq!(report.failed(), 1);
    assert!(!report.files[1].is_success());

    assert!(dir.path().join("alpha.pdf").exists());
    assert!(!dir.path().join("beta.pdf").exists());
    assert!(dir.path().join("gamma.pdf").exists());

    // One extract per source even though every file shares the title.
    let alpha = fs::read_to_string(dir.path().join("Quarterly Audit_alpha_Remediation.txt")).unwrap();
    let gamma = fs::read_to_string(dir.path().join("Quarterly Audit_gamma_Remediation.txt")).unwrap();
    assert!(alpha.contains("Rule Information: A"));
    assert!(gamma.contains("Rule Information: C"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(summary["files"].as_array().unwrap().len(), 3);
    assert_eq!(summary["files"][0]["pdf"]["status"], "written");
    assert_eq!(summary["files"][1]["pdf"]["status"], "failed");
    assert_eq!(summary["files"][1]["pdf"]["kind"], "input");
}

#[test]
fn failure_list_batches_title_each_document_by_workstation() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");
    write_csv(dir.path(), "WS-01.csv", FINDING_HEADER, &[tagged("A", "FAILED")]);
    write_csv(dir.path(), "WS-02.csv", FINDING_HEADER, &[tagged("B", "FAILED")]);

    let mut cfg = config(dir.path(), ReportMode::FailureList);
    cfg.title = String::new();
    cfg.output = Some(out.clone());
    let report = run(cfg).unwrap();
    assert!(report.all_succeeded());

    assert_eq!(page_texts(&out.join("WS-01.pdf"))[0][0], "Workstation: WS-01");
    assert_eq!(page_texts(&out.join("WS-02.pdf"))[0][0], "Workstation: WS-02");
}

#[test]
fn empty_folder_yields_no_reports() {
    let dir = TempDir::new().unwrap();
    let report = run(config(dir.path(), ReportMode::FailureList)).unwrap();
    assert!(report.files.is_empty());
    assert!(report.all_succeeded());
}

#[test]
fn missing_input_fails_the_whole_run() {
    let dir = TempDir::new().unwrap();
    assert!(run(config(&dir.path().join("absent"), ReportMode::FailureList)).is_err());
}
