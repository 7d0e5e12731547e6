#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object};
use scanreport::{Config, ReportMode};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const FINDING_HEADER: &str = "Title,Description,References,Rationale,Result,Remediation,Compliance";

/// One CSV line for a finding with the given compliance column.
pub fn finding(title: &str, result: &str, compliance: &str) -> String {
    format!(
        "{title},Checks {title},CIS 1.1,Reduces risk,{result},Fix {title},\"{compliance}\""
    )
}

pub fn write_csv(dir: &Path, name: &str, header: &str, lines: &[String]) -> PathBuf {
    let mut body = String::from(header);
    body.push('\n');
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, body).expect("write csv");
    path
}

pub fn config(input: &Path, mode: ReportMode) -> Config {
    Config {
        input: input.to_path_buf(),
        output: None,
        mode,
        logo: None,
        title: "Quarterly Audit".to_string(),
        footer: "https://example.com".to_string(),
        standards: BTreeSet::new(),
        write_summary: false,
    }
}

pub fn standards(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Text shown by every `Tj` operator, grouped by page.
pub fn page_texts(pdf: &Path) -> Vec<Vec<String>> {
    let doc = Document::load(pdf).expect("load pdf");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let data = doc.get_page_content(page_id).expect("page content");
            let content = Content::decode(&data).expect("decode content");
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// MediaBox width and height of every page.
pub fn page_sizes(pdf: &Path) -> Vec<(f32, f32)> {
    let doc = Document::load(pdf).expect("load pdf");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).expect("page dict");
            let media_box = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("media box");
            let number = |obj: &Object| match obj {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r as f32,
                other => panic!("unexpected media box entry {other:?}"),
            };
            (number(&media_box[2]), number(&media_box[3]))
        })
        .collect()
}

pub fn count_starting_with(texts: &[Vec<String>], prefix: &str) -> usize {
    texts.iter().flatten().filter(|t| t.starts_with(prefix)).count()
}

/// All shown text of the document joined with spaces.
pub fn joined(texts: &[Vec<String>]) -> String {
    texts.iter().flatten().cloned().collect::<Vec<_>>().join(" ")
}

/// Asserts the footer of page `i` reads `Page {i + 1}` exactly once.
pub fn assert_page_numbers(texts: &[Vec<String>]) {
    for (i, page) in texts.iter().enumerate() {
        let numbers: Vec<_> = page.iter().filter(|t| t.starts_with("Page ")).collect();
        assert_eq!(numbers, vec![&format!("Page {}", i + 1)], "page {}", i + 1);
        assert!(
            page.iter().any(|t| t.starts_with("https://example.com - Generated on: ")),
            "footer missing on page {}",
            i + 1
        );
    }
}
