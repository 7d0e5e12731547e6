//! Report Model Module
//!
//! Turns normalized rows into one of the two report shapes the document
//! builder knows how to lay out.

use crate::compliance::FilteredRow;
use crate::source_row::SourceRow;

/// Maximum number of findings listed in a failure-list report.
pub const FAILURE_LIST_CAP: usize = 30;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Color = Color(0.0, 0.0, 0.0);
    pub const BLUE: Color = Color(0.0, 0.0, 1.0);
    pub const GREY: Color = Color(0.5, 0.5, 0.5);
    pub const WHITE_SMOKE: Color = Color(0.96, 0.96, 0.96);
    pub const BEIGE: Color = Color(0.96, 0.96, 0.86);
    pub const IVORY: Color = Color(1.0, 1.0, 0.94);
    pub const PASS_GREEN: Color = Color(0.0, 0.5, 0.0);
    pub const FAIL_RED: Color = Color(1.0, 0.0, 0.0);
}

/// Findings listed one block at a time.
#[derive(Debug, Clone)]
pub struct FailureList {
    pub rows: Vec<SourceRow>,
    pub truncated: bool,
    /// Row count of the source table before the cap.
    pub total: usize,
}

impl FailureList {
    /// Keeps the first [`FAILURE_LIST_CAP`] rows in file order.
    pub fn build(mut rows: Vec<SourceRow>) -> Self {
        let total = rows.len();
        rows.truncate(FAILURE_LIST_CAP);
        FailureList {
            rows,
            truncated: total > FAILURE_LIST_CAP,
            total,
        }
    }

    /// Text of the closing note, present only when rows were dropped.
    pub fn overflow_note(&self) -> Option<String> {
        self.truncated.then(|| {
            format!(
                "Note: This report contains the first {} of {} failures identified. \
                 Please review the CSV file for the remaining {} failures.",
                self.rows.len(),
                self.total,
                self.total - self.rows.len()
            )
        })
    }
}

pub const TABLE_HEADERS: [&str; 5] = [
    "Computer Name",
    "Rule Information",
    "Compliance Standard",
    "Compliance Rule",
    "Status",
];

/// Relative column widths; the table spans the full content width.
pub const COLUMN_WEIGHTS: [f32; 5] = [1.5, 2.5, 2.0, 2.0, 1.0];

/// Index of the column whose background follows the row status.
pub const STATUS_COLUMN: usize = 4;

/// One styled table row.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub cells: [String; 5],
    pub status_color: Color,
}

/// Filtered findings laid out as a five-column table.
#[derive(Debug, Clone)]
pub struct ComplianceTable {
    pub headers: [&'static str; 5],
    pub rows: Vec<TableRow>,
}

/// Background for the status cell. Anything that is not a failure is
/// colored as a pass.
pub fn status_color(row: &FilteredRow) -> Color {
    if row.is_failure() {
        Color::FAIL_RED
    } else {
        Color::PASS_GREEN
    }
}

impl ComplianceTable {
    pub fn build(rows: &[FilteredRow]) -> Self {
        let rows = rows
            .iter()
            .map(|row| TableRow {
                cells: [
                    row.computer_name.clone(),
                    row.rule_title.clone(),
                    row.standard_label.clone(),
                    row.standard_rule_value.clone(),
                    row.status.clone(),
                ],
                status_color: status_color(row),
            })
            .collect();
        ComplianceTable {
            headers: TABLE_HEADERS,
            rows,
        }
    }

    /// Column widths for a table spanning `total_width`.
    pub fn column_widths(total_width: f32) -> [f32; 5] {
        let sum: f32 = COLUMN_WEIGHTS.iter().sum();
        COLUMN_WEIGHTS.map(|w| total_width * w / sum)
    }

    /// Background shared by every cell of data row `index` except the
    /// status cell.
    pub fn row_fill(index: usize) -> Color {
        if index % 2 == 0 { Color::BEIGE } else { Color::IVORY }
    }
}
