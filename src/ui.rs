//! Terminal output helpers.
//!
//! `Table` renders rows with box-drawing borders, shrinking the widest columns
//! until the table fits the terminal. [`print_summary`] uses it for the
//! per-unit report shown with `--summary`.

use crate::build::{BuildResult, ProjectReport};
use colored::*;
use console::{measure_text_width, truncate_str};

/// Columns never shrink below this many characters.
const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut s = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let flat = flatten(cell);
                let shown = truncate_str(&flat, width, "...");
                let pad = width.saturating_sub(measure_text_width(&shown));
                let shown = if bold {
                    shown.as_ref().bold().to_string()
                } else {
                    shown.to_string()
                };
                s.push_str(&format!(" {}{} │", shown, " ".repeat(pad)));
            }
            s
        };

        let mut out = vec![border("┌", "┬", "┐"), line(self.headers.as_slice(), true)];
        out.push(border("├", "┼", "┤"));
        out.extend(self.rows.iter().map(|row| line(row.as_slice(), false)));
        out.push(border("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(measure_text_width(&flatten(cell)));
            }
        }

        // "  │" plus " x │" per column
        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > budget {
            let Some(widest) = widths.iter_mut().filter(|w| **w > MIN_COLUMN).max() else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn flatten(s: &str) -> String {
    s.replace(['\n', '\r', '\t'], " ")
}

pub fn print_summary(report: &ProjectReport) {
    let mut table = Table::new(&["File", "Kind", "Status", "Time"]);
    for result in report.headers.iter().chain(&report.sources) {
        table.add_row(summary_row(result));
    }
    for path in &report.ignored {
        table.add_row(vec![
            path.display().to_string(),
            "-".dimmed().to_string(),
            "ignored".yellow().to_string(),
            "-".dimmed().to_string(),
        ]);
    }
    table.print();
}

fn summary_row(result: &BuildResult) -> Vec<String> {
    let status = if result.rebuilt {
        "compiled".green().to_string()
    } else {
        "up to date".dimmed().to_string()
    };
    vec![
        result.source.path.display().to_string(),
        result.source.kind.to_string(),
        status,
        format!("{:.2?}", result.elapsed),
    ]
}
