//! Terminal UI utilities.
//!
//! A box-drawn table sized to the terminal, used for the summary of
//! generated modules.

use crate::convert::{BP_FILE, CompilationUnit, Conversion};
use colored::*;
use console::{measure_text_width, truncate_str};
use std::path::Path;

/// Narrowest a column gets when shrinking to fit the terminal.
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

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column widths, shrinking the widest column until the table fits `max_width`.
    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(cell));
            }
        }
        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= MIN_COLUMN {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> String {
        let widths = self.column_widths(max_width);
        let border = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {left}{}{right}\n", cells.join(mid))
        };
        let row_line = |cells: &[String], header: bool| {
            let mut line = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = truncate_str(cell, width, "...");
                let padding = " ".repeat(width.saturating_sub(measure_text_width(&text)));
                let text = if header {
                    text.bold().to_string()
                } else {
                    text.to_string()
                };
                line.push_str(&format!(" {text}{padding} │"));
            }
            line.push('\n');
            line
        };

        let mut out = border("┌", "┬", "┐");
        out.push_str(&row_line(&self.headers, true));
        out.push_str(&border("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&row_line(row, false));
        }
        out.push_str(&border("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }
        let (_, width) = console::Term::stdout().size();
        print!("{}", self.render(width as usize));
    }
}

fn notes(unit: &CompilationUnit) -> String {
    let mut notes = Vec::new();
    if unit.srcs.len() > 1 {
        notes.push(format!("{} srcs", unit.srcs.len()));
    }
    if unit.has_warning {
        notes.push("warnings".to_string());
    }
    notes.join(", ")
}

/// Table of emitted modules plus counts of error stubs.
pub fn summary_table(conversion: &Conversion) -> Table {
    let mut table = Table::new(&["Module", "Type", "File", "Notes"]);
    let mut modules: Vec<&CompilationUnit> = conversion.modules().collect();
    modules.sort_by(|a, b| a.module_name.cmp(&b.module_name));
    for unit in modules {
        table.add_row(vec![
            unit.module_name.clone(),
            unit.module_type.clone().unwrap_or_default(),
            Path::new(&unit.cargo_dir).join(BP_FILE).display().to_string(),
            notes(unit),
        ]);
    }
    table
}

pub fn print_summary(conversion: &Conversion) {
    let table = summary_table(conversion);
    if table.is_empty() {
        println!("{} No modules generated.", "!".yellow());
    } else {
        table.print();
    }
    let failures = conversion.failures().count();
    if failures > 0 {
        println!(
            "{} {} rustc call(s) could not be converted; see the ERROR comments.",
            "!".yellow(),
            failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fits_content() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Module", "Type"]);
        table.add_row(vec!["libfoo".into(), "rust_library_host_rlib".into()]);
        table.add_row(vec!["short".into()]);
        let out = table.render(200);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Module"));
        assert!(lines[3].contains("rust_library_host_rlib"));
        assert!(lines.iter().all(|l| measure_text_width(l) == measure_text_width(lines[0])));
    }

    #[test]
    fn test_render_shrinks_to_width() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Module"]);
        table.add_row(vec!["a_very_long_module_name_that_does_not_fit".into()]);
        let out = table.render(30);
        assert!(out.lines().all(|l| measure_text_width(l) <= 30));
        assert!(out.contains("..."));
    }
}
