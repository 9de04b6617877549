use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::error::Result;

/// Cells longer than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 48;

/// Column-aligned plain-text table.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cells: Vec<String> = cells
            .into_iter()
            .map(|c| truncate(&c.into().replace('\n', " "), MAX_CELL_WIDTH))
            .collect();
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render without color so the result can be compared in tests.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        out.push_str(&join_padded(&self.headers, &widths));
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(&join_padded(row, &widths));
            out.push('\n');
        }
        out
    }

    pub fn print(&self) {
        if self.is_empty() {
            println!("  {}", "(no results)".dimmed());
            return;
        }
        let widths = self.widths();
        println!("  {}", join_padded(&self.headers, &widths).bold());
        println!(
            "  {}",
            widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("  ")
                .dimmed()
        );
        for row in &self.rows {
            println!("  {}", join_padded(row, &widths));
        }
    }
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| {
            let pad = w.saturating_sub(c.chars().count());
            format!("{}{}", c, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Display helper for optional fields.
pub fn opt<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn heading(text: &str) {
    println!("{}", text.green().bold());
}

pub fn success(text: &str) {
    println!("  {} {}", "✓".green(), text);
}

pub fn hint(text: &str) {
    println!("  {}  {}", "ℹ".dimmed(), text.dimmed());
}

/// Color a run/review status by its outcome.
pub fn status(text: &str) -> ColoredString {
    match text {
        "passed" | "approved" | "active" => text.green(),
        "failed" | "error" | "rejected" => text.red(),
        "running" | "reviewing" => text.cyan(),
        "pending" | "revised" => text.yellow(),
        "cancelled" => text.dimmed(),
        _ => text.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_aligns_columns() {
        let mut table = Table::new(["ID", "Name"]);
        table.row(["1", "Checkout"]);
        table.row(["100", "Login"]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "ID   Name");
        assert_eq!(lines[2], "1    Checkout");
        assert_eq!(lines[3], "100  Login");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut table = Table::new(["A", "B", "C"]);
        assert!(table.is_empty());
        table.row(["x"]);
        assert!(!table.is_empty());
        assert!(table.render().lines().nth(2).unwrap().starts_with('x'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_newlines_flattened() {
        let mut table = Table::new(["Description"]);
        table.row(["line one\nline two"]);
        assert!(table.render().contains("line one line two"));
    }

    #[test]
    fn test_opt() {
        assert_eq!(opt(&Some(3)), "3");
        assert_eq!(opt::<String>(&None), "-");
    }
}
