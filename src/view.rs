//! Plain-text rendering for the terminal. Everything here returns a
//! `String`; printing is left to the caller.

use std::fmt::Write as _;

use crate::bulk::{BulkRun, RunStop};
use crate::errors::AppError;
use crate::models::{CsvRow, EligibilityOutcome};
use crate::report::{DistributionEntry, TableRow};

const BAR_WIDTH: usize = 40;

pub fn render_rows(rows: &[CsvRow]) -> String {
    let mut out = format!("CSV Rows ({}):\n", rows.len());
    for row in rows {
        let _ = writeln!(
            out,
            "  Row {}: purposeId={} {} {}",
            row.id, row.payload.purpose_id, row.meta.first_name, row.meta.last_name
        );
    }
    out
}

/// Per-row status header followed by the raw reply.
pub fn render_raw_results(outcomes: &[EligibilityOutcome]) -> String {
    let mut out = String::new();
    for o in outcomes {
        let body = serde_json::to_string_pretty(&o.response).unwrap_or_default();
        let _ = writeln!(out, "Row {} - {}", o.row_id, o.status.as_str().to_uppercase());
        let _ = writeln!(out, "{}\n", body);
    }
    out
}

pub fn render_table(rows: &[TableRow]) -> String {
    let header = [
        "Row", "First Name", "Last Name", "Phone", "Email", "Purpose ID", "Status", "Code",
        "Description",
    ];
    let cells: Vec<[String; 9]> = rows
        .iter()
        .map(|r| {
            [
                r.row_id.to_string(),
                r.first_name.clone(),
                r.last_name.clone(),
                r.phone.clone(),
                r.email.clone(),
                r.purpose_id.clone(),
                r.status.as_str().to_uppercase(),
                r.code.clone(),
                r.description.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &cells {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for line in &cells {
        push_line(&mut out, line.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

/// Horizontal bar chart, bars scaled to the largest count.
pub fn render_distribution(entries: &[DistributionEntry]) -> String {
    if entries.is_empty() {
        return "No results to chart.\n".to_string();
    }

    let max = entries.iter().map(|e| e.count).max().unwrap_or(1).max(1);
    let code_width = entries
        .iter()
        .map(|e| e.response_code.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from("Response code distribution:\n");
    for e in entries {
        // Any non-zero count gets at least one block.
        let len = ((e.count * BAR_WIDTH) + max - 1) / max;
        let _ = writeln!(
            out,
            "  {:<cw$} | {:<bw$} {} ({})",
            e.response_code,
            "#".repeat(len),
            e.count,
            e.description,
            cw = code_width,
            bw = BAR_WIDTH,
        );
    }
    out
}

pub fn render_run_summary(run: &BulkRun) -> String {
    match run.stop {
        RunStop::Completed => format!(
            "Bulk run {} finished: {} of {} rows processed.\n",
            run.run_id,
            run.outcomes.len(),
            run.attempted
        ),
        RunStop::MissingToken => {
            "Token missing or expired. Please run `elig token` again.\n".to_string()
        }
        RunStop::AuthExpired { row_id } => format!(
            "Token expired at row {}. Please run `elig token` again. {} result(s) kept.\n",
            row_id,
            run.outcomes.len()
        ),
    }
}

/// The one line shown to the user when a command fails.
pub fn render_error(err: &AppError) -> String {
    format!("Error: {}\n", err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeStatus;

    fn entry(code: &str, count: usize) -> DistributionEntry {
        DistributionEntry {
            response_code: code.into(),
            description: format!("desc {}", code),
            count,
        }
    }

    #[test]
    fn test_distribution_bars_scale_to_max() {
        let text = render_distribution(&[entry("1", 4), entry("DATA_ERROR", 1)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('#').count(), BAR_WIDTH / 4);
        assert!(lines[2].contains("1 (desc DATA_ERROR)"));
    }

    #[test]
    fn test_small_counts_still_get_a_bar() {
        let text = render_distribution(&[entry("A", 1000), entry("B", 1)]);
        assert_eq!(text.lines().nth(2).unwrap().matches('#').count(), 1);
    }

    #[test]
    fn test_empty_distribution() {
        assert_eq!(render_distribution(&[]), "No results to chart.\n");
    }

    #[test]
    fn test_table_aligns_columns() {
        let rows = vec![TableRow {
            row_id: 12,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            phone: "".into(),
            email: "g@example.com".into(),
            purpose_id: "P-12".into(),
            status: OutcomeStatus::Error,
            code: "UNKNOWN".into(),
            description: "Network or server error".into(),
        }];
        let text = render_table(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Row | First Name | Last Name"));
        assert!(lines[2].starts_with("12  | Grace      | Hopper"));
        assert!(lines[2].contains("ERROR"));
        assert!(lines[2].ends_with("Network or server error"));
    }

    #[test]
    fn test_error_line_uses_user_message() {
        assert_eq!(
            render_error(&AppError::AuthExpired),
            "Error: Token expired. Please run `elig token` again.\n"
        );
    }
}
