//! Output formatters for run summaries

use anyhow::Result;
use colored::*;
use sheetlingo_core::{DirectionSummary, RunSummary};

/// Print a run summary in human-readable format with colors
pub fn print_human(summary: &RunSummary) {
    println!(
        "{}",
        format!("Translating: {}", summary.input.display()).bold()
    );
    println!(
        "  {} {} ({} rows, {} → {} columns{})",
        "Sheet:".bold(),
        summary.sheet.cyan(),
        summary.rows,
        summary.input_columns,
        summary.output_columns,
        if summary.staged { ", staged" } else { "" }
    );
    println!();

    for direction in &summary.directions {
        print_direction(direction);
    }

    let failed = summary.failed_items();
    if failed == 0 {
        println!("{}", "✓ All strings translated".green().bold());
    } else {
        println!(
            "{} {} string(s) kept their original text",
            "!".yellow().bold(),
            failed
        );
    }
    println!("{} {}", "Saved:".bold(), summary.output.display());
}

fn print_direction(direction: &DirectionSummary) {
    let report = &direction.report;
    println!(
        "{} {} via {} [{}]",
        "Direction:".bold(),
        direction.direction.to_string().cyan().bold(),
        direction.provider,
        direction.columns.join(", ").bright_black()
    );
    println!(
        "  {} cells, {} unique, {} batches, {} calls",
        report.requested, report.unique, report.batches, report.provider_calls
    );
    if report.degraded_batches > 0 {
        println!(
            "  {} {} batch(es) fell back to one call per string",
            "WARN".yellow().bold(),
            report.degraded_batches
        );
    }
    if report.failed_items > 0 {
        println!(
            "  {} {} string(s) failed",
            "ERROR".red().bold(),
            report.failed_items
        );
    }
    println!();
}

/// Print a run summary in JSON format
pub fn print_json(summary: &RunSummary) -> Result<()> {
    let output = serde_json::json!({
        "run": summary,
        "summary": {
            "directions": summary.directions.len(),
            "failed": summary.failed_items(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
