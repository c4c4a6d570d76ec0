// UI layer: the terminal side of a run. Shows the parse preview, asks for
// confirmation and credentials with `dialoguer`, and shows a spinner
// while batches upload.

use std::time::Duration;

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{Credentials, PassFailDrop};
use crate::pipeline::Confirmation;
use crate::upload::UploadSummary;

const HEADERS: [&str; 8] = [
    "courseSubject",
    "courseCrse",
    "year",
    "semester",
    "section",
    "failed",
    "dropped",
    "total",
];

/// Render records as a plain-text table, one row per record, with a
/// header row and columns padded to their widest cell.
pub fn render_table(records: &[PassFailDrop]) -> String {
    let rows: Vec<[String; 8]> = records
        .iter()
        .map(|r| {
            [
                r.course_subject.clone(),
                r.course_crse.clone(),
                r.year.to_string(),
                r.semester.to_string(),
                r.section.clone(),
                r.failed.to_string(),
                r.dropped.to_string(),
                r.total.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(rule(&widths, "┌", "┬", "┐"));
    out.push(table_line(&HEADERS, &widths));
    out.push(rule(&widths, "├", "┼", "┤"));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(table_line(&cells, &widths));
    }
    out.push(rule(&widths, "└", "┴", "┘"));
    out.join("\n")
}

fn table_line(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect();
    format!("│{}│", padded.join("│"))
}

fn rule(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let dashes: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, dashes.join(mid), right)
}

/// Print the preview and ask whether it looks right. With `assume_yes`
/// the question is skipped and the answer is yes.
pub fn confirm_preview(records: &[PassFailDrop], assume_yes: bool) -> Result<Confirmation> {
    println!("This is what the data looks like so far:");
    println!("{}", render_table(records));
    if assume_yes {
        return Ok(Confirmation::Approved);
    }
    let approved = Confirm::new()
        .with_prompt("Is it being parsed correctly?")
        .default(false)
        .interact()?;
    Ok(approved.into())
}

/// Ask for the authentication token (hidden) and the endpoint. Neither is
/// checked; a bad value fails on the first upload.
pub fn prompt_credentials() -> Result<Credentials> {
    let token: String = Password::new()
        .with_prompt("Authentication token")
        .interact()?;
    let endpoint: String = Input::new().with_prompt("Endpoint").interact_text()?;
    Ok(Credentials { endpoint, token })
}

/// Spinner shown for the whole upload.
pub fn upload_spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Uploading data...");
    Ok(spinner)
}

pub fn update_spinner(spinner: &ProgressBar, summary: UploadSummary) {
    spinner.set_message(format!(
        "Uploading data... {} records in {} batches",
        summary.records, summary.batches
    ));
}

/// Dump the batch that failed so the operator can see what did not make
/// it, as a table and as the JSON body that was sent.
pub fn report_failed_batch(batch: usize, records: &[PassFailDrop]) {
    eprintln!("Batch {} was not uploaded ({} records):", batch, records.len());
    eprintln!("{}", render_table(records));
    match serde_json::to_string_pretty(records) {
        Ok(json) => eprintln!("{}", json),
        Err(e) => log::warn!("could not serialize failed batch: {}", e),
    }
}
