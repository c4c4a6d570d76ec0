// Entrypoint for the uploader.
// - Parses arguments, stages a preview, asks for confirmation and
//   credentials, then uploads.
// - Every fatal error exits with status 1.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use passfaildrop_upload::api::ApiClient;
use passfaildrop_upload::layout::{Column, Layout, Overrides, Preset};
use passfaildrop_upload::pipeline;
use passfaildrop_upload::{ui, Error};

/// Upload per-section pass/fail/drop counts from a spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "passfaildrop-upload", version)]
struct Cli {
    /// Spreadsheet (CSV) to upload
    path: PathBuf,

    /// Column layout of the spreadsheet
    #[arg(long, value_enum, default_value_t = Preset::Termcode)]
    layout: Preset,

    /// Comma-separated column names, overriding the layout's
    #[arg(long, value_enum, value_delimiter = ',')]
    columns: Option<Vec<Column>>,

    /// Leading rows to skip
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Records per upload call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Records shown before asking for confirmation
    #[arg(long)]
    preview: Option<usize>,

    /// Number sections per course in file order instead of reading them
    #[arg(long)]
    section_counter: bool,

    /// Skip the confirmation prompt (the preview is still printed)
    #[arg(short, long)]
    yes: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        match e.downcast_ref::<Error>() {
            Some(Error::InvalidPath(_)) => {
                eprintln!("Path to spreadsheet is invalid or doesn't exist.");
            }
            Some(Error::UserDeclined) => {
                eprintln!("Nothing was uploaded.");
            }
            Some(Error::Upload { batch, records, .. }) => {
                ui::report_failed_batch(*batch, records);
                eprintln!("Error: {:#}", e);
            }
            _ => eprintln!("Error: {:#}", e),
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = Layout::resolve(
        cli.layout,
        Overrides {
            columns: cli.columns,
            skip_rows: cli.skip_rows,
            batch_size: cli.batch_size,
            preview_size: cli.preview,
            section_counter: cli.section_counter,
        },
    )?;
    log::debug!("using layout {:?}", layout);

    let staged = pipeline::stage(&cli.path, layout)?;

    let confirmation = ui::confirm_preview(staged.preview(), cli.yes)?;
    let confirmed = staged.confirm(confirmation)?;

    let credentials = ui::prompt_credentials()?;
    let mut client = ApiClient::new(&credentials)?;
    log::info!("uploading to {}", client.endpoint());

    let spinner = ui::upload_spinner()?;
    match confirmed.commit(&mut client, |summary| ui::update_spinner(&spinner, summary)) {
        Ok(summary) => {
            spinner.finish_with_message(format!(
                "Finished uploading data. ({} records)",
                summary.records
            ));
            Ok(())
        }
        Err(e) => {
            spinner.abandon_with_message("Upload failed.");
            Err(e.into())
        }
    }
}
