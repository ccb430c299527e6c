//! embold - bionic-reading EPUB converter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use embold::{CancelToken, JobOutcome, ProgressEvent, load_settings, run_batch};

#[derive(Parser)]
#[command(name = "embold")]
#[command(version, about = "Bionic-reading EPUB converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    embold book.epub -d out         Convert one EPUB
    embold *.epub -d out -j 8       Convert a batch with 8 workers")]
struct Cli {
    /// EPUB files to convert
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Destination folder (created if absent)
    #[arg(short, long, value_name = "DIR")]
    dest: PathBuf,

    /// Number of worker threads (overrides settings)
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Settings file
    #[arg(long, value_name = "FILE", default_value = "settings.json")]
    settings: PathBuf,

    /// Suppress log messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the batch and report progress; returns the number of failed jobs.
fn run(cli: Cli) -> embold::Result<usize> {
    let settings = load_settings(&cli.settings);
    let mut options = settings.batch_options();
    if let Some(jobs) = cli.jobs {
        options.workers = jobs;
    }

    let dest = cli.dest.join(&settings.dest_subfolder);
    let total = cli.inputs.len() as u64;
    let handle = run_batch(cli.inputs, dest, options, CancelToken::new())?;

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} archives")
            .expect("valid progress template"),
    );

    let mut failed = 0;
    for event in handle.events() {
        match event {
            ProgressEvent::Log(line) => {
                if !cli.quiet {
                    bar.println(line);
                }
            }
            ProgressEvent::JobFinished { outcome, .. } => {
                if matches!(outcome, JobOutcome::Failed { .. }) {
                    failed += 1;
                }
                bar.inc(1);
            }
            ProgressEvent::BatchFinished => bar.finish(),
            _ => {}
        }
    }
    Ok(failed)
}
