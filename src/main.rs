use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;

use weekly_report_pdf::{MemoryTaskStore, ReportForm, generate_report_to_file, report_file_name};

#[derive(Parser)]
#[command(name = "weekly-report")]
#[command(version)]
#[command(about = "Render a weekly status report form as a PDF", long_about = None)]
struct Cli {
    /// Report form (JSON)
    #[arg(long, value_name = "FILE")]
    form: PathBuf,

    /// Task store (JSON array of task records)
    #[arg(long, value_name = "FILE")]
    tasks: Option<PathBuf>,

    /// Date tasks are classified against, YYYY-MM-DD (defaults to today)
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,

    /// Output PDF (defaults to Report_<area>_<week start>.pdf)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<PathBuf, weekly_report_pdf::Error> {
    let input = ReportForm::load(&cli.form)?;
    let store = match &cli.tasks {
        Some(path) => MemoryTaskStore::load(path)?,
        None => MemoryTaskStore::new(),
    };
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(report_file_name(&input)));
    generate_report_to_file(&input, &store, today, &output)?;
    Ok(output)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
