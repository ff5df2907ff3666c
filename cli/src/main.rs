//! Submissions CLI
//!
//! Submit a record to the backend, reload a previous submission from its
//! query string, or list submission history.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use submissions_cli::pages::{self, HistoryPage, SubmitPage, SubmitStatus};
use submissions_cli::{UreqTransport, DEFAULT_BASE_URL};
use submissions_core::FormApi;
use tracing::Level;

#[derive(Parser)]
#[command(name = "submissions")]
#[command(about = "Submit records and browse submission history")]
#[command(version)]
struct Args {
    /// Backend origin
    #[arg(long, env = "SUBMISSIONS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Log level (logs go to stderr)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    page: Option<Page>,
}

#[derive(Subcommand)]
enum Page {
    /// Show the available pages
    Home,
    /// Submit a record and show the returned rows
    Submit(SubmitArgs),
    /// List previously submitted records
    History,
}

#[derive(ClapArgs)]
struct SubmitArgs {
    /// Date of the record (YYYY-MM-DD)
    #[arg(long, conflicts_with = "query")]
    date: Option<String>,

    #[arg(long, conflicts_with = "query")]
    first_name: Option<String>,

    #[arg(long, conflicts_with = "query")]
    last_name: Option<String>,

    /// Reload a previous submission, e.g. '?date=2024-01-01&first_name=Ann&last_name=Lee'
    #[arg(long)]
    query: Option<String>,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    tracing::debug!(base_url = %args.base_url, "using backend");
    let api = FormApi::new(&args.base_url, UreqTransport::new());
    let mut out = io::stdout().lock();

    let code = match args.page.unwrap_or(Page::Home) {
        Page::Home => {
            pages::render_home(&mut out)?;
            ExitCode::SUCCESS
        }
        Page::Submit(submit) => run_submit(&api, submit, &mut out)?,
        Page::History => {
            let mut page = HistoryPage::new();
            let loaded = page.load(&api);
            page.render(&mut out)?;
            if loaded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };
    out.flush()?;
    Ok(code)
}

fn run_submit(
    api: &FormApi<UreqTransport>,
    args: SubmitArgs,
    out: &mut impl Write,
) -> io::Result<ExitCode> {
    let mut page = match &args.query {
        Some(raw) => {
            let page = SubmitPage::from_query(raw);
            if !page.is_complete() {
                // A partial query only prefills the form.
                page.render(out)?;
                return Ok(ExitCode::from(2));
            }
            page
        }
        None => SubmitPage::new(
            args.date.unwrap_or_default(),
            args.first_name.unwrap_or_default(),
            args.last_name.unwrap_or_default(),
        ),
    };

    let status = page.submit(api);
    page.render(out)?;
    Ok(match status {
        SubmitStatus::Accepted => ExitCode::SUCCESS,
        SubmitStatus::Rejected => ExitCode::from(1),
        SubmitStatus::Failed => ExitCode::from(2),
    })
}
