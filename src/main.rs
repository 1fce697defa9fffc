mod app;
mod config;
mod db;
mod error;
mod models;
mod reports;
mod ui;
mod workflow;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::app::App;
use crate::config::Config;
use crate::db::Database;
use crate::models::{week_start, ApprovalStatus, Role};
use crate::reports::export::{export_to_file, write_csv, CsvRecord};
use crate::reports::stats::{billing_report, compliance_report, report_entries, weeks_between};

/// Timesheets, expenses and approvals for a small consultancy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sign in as this user instead of picking one (overrides DEFAULT_USER)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal interface (default)
    Tui,
    /// Write rows to CSV
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Only rows in this approval stage
        #[arg(long)]
        status: Option<ApprovalStatus>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Billing or compliance report as CSV
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Billing: only bill hours that reached client approval
        #[arg(long)]
        approved_only: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportKind {
    Timesheets,
    Expenses,
    Entries,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportKind {
    Billing,
    Compliance,
}

fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(config.log_level())
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;
    init_logging(&config)?;
    tracing::info!(command = ?cli.command, "starting workforce manager");

    // Initialize database connection
    let db = db::init(&config).await?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let user = cli.user.or(config.default_user);
            run_tui(db, user.as_deref()).await
        }
        Command::Export { kind, from, to, status, output } => {
            let written = export(&db, kind, from, to, status, output.as_ref()).await?;
            eprintln!("{} rows written", written);
            Ok(())
        }
        Command::Report { kind, from, to, approved_only, output } => {
            let written = report(&db, kind, from, to, approved_only, output.as_ref()).await?;
            eprintln!("{} rows written", written);
            Ok(())
        }
        Command::Migrate => {
            db.migrate().await?;
            eprintln!("Migrations applied");
            Ok(())
        }
    }
}

async fn run_tui(db: Database, user: Option<&str>) -> Result<()> {
    let mut app = App::new(db);
    app.start(user).await?;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal loop failed");
        println!("Error: {:#}", err);
    }

    tracing::info!("workforce manager stopped");
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key.code).await;
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn write_rows<T: CsvRecord>(rows: &[T], output: Option<&PathBuf>) -> Result<usize> {
    match output {
        Some(path) => export_to_file(path, rows),
        None => write_csv(io::stdout().lock(), rows),
    }
}

async fn export(
    db: &Database,
    kind: ExportKind,
    from: NaiveDate,
    to: NaiveDate,
    status: Option<ApprovalStatus>,
    output: Option<&PathBuf>,
) -> Result<usize> {
    let keep = |s: ApprovalStatus| status.map_or(true, |wanted| wanted == s);
    match kind {
        ExportKind::Timesheets => {
            let mut rows = db.load_timesheets(week_start(from), to).await?;
            rows.retain(|t| keep(t.status));
            write_rows(&rows, output)
        }
        ExportKind::Expenses => {
            let mut rows = db.load_expense_item_details(from, to).await?;
            rows.retain(|i| keep(i.status));
            write_rows(&rows, output)
        }
        ExportKind::Entries => {
            let mut rows = db.load_entry_details(from, to, None).await?;
            rows.retain(|e| keep(e.status));
            write_rows(&rows, output)
        }
    }
}

async fn report(
    db: &Database,
    kind: ReportKind,
    from: NaiveDate,
    to: NaiveDate,
    approved_only: bool,
    output: Option<&PathBuf>,
) -> Result<usize> {
    match kind {
        ReportKind::Billing => {
            let entries = report_entries(&db.load_entry_details(from, to, None).await?, approved_only);
            let assignments = db.load_assignments().await?;
            write_rows(&billing_report(&entries, &assignments), output)
        }
        ReportKind::Compliance => {
            let mut employees = db.load_users(false).await?;
            employees.retain(|u| u.role == Role::Employee);
            let timesheets = db.load_timesheets(week_start(from), to).await?;
            let report = compliance_report(&employees, &timesheets, &weeks_between(from, to));
            tracing::info!(expected = report.expected, missing = report.missing.len(), "compliance report built");
            write_rows(&report.missing, output)
        }
    }
}
