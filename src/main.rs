use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use dbaccess::config::{self, Overrides, SettingsFile};
use dbaccess::core::render_chain;
use dbaccess::runner::Runner;

/// Runs the same SQL pipeline against SQLite and PostgreSQL.
#[derive(Debug, Parser)]
#[command(name = "dbaccess", version, about)]
struct Args {
    /// PostgreSQL parameter file, one key=value pair per line
    params_file: Option<PathBuf>,

    /// TOML settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// SQLite database file (deleted and recreated)
    #[arg(long)]
    sqlite_path: Option<PathBuf>,

    /// Number of generated rows to insert
    #[arg(long)]
    rows: Option<usize>,

    /// Id used by the point lookup
    #[arg(long)]
    lookup_id: Option<i64>,

    /// Skip the SQLite backend
    #[arg(long)]
    no_sqlite: bool,

    /// Skip the PostgreSQL backend
    #[arg(long)]
    no_postgres: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            params_file: self.params_file.clone(),
            sqlite_path: self.sqlite_path.clone(),
            sample_rows: self.rows,
            lookup_id: self.lookup_id,
            no_sqlite: self.no_sqlite,
            no_postgres: self.no_postgres,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();
    info!("Starting dbaccess...");

    let file = match &args.settings {
        Some(path) => config::load_settings(path),
        None => Ok(SettingsFile::default()),
    };
    let settings = match file.and_then(|file| config::build_settings(&file, &args.overrides())) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load database properties to connect:\n{}", render_chain(&e));
            return ExitCode::from(e.kind().exit_code());
        }
    };

    let mut runner = Runner::new(settings, std::io::stdout().lock());
    match runner.run() {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            error!("Failed to write the report: {}", e);
            ExitCode::FAILURE
        }
    }
}
