//! Demonstration pipeline.
//!
//! The [`Runner`] drives every `Database` operation in a fixed order against
//! each configured backend and prints what it reads. A failing stage halts
//! the pipeline for that backend only; the next backend still runs.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::core::db::{
    sample_rows, BackendKind, ConnectionConfig, Database, OpenOptions, ServerParams, SAMPLE_TABLE,
};
use crate::core::{render_chain, AccessError, Result, ResultExt};

/// Multi-row insert issued as literal SQL after the table is cleared.
const LITERAL_INSERT: &str =
    "INSERT INTO foo (id, name) VALUES (1, 'foo'), (2, 'bar'), (3, 'baz')";

/// Everything a run needs. Backends left as `None` are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// SQLite file, deleted and recreated by the run
    pub embedded: Option<PathBuf>,
    pub client_server: Option<ServerParams>,
    /// Number of generated rows for the transactional insert
    pub sample_rows: usize,
    /// Id used by the point-lookup stage
    pub lookup_id: i64,
    pub timeout: Option<Duration>,
    /// Server-side limit on each PostgreSQL statement
    pub statement_timeout: Option<Duration>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        RunnerSettings {
            embedded: Some(PathBuf::from("./foo.db")),
            client_server: Some(ServerParams::builtin()),
            sample_rows: 10,
            lookup_id: 5,
            timeout: Some(Duration::from_secs(5)),
            statement_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// One named step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    DropSchema,
    CreateSchema,
    InsertBatch,
    SelectAll,
    Lookup,
    DeleteAll,
    InsertLiteral,
    SelectAfterLiteral,
    Close,
}

impl Stage {
    pub const PIPELINE: [Stage; 10] = [
        Stage::Open,
        Stage::DropSchema,
        Stage::CreateSchema,
        Stage::InsertBatch,
        Stage::SelectAll,
        Stage::Lookup,
        Stage::DeleteAll,
        Stage::InsertLiteral,
        Stage::SelectAfterLiteral,
        Stage::Close,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Open => "open the database",
            Stage::DropSchema => "drop the sample table",
            Stage::CreateSchema => "create the sample table",
            Stage::InsertBatch => "insert the sample rows",
            Stage::SelectAll => "select the sample rows",
            Stage::Lookup => "look up one row",
            Stage::DeleteAll => "delete every row",
            Stage::InsertLiteral => "insert literal rows",
            Stage::SelectAfterLiteral => "select the literal rows",
            Stage::Close => "close the database",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The stage that halted a backend and the error it raised.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: AccessError,
}

/// Outcome of the pipeline for one backend.
#[derive(Debug)]
pub struct BackendReport {
    pub backend: BackendKind,
    pub completed: Vec<Stage>,
    pub failure: Option<StageFailure>,
}

impl BackendReport {
    fn new(backend: BackendKind) -> Self {
        BackendReport {
            backend,
            completed: Vec::new(),
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub backends: Vec<BackendReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.backends.iter().all(BackendReport::succeeded)
    }

    /// 0 when every backend succeeded, else the code of the first failure's kind.
    pub fn exit_code(&self) -> u8 {
        self.backends
            .iter()
            .find_map(|b| b.failure.as_ref())
            .map(|f| f.error.kind().exit_code())
            .unwrap_or(0)
    }
}

/// Why a pipeline stopped early.
enum Halt {
    Stage(StageFailure),
    Io(io::Error),
}

impl From<io::Error> for Halt {
    fn from(e: io::Error) -> Self {
        Halt::Io(e)
    }
}

/// Runs the demonstration pipeline, writing its report to `out`.
pub struct Runner<W: Write> {
    settings: RunnerSettings,
    out: W,
}

impl<W: Write> Runner<W> {
    pub fn new(settings: RunnerSettings, out: W) -> Self {
        Runner { settings, out }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Runs the embedded backend, then the client/server one.
    ///
    /// Only failures writing to `out` are returned as errors; database
    /// failures are recorded in the report.
    pub fn run(&mut self) -> io::Result<RunReport> {
        let mut report = RunReport::default();
        if let Some(path) = self.settings.embedded.clone() {
            report
                .backends
                .push(self.run_backend(ConnectionConfig::embedded(path))?);
        }
        if let Some(params) = self.settings.client_server.clone() {
            report
                .backends
                .push(self.run_backend(ConnectionConfig::ClientServer(params))?);
        }
        Ok(report)
    }

    fn run_backend(&mut self, config: ConnectionConfig) -> io::Result<BackendReport> {
        let backend = config.backend();
        let banner = format!("Showing output from statements ran against {}.", backend);
        writeln!(self.out, "{}", banner)?;
        writeln!(self.out, "{}", "=".repeat(banner.len()))?;

        let mut report = BackendReport::new(backend);
        let options = OpenOptions {
            timeout: self.settings.timeout,
            statement_timeout: self.settings.statement_timeout,
        };
        let mut db = Database::with_options(config.descriptor(), options);
        info!("Running pipeline against {}", db.descriptor());

        let outcome = self.pipeline(&mut db, &mut report);
        db.close();

        match outcome {
            Ok(()) => report.completed.push(Stage::Close),
            Err(Halt::Io(e)) => return Err(e),
            Err(Halt::Stage(failure)) => {
                error!(
                    "{} pipeline halted at stage '{}': {}",
                    backend, failure.stage, failure.error.root_cause()
                );
                writeln!(self.out, "{}", render_chain(&failure.error))?;
                report.failure = Some(failure);
            }
        }
        writeln!(self.out)?;
        Ok(report)
    }

    fn pipeline(&mut self, db: &mut Database, report: &mut BackendReport) -> std::result::Result<(), Halt> {
        step(report, Stage::Open, db.open())?;
        writeln!(self.out, "Connected to the {} database. Proceeding", db.backend())?;

        writeln!(self.out, "Dropping table {} if it exists...", SAMPLE_TABLE)?;
        step(report, Stage::DropSchema, db.drop_schema_if_exists())?;
        step(report, Stage::CreateSchema, db.create_schema())?;

        let rows = sample_rows(self.settings.sample_rows);
        writeln!(self.out, "Inserting sample data ({} rows)", rows.len())?;
        step(report, Stage::InsertBatch, db.insert_batch(SAMPLE_TABLE, &rows))?;
        self.print_rows(db, report, Stage::SelectAll)?;

        let key = self.settings.lookup_id;
        let found = match db.select_one(SAMPLE_TABLE, key) {
            Err(e) if e.is_not_found() => Ok(None),
            other => other.map(Some),
        };
        match step(report, Stage::Lookup, found)? {
            Some(row) => writeln!(self.out, "Lookup of id {}: {}", key, row)?,
            None => writeln!(self.out, "Lookup of id {}: no such row", key)?,
        }

        let deleted = step(report, Stage::DeleteAll, db.delete_all(SAMPLE_TABLE))?;
        writeln!(self.out, "Deleted {} rows from {}", deleted, SAMPLE_TABLE)?;

        step(report, Stage::InsertLiteral, db.execute(LITERAL_INSERT))?;
        self.print_rows(db, report, Stage::SelectAfterLiteral)?;
        Ok(())
    }

    /// Streams every row of the sample table to `out`.
    fn print_rows(
        &mut self,
        db: &mut Database,
        report: &mut BackendReport,
        stage: Stage,
    ) -> std::result::Result<(), Halt> {
        let mut cursor = db.select_all(SAMPLE_TABLE).map_err(|e| fail(stage, e))?;
        let rows = cursor.rows().map_err(|e| fail(stage, e))?;
        for row in rows {
            let row = row.map_err(|e| fail(stage, e))?;
            writeln!(self.out, "{}", row)?;
        }
        report.completed.push(stage);
        Ok(())
    }
}

/// Records `stage` as completed, or turns its error into a halt.
#[track_caller]
fn step<T>(report: &mut BackendReport, stage: Stage, result: Result<T>) -> std::result::Result<T, Halt> {
    match result.stage(stage.label()) {
        Ok(value) => {
            report.completed.push(stage);
            Ok(value)
        }
        Err(error) => Err(Halt::Stage(StageFailure { stage, error })),
    }
}

#[track_caller]
fn fail(stage: Stage, error: AccessError) -> Halt {
    Halt::Stage(StageFailure {
        stage,
        error: error.in_stage(stage.label()),
    })
}
