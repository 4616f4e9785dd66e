//! Configuration loading.
//!
//! Two formats are read here:
//! - the legacy PostgreSQL parameter file, one `key=value` pair per line;
//! - an optional TOML settings file for the demonstration runner.

use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::db::ServerParams;
use crate::core::{AccessError, Result};
use crate::runner::RunnerSettings;

/// Loads PostgreSQL connection parameters from a `key=value` file.
///
/// Recognized keys are `user`, `password`, `dbname`, `host`, `port` and
/// `sslmode`; anything else is ignored. A missing file is an error: whether
/// to fall back to [`ServerParams::builtin`] is the caller's decision.
pub fn load_server_params<P: AsRef<Path>>(path: P) -> Result<ServerParams> {
    let path = path.as_ref();
    info!("Using file '{}' as parameters to connect to PostgreSQL.", path.display());
    let file = File::open(path).map_err(|e| {
        AccessError::config_caused(
            format!("cannot open configuration file '{}'", path.display()),
            e,
        )
    })?;
    read_server_params(BufReader::new(file))
}

/// Parses `key=value` parameters from in-memory text.
pub fn parse_server_params(text: &str) -> Result<ServerParams> {
    read_server_params(text.as_bytes())
}

/// Reads `key=value` lines into a [`ServerParams`], starting from its zero value.
///
/// The value is the text between the first and the second `=`, so a value
/// that itself contains `=` is cut short there. `port` is the only field
/// validated at load time.
pub fn read_server_params<R: BufRead>(reader: R) -> Result<ServerParams> {
    let mut params = ServerParams::default();

    for line in reader.lines() {
        let line = line.map_err(|e| AccessError::config_caused("failed to read configuration", e))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split('=');
        let key = parts.next().unwrap_or_default();
        let Some(value) = parts.next() else {
            warn!("Ignoring configuration line without '=' (key '{}')", key);
            continue;
        };

        match key {
            "user" => params.user = value.to_string(),
            "password" => params.password = value.to_string(),
            "dbname" => params.dbname = value.to_string(),
            "host" => params.host = value.to_string(),
            "port" => params.port = Some(parse_port(value)?),
            "sslmode" => params.sslmode = value.to_string(),
            other => debug!("Ignoring unknown configuration key '{}'", other),
        }
    }

    Ok(params)
}

fn parse_port(value: &str) -> Result<u16> {
    let invalid = || {
        format!(
            "the port '{}' set for the database is not a valid port number (1-65535)",
            value
        )
    };
    match value.parse::<u16>() {
        Ok(0) => Err(AccessError::config(invalid())),
        Ok(port) => Ok(port),
        Err(e) => Err(AccessError::config_caused(invalid(), e)),
    }
}

/// Runner settings file structure parsed from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    pub embedded: Option<EmbeddedSection>,
    pub client_server: Option<ClientServerSection>,
    pub pipeline: Option<PipelineSection>,
}

/// SQLite-related settings.
#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedSection {
    pub enabled: Option<bool>,
    pub path: Option<PathBuf>,
}

/// PostgreSQL-related settings.
#[derive(Debug, Default, Deserialize)]
pub struct ClientServerSection {
    pub enabled: Option<bool>,
    pub params_file: Option<PathBuf>,
}

/// Pipeline tuning.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineSection {
    pub sample_rows: Option<usize>,
    pub lookup_id: Option<i64>,
    /// Zero disables the timeout
    pub timeout_secs: Option<u64>,
    /// Zero disables the PostgreSQL statement timeout
    pub statement_timeout_secs: Option<u64>,
}

/// Loads the runner settings from a TOML file at the given path.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<SettingsFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        AccessError::config_caused(format!("cannot read settings file '{}'", path.display()), e)
    })?;
    toml::from_str(&content).map_err(|e| {
        AccessError::config_caused(format!("invalid settings file '{}'", path.display()), e)
    })
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub params_file: Option<PathBuf>,
    pub sqlite_path: Option<PathBuf>,
    pub sample_rows: Option<usize>,
    pub lookup_id: Option<i64>,
    pub no_sqlite: bool,
    pub no_postgres: bool,
}

/// Merges defaults, the settings file and command-line overrides.
///
/// A parameter file named on the command line or in the settings file must
/// load; only when none is named are the built-in parameters used.
pub fn build_settings(file: &SettingsFile, overrides: &Overrides) -> Result<RunnerSettings> {
    let defaults = RunnerSettings::default();
    let embedded = file.embedded.as_ref();
    let client_server = file.client_server.as_ref();
    let pipeline = file.pipeline.as_ref();

    let embedded_enabled = !overrides.no_sqlite
        && embedded.and_then(|e| e.enabled).unwrap_or(true);
    let embedded_path = overrides
        .sqlite_path
        .clone()
        .or_else(|| embedded.and_then(|e| e.path.clone()))
        .or(defaults.embedded);

    let client_server_enabled = !overrides.no_postgres
        && client_server.and_then(|c| c.enabled).unwrap_or(true);
    let params_file = overrides
        .params_file
        .clone()
        .or_else(|| client_server.and_then(|c| c.params_file.clone()));
    let server_params = if !client_server_enabled {
        None
    } else if let Some(path) = params_file {
        Some(load_server_params(path)?)
    } else {
        defaults.client_server
    };

    let timeout = seconds_or(pipeline.and_then(|p| p.timeout_secs), defaults.timeout);
    let statement_timeout = seconds_or(
        pipeline.and_then(|p| p.statement_timeout_secs),
        defaults.statement_timeout,
    );

    Ok(RunnerSettings {
        embedded: if embedded_enabled { embedded_path } else { None },
        client_server: server_params,
        sample_rows: overrides
            .sample_rows
            .or_else(|| pipeline.and_then(|p| p.sample_rows))
            .unwrap_or(defaults.sample_rows),
        lookup_id: overrides
            .lookup_id
            .or_else(|| pipeline.and_then(|p| p.lookup_id))
            .unwrap_or(defaults.lookup_id),
        timeout,
        statement_timeout,
    })
}

/// Zero means no limit; unset keeps the default.
fn seconds_or(secs: Option<u64>, default: Option<Duration>) -> Option<Duration> {
    match secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}
