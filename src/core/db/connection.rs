//! Connection configuration and descriptors.
//!
//! A [`ConnectionConfig`] names one backend and the parameters that matter
//! for it. [`ConnectionConfig::descriptor`] turns it into the string or path
//! handed to the driver when the session is opened.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::{AccessError, Result};

/// The two supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// File-based SQLite database
    EmbeddedFile,
    /// PostgreSQL server
    ClientServer,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::EmbeddedFile => f.write_str("SQLite"),
            BackendKind::ClientServer => f.write_str("PostgreSQL"),
        }
    }
}

/// Parameters for the client/server backend.
///
/// `Default` is the zero value (empty strings, no port), which is what the
/// key=value loader starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerParams {
    pub host: String,
    pub port: Option<u16>,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub sslmode: String,
}

impl ServerParams {
    /// Built-in parameters matching a stock `postgis` docker container.
    pub fn builtin() -> Self {
        ServerParams {
            host: "localhost".to_string(),
            port: Some(5432),
            dbname: "postgres".to_string(),
            user: "docker".to_string(),
            password: "docker".to_string(),
            sslmode: "require".to_string(),
        }
    }

    /// Builds the space-separated `key=value` descriptor.
    ///
    /// Keys are emitted in the order `user password dbname host port
    /// sslmode`; empty fields are left out.
    pub fn connection_string(&self) -> String {
        let port = self.port.map(|p| p.to_string()).unwrap_or_default();
        let pairs = [
            ("user", self.user.as_str()),
            ("password", self.password.as_str()),
            ("dbname", self.dbname.as_str()),
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("sslmode", self.sslmode.as_str()),
        ];

        pairs
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{}={}", key, quote_value(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Backend selection plus the parameters relevant to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    EmbeddedFile { path: PathBuf },
    ClientServer(ServerParams),
}

impl ConnectionConfig {
    pub fn embedded(path: impl AsRef<Path>) -> Self {
        ConnectionConfig::EmbeddedFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            ConnectionConfig::EmbeddedFile { .. } => BackendKind::EmbeddedFile,
            ConnectionConfig::ClientServer(_) => BackendKind::ClientServer,
        }
    }

    pub fn descriptor(&self) -> Descriptor {
        match self {
            ConnectionConfig::EmbeddedFile { path } => Descriptor::EmbeddedFile(path.clone()),
            ConnectionConfig::ClientServer(params) => {
                Descriptor::ClientServer(params.connection_string())
            }
        }
    }
}

/// What a `Database` is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Path of the database file, or `:memory:`
    EmbeddedFile(PathBuf),
    /// libpq-style `key=value` connection string
    ClientServer(String),
}

impl Descriptor {
    pub fn backend(&self) -> BackendKind {
        match self {
            Descriptor::EmbeddedFile(_) => BackendKind::EmbeddedFile,
            Descriptor::ClientServer(_) => BackendKind::ClientServer,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::EmbeddedFile(path) => write!(f, "{}", path.display()),
            // The password must not end up in logs
            Descriptor::ClientServer(conn) => {
                let Ok(pairs) = tokenize(conn) else {
                    return f.write_str("<malformed descriptor>");
                };
                let redacted: Vec<String> = pairs
                    .into_iter()
                    .map(|(key, value)| {
                        if key == "password" {
                            format!("{}=***", key)
                        } else {
                            format!("{}={}", key, quote_value(&value))
                        }
                    })
                    .collect();
                f.write_str(&redacted.join(" "))
            }
        }
    }
}

/// Parses a client/server descriptor back into its parameters.
///
/// Unknown keys are ignored, like the key=value config loader does.
pub fn parse_server_descriptor(descriptor: &str) -> Result<ServerParams> {
    let mut params = ServerParams::default();
    for (key, value) in tokenize(descriptor)? {
        match key.as_str() {
            "user" => params.user = value,
            "password" => params.password = value,
            "dbname" => params.dbname = value,
            "host" => params.host = value,
            "port" => {
                let port = value.parse::<u16>().map_err(|e| {
                    AccessError::config_caused(format!("invalid port '{}' in descriptor", value), e)
                })?;
                params.port = Some(port);
            }
            "sslmode" => params.sslmode = value,
            _ => {}
        }
    }
    Ok(params)
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\')
}

fn quote_value(value: &str) -> String {
    if !needs_quoting(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Splits `key=value key='quoted value'` into pairs.
fn tokenize(descriptor: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = descriptor.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(AccessError::config(format!(
                "expected '=' after '{}' in connection descriptor",
                key
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    Some(c) => value.push(c),
                    None => {
                        return Err(AccessError::config(format!(
                            "unterminated quoted value for '{}' in connection descriptor",
                            key
                        )))
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        pairs.push((key, value));
    }

    Ok(pairs)
}
