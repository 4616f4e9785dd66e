//! Error Module
//!
//! Every fallible operation in the crate returns an [`AccessError`]. Driver
//! errors are never discarded: each one is wrapped with a short message
//! describing the step that failed and kept as the `source()` of the wrapper.
//! Callers add further [`ResultExt::stage`] layers on top, which produces a
//! causal chain that can be walked from the outermost context down to the
//! driver error that started it.
use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::panic::Location;

use thiserror::Error;

use crate::core::db::SessionState;

/// Boxed driver error kept as the cause of an [`AccessError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of a failure, independent of the wrapping text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed configuration value or unreadable configuration file
    Config,
    /// Opening or dialing the backend failed
    Connection,
    /// DDL failure
    Schema,
    /// Begin, commit or rollback failure
    Transaction,
    /// Statement preparation or execution failure
    Query,
    /// A row did not have the expected shape
    Decode,
    /// A point lookup matched zero rows
    NotFound,
    /// Operation issued on an unopened or closed handle
    InvalidState,
}

impl ErrorKind {
    /// Process exit code used by the binary for this class of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Connection => 3,
            ErrorKind::Schema => 4,
            ErrorKind::Transaction => 5,
            ErrorKind::Query => 6,
            ErrorKind::Decode => 7,
            ErrorKind::NotFound => 8,
            ErrorKind::InvalidState => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Connection => "connection",
            ErrorKind::Schema => "schema",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Query => "query",
            ErrorKind::Decode => "decode",
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidState => "invalid state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type shared by the whole crate.
///
/// The classified variants carry the message of the step that failed and,
/// when a driver or I/O call was involved, that error as `source`.
/// [`AccessError::Context`] is the only unclassified variant: it adds a stage
/// label and the call site on top of another `AccessError`.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("schema error: {message}")]
    Schema {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("no row in `{table}` with id {key}")]
    NotFound { table: String, key: i64 },

    #[error("cannot {operation} while the database is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("{stage}")]
    Context {
        stage: String,
        location: &'static Location<'static>,
        #[source]
        source: Box<AccessError>,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AccessError>;

impl AccessError {
    pub fn config(message: impl Into<String>) -> Self {
        AccessError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_caused(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn schema(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Schema {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn transaction(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Transaction {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn query(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Query {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Query error raised before anything reached the backend.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        AccessError::Query {
            message: message.into(),
            source: None,
        }
    }

    pub fn decode(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::Decode {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps `self` with a stage label, recording the caller's location.
    #[track_caller]
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        AccessError::Context {
            stage: stage.into(),
            location: Location::caller(),
            source: Box::new(self),
        }
    }

    /// Kind of the innermost classified error, looking through stage labels.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Config { .. } => ErrorKind::Config,
            AccessError::Connection { .. } => ErrorKind::Connection,
            AccessError::Schema { .. } => ErrorKind::Schema,
            AccessError::Transaction { .. } => ErrorKind::Transaction,
            AccessError::Query { .. } => ErrorKind::Query,
            AccessError::Decode { .. } => ErrorKind::Decode,
            AccessError::NotFound { .. } => ErrorKind::NotFound,
            AccessError::InvalidState { .. } => ErrorKind::InvalidState,
            AccessError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Iterates the causal chain, outermost first.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self as &(dyn StdError + 'static)),
        }
    }

    /// First link of the chain that is not an [`AccessError`]: the driver or
    /// I/O error that started the failure. Falls back to the innermost
    /// `AccessError` when no foreign error was recorded.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut innermost: &(dyn StdError + 'static) = self;
        for link in self.chain() {
            if !link.is::<AccessError>() {
                return link;
            }
            innermost = link;
        }
        innermost
    }

    /// Last link of the chain, below any error the driver wraps itself.
    pub fn deepest_cause(&self) -> &(dyn StdError + 'static) {
        // chain() always yields at least `self`
        self.chain().last().unwrap_or(self)
    }

    /// Call site recorded by the outermost stage label, if any.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            AccessError::Context { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Iterator over an error and its successive `source()`s.
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Adds stage labels to results.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with `stage` and the caller's location.
    fn stage(self, stage: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[track_caller]
    fn stage(self, stage: impl Into<String>) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(err.in_stage(stage)),
        }
    }
}

/// Renders the full causal chain, one link per line.
///
/// Stage labels are followed by the call site that attached them. Links
/// below the first are prefixed with `caused by:`.
pub fn render_chain(err: &AccessError) -> String {
    let mut out = String::new();
    for (depth, link) in err.chain().enumerate() {
        if depth == 0 {
            let _ = write!(out, "{}", link);
        } else {
            let _ = write!(out, "\n  caused by: {}", link);
        }
        if let Some(AccessError::Context { location, .. }) = link.downcast_ref::<AccessError>() {
            let _ = write!(
                out,
                "\n      at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
    }
    out
}
