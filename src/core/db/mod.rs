//! Database Module
//!
//! One access layer over two engines: SQLite opened from a file path, and
//! PostgreSQL reached through a `key=value` connection string.
//!
//! ## Architecture
//!
//! - **Connection configuration** (`connection.rs`): backend selection and descriptors
//! - **Dialect** (`dialect.rs`): placeholder syntax and DDL per backend
//! - **Session** (`database.rs`): the `Database` handle and its operations
//! - **Rows** (`rows.rs`): decoded rows and the lazy cursor over them
//!
//! ## Error Handling
//!
//! Every operation returns the crate's `AccessError`, with the driver error
//! kept as its cause.
pub mod connection;
pub mod database;
pub mod dialect;
pub mod rows;

pub use connection::{parse_server_descriptor, BackendKind, ConnectionConfig, Descriptor, ServerParams};
pub use database::{Database, OpenOptions, SessionState};
pub use dialect::{Dialect, SAMPLE_TABLE};
pub use rows::{sample_rows, Row, RowCursor, Rows};
