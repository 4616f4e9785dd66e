//! Database Session Module
//!
//! [`Database`] wraps one live session to either backend and exposes the same
//! operations for both. The session moves through `Unopened → Open → Closed`;
//! data operations are only valid while open and return
//! [`AccessError::InvalidState`] otherwise.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{debug, info, warn};

use crate::core::db::connection::{BackendKind, Descriptor};
use crate::core::db::dialect::Dialect;
use crate::core::db::rows::{CursorSource, Row, RowCursor};
use crate::core::{AccessError, Result};

/// Public view of the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unopened => f.write_str("unopened"),
            SessionState::Open => f.write_str("open"),
            SessionState::Closed => f.write_str("closed"),
        }
    }
}

/// Options applied when the session is opened.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// SQLite busy timeout, or PostgreSQL connect timeout
    pub timeout: Option<Duration>,
    /// PostgreSQL `statement_timeout` for every statement of the session.
    /// SQLite has no equivalent and ignores it.
    pub statement_timeout: Option<Duration>,
}

enum Session {
    Unopened,
    Embedded(rusqlite::Connection),
    ClientServer(postgres::Client),
    Closed,
}

/// Borrowed view of an open session.
enum Live<'a> {
    Embedded(&'a mut rusqlite::Connection),
    ClientServer(&'a mut postgres::Client),
}

/// Open path that skips the destructive file removal.
const IN_MEMORY: &str = ":memory:";

/// One session to one backend.
///
/// Not shareable between threads of control: every operation takes
/// `&mut self`. Dropping the value closes the session.
pub struct Database {
    descriptor: Descriptor,
    options: OpenOptions,
    session: Session,
}

impl Database {
    /// Creates an unopened handle.
    pub fn new(descriptor: Descriptor) -> Self {
        Self::with_options(descriptor, OpenOptions::default())
    }

    pub fn with_options(descriptor: Descriptor, options: OpenOptions) -> Self {
        Database {
            descriptor,
            options,
            session: Session::Unopened,
        }
    }

    /// Creates a handle and opens it.
    pub fn connect(descriptor: Descriptor) -> Result<Self> {
        let mut db = Self::new(descriptor);
        db.open()?;
        Ok(db)
    }

    pub fn state(&self) -> SessionState {
        match self.session {
            Session::Unopened => SessionState::Unopened,
            Session::Embedded(_) | Session::ClientServer(_) => SessionState::Open,
            Session::Closed => SessionState::Closed,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.descriptor.backend()
    }

    pub fn dialect(&self) -> Dialect {
        match self.backend() {
            BackendKind::EmbeddedFile => Dialect::Sqlite,
            BackendKind::ClientServer => Dialect::Postgres,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Establishes the session.
    ///
    /// For the embedded backend any existing file at the path is deleted
    /// first, so the session always starts from an empty store.
    pub fn open(&mut self) -> Result<()> {
        if !matches!(self.session, Session::Unopened) {
            return Err(self.invalid_state("open"));
        }

        self.session = match &self.descriptor {
            Descriptor::EmbeddedFile(path) => {
                Session::Embedded(open_embedded(path, self.options.timeout)?)
            }
            Descriptor::ClientServer(conn) => {
                Session::ClientServer(open_client_server(conn, &self.options)?)
            }
        };
        info!("Opened {} database {}", self.backend(), self.descriptor);
        Ok(())
    }

    /// Creates the sample table. Fails if it already exists.
    pub fn create_schema(&mut self) -> Result<()> {
        let sql = self.dialect().create_table_sql();
        let message = "failed to create the sample table";
        match self.live("create schema")? {
            Live::Embedded(conn) => conn
                .execute_batch(&sql)
                .map_err(|e| AccessError::schema(message, e))?,
            Live::ClientServer(client) => client
                .batch_execute(&sql)
                .map_err(|e| AccessError::schema(message, e))?,
        }
        debug!("Created sample table");
        Ok(())
    }

    /// Drops the sample table if present. Idempotent.
    pub fn drop_schema_if_exists(&mut self) -> Result<()> {
        let sql = self.dialect().drop_table_sql();
        let message = "failed to drop the sample table";
        match self.live("drop schema")? {
            Live::Embedded(conn) => conn
                .execute_batch(&sql)
                .map_err(|e| AccessError::schema(message, e))?,
            Live::ClientServer(client) => client
                .batch_execute(&sql)
                .map_err(|e| AccessError::schema(message, e))?,
        }
        debug!("Dropped sample table if it existed");
        Ok(())
    }

    /// Inserts `rows` in one transaction.
    ///
    /// Either every row is committed or none is: on the first failure the
    /// transaction is rolled back and that failure is returned.
    pub fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let sql = self.dialect().insert_sql(table)?;
        match self.live("insert rows")? {
            Live::Embedded(conn) => {
                let tx = conn
                    .transaction()
                    .map_err(|e| AccessError::transaction("failed to begin the transaction", e))?;
                match insert_embedded(&tx, &sql, rows) {
                    Ok(()) => tx
                        .commit()
                        .map_err(|e| AccessError::transaction("failed to commit the transaction", e))?,
                    Err(err) => {
                        if let Err(rollback) = tx.rollback() {
                            warn!("Rollback after failed insert also failed: {}", rollback);
                        }
                        return Err(err);
                    }
                }
            }
            Live::ClientServer(client) => {
                let mut tx = client
                    .transaction()
                    .map_err(|e| AccessError::transaction("failed to begin the transaction", e))?;
                match insert_client_server(&mut tx, &sql, rows) {
                    Ok(()) => tx
                        .commit()
                        .map_err(|e| AccessError::transaction("failed to commit the transaction", e))?,
                    Err(err) => {
                        if let Err(rollback) = tx.rollback() {
                            warn!("Rollback after failed insert also failed: {}", rollback);
                        }
                        return Err(err);
                    }
                }
            }
        }
        debug!("Inserted {} rows into {}", rows.len(), table);
        Ok(())
    }

    /// Starts a read of every row in `table`.
    pub fn select_all(&mut self, table: &str) -> Result<RowCursor<'_>> {
        let sql = self.dialect().select_all_sql(table)?;
        let source = match self.live("select rows")? {
            Live::Embedded(conn) => CursorSource::Embedded(
                conn.prepare(&sql)
                    .map_err(|e| AccessError::query("failed to prepare the select query", e))?,
            ),
            Live::ClientServer(client) => CursorSource::ClientServer(
                client
                    .query_raw(sql.as_str(), std::iter::empty::<i64>())
                    .map_err(|e| AccessError::query("failed to run the select query", e))?,
            ),
        };
        Ok(RowCursor::new(source))
    }

    /// Reads every row of `table` into memory.
    pub fn fetch_all(&mut self, table: &str) -> Result<Vec<Row>> {
        self.select_all(table)?.collect_rows()
    }

    /// Looks up the row whose id is `key`.
    ///
    /// Zero matching rows is [`AccessError::NotFound`].
    pub fn select_one(&mut self, table: &str, key: i64) -> Result<Row> {
        let sql = self.dialect().select_one_sql(table)?;
        let message = "failed to look up the row";
        let found = match self.live("look up a row")? {
            Live::Embedded(conn) => {
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| AccessError::query(message, e))?;
                let mut rows = stmt
                    .query(rusqlite::params![key])
                    .map_err(|e| AccessError::query(message, e))?;
                let first = rows.next().map_err(|e| AccessError::query(message, e))?;
                first.map(Row::from_sqlite).transpose()?
            }
            Live::ClientServer(client) => client
                .query_opt(sql.as_str(), &[&key])
                .map_err(|e| AccessError::query(message, e))?
                .map(|row| Row::from_postgres(&row))
                .transpose()?,
        };

        found.ok_or_else(|| AccessError::NotFound {
            table: table.to_string(),
            key,
        })
    }

    /// Deletes every row of `table`, returning how many were removed.
    pub fn delete_all(&mut self, table: &str) -> Result<u64> {
        let sql = self.dialect().delete_all_sql(table)?;
        let message = format!("failed to delete rows from the table {}", table);
        let deleted = match self.live("delete rows")? {
            Live::Embedded(conn) => conn
                .execute(&sql, [])
                .map(|n| n as u64)
                .map_err(|e| AccessError::query(message, e))?,
            Live::ClientServer(client) => client
                .execute(sql.as_str(), &[])
                .map_err(|e| AccessError::query(message, e))?,
        };
        debug!("Deleted {} rows from {}", deleted, table);
        Ok(deleted)
    }

    /// Runs literal SQL without parameters, returning the affected row count.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        let message = "failed to execute the statement";
        match self.live("execute a statement")? {
            Live::Embedded(conn) => conn
                .execute(sql, [])
                .map(|n| n as u64)
                .map_err(|e| AccessError::query(message, e)),
            Live::ClientServer(client) => client
                .execute(sql, &[])
                .map_err(|e| AccessError::query(message, e)),
        }
    }

    /// Releases the session. Safe to call any number of times.
    ///
    /// Driver errors while closing are logged, not returned: the handle is
    /// closed either way.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.session, Session::Closed) {
            Session::Embedded(conn) => {
                if let Err((_, e)) = conn.close() {
                    warn!("Error while closing {}: {}", self.descriptor, e);
                }
                info!("Closed {} database", BackendKind::EmbeddedFile);
            }
            Session::ClientServer(client) => {
                if let Err(e) = client.close() {
                    warn!("Error while closing {}: {}", self.descriptor, e);
                }
                info!("Closed {} database", BackendKind::ClientServer);
            }
            Session::Unopened | Session::Closed => {}
        }
    }

    fn live(&mut self, operation: &'static str) -> Result<Live<'_>> {
        let state = self.state();
        match &mut self.session {
            Session::Embedded(conn) => Ok(Live::Embedded(conn)),
            Session::ClientServer(client) => Ok(Live::ClientServer(client)),
            Session::Unopened | Session::Closed => Err(AccessError::InvalidState { operation, state }),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> AccessError {
        AccessError::InvalidState {
            operation,
            state: self.state(),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("descriptor", &self.descriptor.to_string())
            .field("state", &self.state())
            .finish()
    }
}

fn open_embedded(path: &Path, timeout: Option<Duration>) -> Result<rusqlite::Connection> {
    if path != Path::new(IN_MEMORY) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed existing database file {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("There is no existing database '{}'. Nothing to delete.", path.display())
            }
            Err(e) => {
                return Err(AccessError::connection(
                    format!("failed to remove the existing database '{}'", path.display()),
                    e,
                ))
            }
        }
    }

    let open_failed = |e: rusqlite::Error| {
        AccessError::connection(format!("failed to open the database '{}'", path.display()), e)
    };
    let conn = rusqlite::Connection::open(path).map_err(open_failed)?;
    if let Some(timeout) = timeout {
        conn.busy_timeout(timeout).map_err(open_failed)?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(open_failed)?;
    Ok(conn)
}

fn open_client_server(conn: &str, options: &OpenOptions) -> Result<postgres::Client> {
    let config = server_config(conn, options)?;
    config
        .connect(tls_connector()?)
        .map_err(|e| AccessError::connection("failed to connect to the database", e))
}

/// Parses the descriptor and applies the open options to it.
fn server_config(conn: &str, options: &OpenOptions) -> Result<postgres::Config> {
    let mut config: postgres::Config = conn.parse().map_err(|e| {
        AccessError::connection("failed to parse the connection parameters", e)
    })?;
    if let Some(timeout) = options.timeout {
        config.connect_timeout(timeout);
    }
    if let Some(limit) = options.statement_timeout {
        let setting = format!("-c statement_timeout={}", limit.as_millis());
        let merged = match config.get_options() {
            Some(existing) => format!("{} {}", existing, setting),
            None => setting,
        };
        config.options(&merged);
    }
    Ok(config)
}

/// Connector used for `sslmode=prefer` and `require`.
///
/// Neither mode verifies the server certificate, the same as libpq.
fn tls_connector() -> Result<MakeTlsConnector> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| AccessError::connection("failed to set up TLS", e))?;
    Ok(MakeTlsConnector::new(connector))
}

fn insert_embedded(tx: &rusqlite::Transaction<'_>, sql: &str, rows: &[Row]) -> Result<()> {
    let mut stmt = tx
        .prepare(sql)
        .map_err(|e| AccessError::query("failed to create the prepared statement", e))?;
    for row in rows {
        stmt.execute(rusqlite::params![row.id, row.name]).map_err(|e| {
            AccessError::query(format!("failed to insert row with id {}", row.id), e)
        })?;
    }
    Ok(())
}

fn insert_client_server(tx: &mut postgres::Transaction<'_>, sql: &str, rows: &[Row]) -> Result<()> {
    let stmt = tx
        .prepare(sql)
        .map_err(|e| AccessError::query("failed to create the prepared statement", e))?;
    for row in rows {
        tx.execute(&stmt, &[&row.id, &row.name]).map_err(|e| {
            AccessError::query(format!("failed to insert row with id {}", row.id), e)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::dialect::SAMPLE_TABLE;
    use crate::core::ErrorKind;
    use crate::test_utils::EmbeddedFixture;

    #[test]
    fn test_open_close_lifecycle() {
        let mut db = Database::new(Descriptor::EmbeddedFile(IN_MEMORY.into()));
        assert_eq!(db.state(), SessionState::Unopened);

        db.open().unwrap();
        assert_eq!(db.state(), SessionState::Open);

        db.close();
        assert_eq!(db.state(), SessionState::Closed);
        db.close();
        assert_eq!(db.state(), SessionState::Closed);
    }

    #[test]
    fn test_operations_on_unopened_handle() {
        let mut db = Database::new(Descriptor::EmbeddedFile(IN_MEMORY.into()));
        let err = db.create_schema().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("unopened"));
    }

    #[test]
    fn test_operations_on_closed_handle() {
        let mut fixture = EmbeddedFixture::with_schema();
        fixture.db.close();

        assert_eq!(fixture.db.fetch_all(SAMPLE_TABLE).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(fixture.db.delete_all(SAMPLE_TABLE).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(
            fixture.db.insert_batch(SAMPLE_TABLE, &[Row::sample(1)]).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        // Closed is terminal
        assert_eq!(fixture.db.open().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_open_twice_is_invalid() {
        let mut db = Database::connect(Descriptor::EmbeddedFile(IN_MEMORY.into())).unwrap();
        assert_eq!(db.open().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(db.state(), SessionState::Open);
    }

    #[test]
    fn test_open_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foo.db");
        std::fs::write(&path, b"not a database").unwrap();

        let mut db = Database::connect(Descriptor::EmbeddedFile(path.clone())).unwrap();
        db.create_schema().unwrap();
        assert!(db.fetch_all(SAMPLE_TABLE).unwrap().is_empty());
    }

    #[test]
    fn test_open_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("foo.db");
        let err = Database::connect(Descriptor::EmbeddedFile(path)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.root_cause().downcast_ref::<rusqlite::Error>().is_some());
    }

    #[test]
    fn test_create_schema_twice_fails() {
        let mut fixture = EmbeddedFixture::with_schema();
        let err = fixture.db.create_schema().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("failed to create the sample table"));
        assert!(matches!(
            err.root_cause().downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(..))
        ));
    }

    #[test]
    fn test_drop_schema_is_idempotent() {
        let mut fixture = EmbeddedFixture::new();
        fixture.db.drop_schema_if_exists().unwrap();
        fixture.db.drop_schema_if_exists().unwrap();
        fixture.db.create_schema().unwrap();
        fixture.db.drop_schema_if_exists().unwrap();
        fixture.db.drop_schema_if_exists().unwrap();
    }

    #[test]
    fn test_insert_and_select() {
        let mut fixture = EmbeddedFixture::with_schema();
        let rows = vec![Row::new(0, "a"), Row::new(1, "b")];
        fixture.db.insert_batch(SAMPLE_TABLE, &rows).unwrap();

        let mut read = fixture.db.fetch_all(SAMPLE_TABLE).unwrap();
        read.sort();
        assert_eq!(read, rows);
    }

    #[test]
    fn test_duplicate_key_rolls_back_batch() {
        let mut fixture = EmbeddedFixture::with_schema();
        fixture.db.insert_batch(SAMPLE_TABLE, &[Row::new(10, "keep")]).unwrap();

        let batch = vec![Row::new(1, "x"), Row::new(2, "y"), Row::new(1, "dup")];
        let err = fixture.db.insert_batch(SAMPLE_TABLE, &batch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("id 1"));

        assert_eq!(fixture.db.fetch_all(SAMPLE_TABLE).unwrap(), vec![Row::new(10, "keep")]);
    }

    #[test]
    fn test_insert_into_missing_table() {
        let mut fixture = EmbeddedFixture::new();
        let err = fixture.db.insert_batch(SAMPLE_TABLE, &[Row::sample(0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("prepared statement"));
    }

    #[test]
    fn test_select_one() {
        let mut fixture = EmbeddedFixture::with_rows(5);
        assert_eq!(fixture.db.select_one(SAMPLE_TABLE, 3).unwrap(), Row::sample(3));

        let err = fixture.db.select_one(SAMPLE_TABLE, 99).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no row in `foo` with id 99");
    }

    #[test]
    fn test_select_one_missing_table_is_query_error() {
        let mut fixture = EmbeddedFixture::new();
        let err = fixture.db.select_one(SAMPLE_TABLE, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
    }

    #[test]
    fn test_cursor_is_lazy_and_single_use() {
        let mut fixture = EmbeddedFixture::with_rows(3);
        let mut cursor = fixture.db.select_all(SAMPLE_TABLE).unwrap();

        let mut rows = cursor.rows().unwrap();
        let first = rows.next().unwrap().unwrap();
        assert!(first.id < 3);
        assert_eq!(rows.count(), 2);

        let err = cursor.rows().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_decode_error_ends_sequence() {
        let mut fixture = EmbeddedFixture::with_schema();
        fixture
            .db
            .execute("INSERT INTO foo (id, name) VALUES (1, 'ok'), (2, NULL)")
            .unwrap();

        let mut cursor = fixture.db.select_all(SAMPLE_TABLE).unwrap();
        let results: Vec<_> = cursor.rows().unwrap().collect();
        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Decode);
        assert!(results.last().unwrap().is_err());
    }

    #[test]
    fn test_delete_all_and_execute() {
        let mut fixture = EmbeddedFixture::with_rows(4);
        assert_eq!(fixture.db.delete_all(SAMPLE_TABLE).unwrap(), 4);
        assert!(fixture.db.fetch_all(SAMPLE_TABLE).unwrap().is_empty());

        let inserted = fixture
            .db
            .execute("insert into foo(id, name) values(1, 'foo'), (2, 'bar'), (3, 'baz');")
            .unwrap();
        assert_eq!(inserted, 3);
    }

    #[test]
    fn test_invalid_table_name_is_rejected_before_sql() {
        let mut fixture = EmbeddedFixture::with_rows(1);
        let err = fixture.db.delete_all("foo; DROP TABLE foo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(fixture.db.fetch_all(SAMPLE_TABLE).unwrap().len(), 1);
    }

    #[test]
    fn test_server_config_applies_timeouts() {
        let options = OpenOptions {
            timeout: Some(Duration::from_secs(3)),
            statement_timeout: Some(Duration::from_millis(1500)),
        };
        let config = server_config("user=docker host=localhost", &options).unwrap();
        assert_eq!(config.get_connect_timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(config.get_options(), Some("-c statement_timeout=1500"));

        let config = server_config("host=localhost options='-c search_path=app'", &options).unwrap();
        assert_eq!(
            config.get_options(),
            Some("-c search_path=app -c statement_timeout=1500")
        );

        let config = server_config("host=localhost", &OpenOptions::default()).unwrap();
        assert_eq!(config.get_connect_timeout(), None);
        assert_eq!(config.get_options(), None);
    }

    #[test]
    fn test_require_starts_tls_handshake() {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::sync::mpsc;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 8];
            stream.read_exact(&mut request).unwrap();
            // Accept encryption, then look at the first record the client sends
            stream.write_all(b"S").unwrap();
            let mut record = [0u8; 1];
            let first = stream.read_exact(&mut record).ok().map(|_| record[0]);
            tx.send((request, first)).unwrap();
        });

        let conn = format!(
            "user=docker dbname=postgres host=127.0.0.1 port={} sslmode=require",
            port
        );
        let options = OpenOptions {
            timeout: Some(Duration::from_secs(5)),
            statement_timeout: None,
        };
        let mut db = Database::with_options(Descriptor::ClientServer(conn), options);
        let err = db.open().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!crate::core::render_chain(&err).contains("no TLS implementation"));

        let (request, first) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // SSLRequest: length 8, code 80877103
        assert_eq!(request, [0, 0, 0, 8, 0x04, 0xd2, 0x16, 0x2f]);
        // TLS handshake record carrying the ClientHello
        assert_eq!(first, Some(0x16));
        server.join().unwrap();
    }

    #[test]
    fn test_unparseable_server_descriptor() {
        let err = Database::connect(Descriptor::ClientServer("host".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("failed to parse the connection parameters"));
    }
}
