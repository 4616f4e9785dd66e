//! Rows and the lazy row sequence returned by `Database::select_all`.

use std::fmt;

use postgres::fallible_iterator::FallibleIterator;
use tracing::debug;

use crate::core::db::SessionState;
use crate::core::{AccessError, Result};

/// One `(id, name)` tuple read from the sample table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Row {
    pub id: i64,
    pub name: String,
}

impl Row {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Row {
            id,
            name: name.into(),
        }
    }

    /// Generated row `i`, named `nomNNN`.
    pub fn sample(i: i64) -> Self {
        Row::new(i, format!("nom{:03}", i))
    }

    pub(crate) fn from_sqlite(row: &rusqlite::Row<'_>) -> Result<Self> {
        let id = row
            .get::<_, i64>(0)
            .map_err(|e| AccessError::decode("failed to read the id column", e))?;
        let name = row
            .get::<_, String>(1)
            .map_err(|e| AccessError::decode("failed to read the name column", e))?;
        Ok(Row { id, name })
    }

    pub(crate) fn from_postgres(row: &postgres::Row) -> Result<Self> {
        let id = row
            .try_get::<_, i64>(0)
            .map_err(|e| AccessError::decode("failed to read the id column", e))?;
        let name = row
            .try_get::<_, String>(1)
            .map_err(|e| AccessError::decode("failed to read the name column", e))?;
        Ok(Row { id, name })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// Rows `0..count` as produced by [`Row::sample`].
pub fn sample_rows(count: usize) -> Vec<Row> {
    (0..count as i64).map(Row::sample).collect()
}

pub(crate) enum CursorSource<'db> {
    Embedded(rusqlite::Statement<'db>),
    ClientServer(postgres::RowIter<'db>),
}

/// An open read on one table.
///
/// The cursor borrows the database, so no other operation can run until it
/// is dropped. Its rows can be walked once.
pub struct RowCursor<'db> {
    source: CursorSource<'db>,
    consumed: bool,
}

impl<'db> RowCursor<'db> {
    pub(crate) fn new(source: CursorSource<'db>) -> Self {
        RowCursor {
            source,
            consumed: false,
        }
    }

    /// Starts the row sequence.
    ///
    /// Returns `InvalidState` if the sequence was already started.
    pub fn rows(&mut self) -> Result<Rows<'_, 'db>> {
        if self.consumed {
            return Err(AccessError::InvalidState {
                operation: "read rows from a consumed cursor",
                state: SessionState::Open,
            });
        }
        self.consumed = true;

        let inner = match &mut self.source {
            CursorSource::Embedded(stmt) => RowsInner::Embedded(
                stmt.query([])
                    .map_err(|e| AccessError::query("failed to run the select query", e))?,
            ),
            CursorSource::ClientServer(iter) => RowsInner::ClientServer(iter),
        };
        Ok(Rows {
            inner,
            finished: false,
            read: 0,
        })
    }

    /// Drains the cursor into a vector, stopping at the first error.
    pub fn collect_rows(mut self) -> Result<Vec<Row>> {
        let rows = self.rows()?.collect::<Result<Vec<Row>>>();
        rows
    }
}

enum RowsInner<'c, 'db> {
    Embedded(rusqlite::Rows<'c>),
    ClientServer(&'c mut postgres::RowIter<'db>),
}

/// Lazy iterator over the rows of a [`RowCursor`].
///
/// Each row is decoded when it is pulled. The first error is yielded once and
/// ends the sequence.
pub struct Rows<'c, 'db> {
    inner: RowsInner<'c, 'db>,
    finished: bool,
    read: usize,
}

impl<'c, 'db> Rows<'c, 'db> {
    fn advance(&mut self) -> Result<Option<Row>> {
        match &mut self.inner {
            RowsInner::Embedded(rows) => match rows.next() {
                Ok(Some(row)) => Row::from_sqlite(row).map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(AccessError::query("failed to read the next row", e)),
            },
            RowsInner::ClientServer(iter) => match iter.next() {
                Ok(Some(row)) => Row::from_postgres(&row).map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(AccessError::query("failed to read the next row", e)),
            },
        }
    }
}

impl<'c, 'db> Iterator for Rows<'c, 'db> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(row)) => {
                self.read += 1;
                Some(Ok(row))
            }
            Ok(None) => {
                debug!("Cursor exhausted after {} rows", self.read);
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rows() {
        let rows = sample_rows(3);
        assert_eq!(
            rows,
            vec![Row::new(0, "nom000"), Row::new(1, "nom001"), Row::new(2, "nom002")]
        );
        assert!(sample_rows(0).is_empty());
    }

    #[test]
    fn test_row_display() {
        assert_eq!(Row::sample(7).to_string(), "7 nom007");
    }
}
