//! # Test Utilities Module
//!
//! Fixtures giving each test its own freshly opened SQLite database in a
//! temporary directory, so tests never share state.

use tempfile::TempDir;

use crate::core::db::{sample_rows, Database, Descriptor, SAMPLE_TABLE};

/// Isolated embedded database that lives as long as the fixture
pub struct EmbeddedFixture {
    pub db: Database,
    // Held so the directory outlives the database file
    _dir: TempDir,
}

impl EmbeddedFixture {
    /// Open an empty database with no tables
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fixture.db");
        let db = Database::connect(Descriptor::EmbeddedFile(path)).expect("Failed to open fixture database");
        EmbeddedFixture { db, _dir: dir }
    }

    /// Open a database with the sample table created
    pub fn with_schema() -> Self {
        let mut fixture = Self::new();
        fixture.db.create_schema().expect("Failed to create sample table");
        fixture
    }

    /// Open a database whose sample table holds rows `0..count`
    pub fn with_rows(count: usize) -> Self {
        let mut fixture = Self::with_schema();
        fixture
            .db
            .insert_batch(SAMPLE_TABLE, &sample_rows(count))
            .expect("Failed to insert sample rows");
        fixture
    }
}
