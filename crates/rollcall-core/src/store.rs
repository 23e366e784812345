//! SQLite-backed feature store.
//!
//! Durable parallel (identity, feature vector) rows accumulated across
//! enrollment sessions. Append-only: this crate never deletes rows. The
//! feature width is pinned in the `meta` table by the first batch and
//! enforced on every later write.

use crate::features::{blob_to_vector, vector_to_blob};
use crate::identity::{Identity, IdentityRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bumped whenever the table layout or the vector flatten order changes.
const SCHEMA_VERSION: i64 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("feature store not found at {0} — run enrollment first")]
    NotFound(PathBuf),
    #[error("unsupported store schema version {found} (this build supports {supported})")]
    SchemaVersion { found: i64, supported: i64 },
    #[error("feature width mismatch: store holds {expected}-dim vectors, batch has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("enrollment batch is empty")]
    EmptyBatch,
    #[error("corrupt feature blob in row {0}")]
    CorruptRow(i64),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Full in-memory view of the store, as consumed by the recognizer.
///
/// Invariant: `records.len() == vectors.len()`, and every vector has
/// length `dim` (when `dim` is set; `None` only for an empty store).
pub struct StoreSnapshot {
    pub records: Vec<IdentityRecord>,
    pub vectors: Vec<Vec<f32>>,
    pub dim: Option<usize>,
}

/// One enrolled person, summarized for listings.
#[derive(Debug, Clone)]
pub struct IdentitySummary {
    pub roll_number: String,
    pub name: String,
    pub sample_count: usize,
}

/// Handle to the on-disk feature store.
#[derive(Debug)]
pub struct FeatureStore {
    conn: Connection,
    path: PathBuf,
}

impl FeatureStore {
    /// Open the store at `path`, creating it (and its schema) if absent.
    ///
    /// Enrollment uses this; a fresh database is valid and empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS samples (
                 id          INTEGER PRIMARY KEY,
                 roll_number TEXT,
                 name        TEXT,
                 department  TEXT,
                 semester    TEXT,
                 label       TEXT NOT NULL,
                 features    BLOB NOT NULL,
                 created_at  TEXT NOT NULL DEFAULT (datetime('now'))
             );",
        )?;

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        match store.meta_i64("schema_version")? {
            None => store.set_meta("schema_version", &SCHEMA_VERSION.to_string())?,
            Some(v) if v == SCHEMA_VERSION => {}
            Some(found) => {
                return Err(StoreError::SchemaVersion {
                    found,
                    supported: SCHEMA_VERSION,
                })
            }
        }
        Ok(store)
    }

    /// Open an existing store, failing if the database file is absent.
    ///
    /// Recognition startup uses this: a missing store is fatal.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// Append one enrollment batch: a single identity replicated across
    /// every vector in `batch`.
    ///
    /// The whole batch is one transaction; a failure writes nothing. The
    /// vector width must be uniform within the batch and must match the
    /// width pinned by the first batch ever written.
    pub fn append_batch(
        &mut self,
        identity: &Identity,
        batch: &[Vec<f32>],
    ) -> Result<(), StoreError> {
        let first = batch.first().ok_or(StoreError::EmptyBatch)?;
        let width = first.len();
        for v in batch {
            if v.len() != width {
                return Err(StoreError::DimensionMismatch {
                    expected: width,
                    actual: v.len(),
                });
            }
        }
        match self.meta_i64("feature_dim")? {
            Some(expected) if expected as usize != width => {
                return Err(StoreError::DimensionMismatch {
                    expected: expected as usize,
                    actual: width,
                });
            }
            Some(_) => {}
            None => self.set_meta("feature_dim", &width.to_string())?,
        }

        let label = identity.composite_label();
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO samples (roll_number, name, department, semester, label, features)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for vector in batch {
                insert.execute(params![
                    identity.roll_number,
                    identity.name,
                    identity.department,
                    identity.semester,
                    label,
                    vector_to_blob(vector),
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            roll_number = %identity.roll_number,
            samples = batch.len(),
            width,
            path = %self.path.display(),
            "enrollment batch appended"
        );
        Ok(())
    }

    /// Read every row into memory, in insertion order.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, roll_number, name, department, semester, label, features
             FROM samples ORDER BY id",
        )?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        let mut vectors = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let roll: Option<String> = row.get(1)?;
            let record = match roll {
                Some(roll_number) => IdentityRecord::Known(Identity {
                    roll_number,
                    name: row.get(2)?,
                    department: row.get(3)?,
                    semester: row.get(4)?,
                }),
                // Rows written before structured columns existed carry only
                // the composite label.
                None => IdentityRecord::Legacy(row.get(5)?),
            };
            let blob: Vec<u8> = row.get(6)?;
            let vector = blob_to_vector(&blob).ok_or(StoreError::CorruptRow(id))?;
            records.push(record);
            vectors.push(vector);
        }

        let dim = self.meta_i64("feature_dim")?.map(|v| v as usize);
        Ok(StoreSnapshot {
            records,
            vectors,
            dim,
        })
    }

    /// Number of stored samples.
    pub fn sample_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Per-roll-number enrollment summary, ordered by roll number.
    pub fn identities(&self) -> Result<Vec<IdentitySummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(roll_number, label) AS roll, COALESCE(name, '') AS name, COUNT(*)
             FROM samples GROUP BY roll, name ORDER BY roll",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(IdentitySummary {
                    roll_number: row.get(0)?,
                    name: row.get(1)?,
                    sample_count: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn meta_i64(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
