//! Main store implementation.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use tracing::{debug, info, warn};

use envlog_types::Sample;

use crate::error::{Error, Result};
use crate::models::StoredRow;
use crate::queries::WindowQuery;
use crate::schema;

/// How long a connection waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based append-only log of samples.
///
/// A `Store` owns one connection. The sampling loop appends through a
/// read-write store while the render worker reads through its own
/// [`Store::open_read_only`] connection; WAL mode lets the two proceed
/// without blocking each other.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // An acknowledged append must survive power loss
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open an existing database for reading only.
    ///
    /// The schema is not touched; opening fails if the file does not exist.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening database read-only at {}", path.display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Append one sample.
    ///
    /// Fails with [`Error::DuplicateTimestamp`] if a sample with the same
    /// timestamp is already stored; the stored sample is left unchanged.
    pub fn append(&self, sample: &Sample) -> Result<()> {
        sample.validate()?;

        let result = self.conn.execute(
            "INSERT INTO sensor_data (time, temp1, pressure, temp2, relative_humidity, co2)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sample.timestamp,
                sample.primary_temp_c,
                sample.pressure_hpa,
                sample.secondary_temp_c,
                sample.relative_humidity_pct,
                sample.co2_ppm,
            ],
        );

        match result {
            Ok(_) => {
                debug!("Appended sample at {}", sample.timestamp);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(Error::DuplicateTimestamp(sample.timestamp))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All samples in the trailing window `(now - window_seconds, now]`,
    /// ordered by timestamp ascending.
    pub fn query_window(&self, now: i64, window_seconds: i64) -> Result<Vec<Sample>> {
        self.query(&WindowQuery::trailing(now, window_seconds))
    }

    /// Query samples with filters.
    ///
    /// Rows that cannot be decoded into a valid sample are skipped with a
    /// warning; they never fail the whole query.
    pub fn query(&self, query: &WindowQuery) -> Result<Vec<Sample>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), StoredRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let samples = rows
            .iter()
            .filter_map(|row| match row.decode() {
                Ok(sample) => Some(sample),
                Err(e) => {
                    warn!("Skipping malformed row {}: {}", row.id, e);
                    None
                }
            })
            .collect();

        Ok(samples)
    }

    /// The most recent valid sample, if any.
    pub fn latest(&self) -> Result<Option<Sample>> {
        // Walk back a few rows in case the newest ones are malformed
        let mut samples = self.query(&WindowQuery::new().newest_first().limit(16))?;
        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(samples.swap_remove(0)))
    }

    /// Number of stored rows, including ones that would fail to decode.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sensor_data", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
