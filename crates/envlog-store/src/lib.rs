//! Local persistence for envlog samples.
//!
//! This crate provides an append-only SQLite log with one row per sample,
//! keyed by timestamp, and trailing-window queries for the chart renderer.
//!
//! # Features
//!
//! - Append samples with duplicate-timestamp detection
//! - Durable writes (WAL, `synchronous = FULL`)
//! - Trailing-window queries ordered by time
//! - Malformed rows are skipped with a warning instead of failing a query
//! - Read-only connections for a concurrent reader
//!
//! # Example
//!
//! ```
//! use envlog_store::Store;
//! use envlog_types::Sample;
//!
//! let store = Store::open_in_memory()?;
//! store.append(&Sample {
//!     timestamp: 1_700_000_000,
//!     primary_temp_c: 21.5,
//!     pressure_hpa: 1013.2,
//!     secondary_temp_c: 22.0,
//!     relative_humidity_pct: 45.0,
//!     co2_ppm: 650,
//! })?;
//!
//! let day = store.query_window(1_700_000_000, 86_400)?;
//! assert_eq!(day.len(), 1);
//! # Ok::<(), envlog_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result, RowError};
pub use models::StoredRow;
pub use queries::WindowQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// `name` is the file stem, so `default_db_path("web")` gives:
///
/// - Linux: `~/.local/share/envlog/web.db`
/// - macOS: `~/Library/Application Support/envlog/web.db`
/// - Windows: `C:\Users\<user>\AppData\Local\envlog\web.db`
pub fn default_db_path(name: &str) -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("envlog")
        .join(format!("{name}.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path() {
        let path = default_db_path("terminal");
        assert!(path.ends_with("envlog/terminal.db"));
    }
}
