use duckdb::{params, Connection};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::debug;

use crate::error::QueryError;
use crate::record::{CitizenRecord, AGE_COLUMN, COLUMNS};

/// Something that can resolve an identity number to a record.
pub trait CitizenLookup: Send + Sync {
    /// `Ok(None)` when nothing matches. Blocking; call from a blocking pool.
    fn lookup(&self, identity: &str) -> Result<Option<CitizenRecord>, QueryError>;
}

/// DuckDB over a Parquet file read in place with `read_parquet`.
///
/// One in-memory connection is shared by every request. DuckDB connections
/// are not `Sync`, so queries go through a mutex one at a time.
pub struct ParquetStore {
    conn: Mutex<Connection>,
    sql: String,
}

impl ParquetStore {
    /// Open an in-memory DuckDB that will read `parquet_path` on every
    /// lookup. The file does not need to exist yet.
    pub fn open_in_memory(parquet_path: &Path) -> Result<Self, QueryError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            sql: lookup_sql(parquet_path),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CitizenLookup for ParquetStore {
    fn lookup(&self, identity: &str) -> Result<Option<CitizenRecord>, QueryError> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&self.sql)?;
        let mut rows = stmt.query(params![identity])?;

        let found = match rows.next()? {
            Some(row) => Some(CitizenRecord::from_row(row)?),
            None => {
                debug!("no match");
                None
            }
        };
        Ok(found)
    }
}

/// Build the single-row lookup. The path is server configuration and is
/// quoted as a literal; the identity is always the `?` parameter.
fn lookup_sql(parquet_path: &Path) -> String {
    let select = COLUMNS
        .iter()
        .map(|col| {
            let ty = if *col == AGE_COLUMN { "BIGINT" } else { "VARCHAR" };
            format!("CAST(\"{col}\" AS {ty}) AS \"{col}\"")
        })
        .collect::<Vec<_>>()
        .join(", ");
    let path = parquet_path.to_string_lossy().replace('\'', "''");

    format!(
        "SELECT {select} FROM read_parquet('{path}') \
         WHERE CAST(\"NUMERO_IDENTIDAD\" AS VARCHAR) = ? LIMIT 1"
    )
}
