use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use duckdb::types::Type;
use duckdb::{params, Connection, Result as DbResult, Row};
use thiserror::Error;
use tracing::debug;

use crate::db::connection::{db_path, get_connection};
use crate::db::models::HistoryEntry;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Largest LIMIT/OFFSET DuckDB accepts.
const MAX_LIMIT_OFFSET: i64 = 1 << 62;

const SELECT_COLUMNS: &str = "SELECT id, prompt, response, schema_name, schema_urn, dataset_name, CAST(created_at AS VARCHAR) FROM responses";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to create data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: duckdb::Error,
    },
    #[error("no response found with ID {0}")]
    NotFound(i64),
}

fn storage(operation: impl Into<String>) -> impl FnOnce(duckdb::Error) -> HistoryError {
    let operation = operation.into();
    move |source| HistoryError::Storage { operation, source }
}

/// Local log of every generation, backed by a single DuckDB table.
pub struct HistoryStore {
    conn: Connection,
    path: PathBuf,
}

impl HistoryStore {
    /// Opens (creating if needed) the history database inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|source| HistoryError::DataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let path = db_path(data_dir);
        let conn = get_connection(&path).map_err(storage("open history database"))?;

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn row_to_entry(row: &Row) -> DbResult<HistoryEntry> {
        let created_str: String = row.get(6)?;
        let created_at = NaiveDateTime::parse_from_str(&created_str, TIMESTAMP_FORMAT)
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
            .and_utc();

        Ok(HistoryEntry {
            id: row.get(0)?,
            prompt: row.get(1)?,
            response: row.get(2)?,
            schema_name: row.get(3)?,
            schema_urn: row.get(4)?,
            dataset_name: row.get(5)?,
            created_at,
        })
    }

    pub fn save(
        &self,
        prompt: &str,
        response: &str,
        schema_name: Option<&str>,
        schema_urn: Option<&str>,
        dataset_name: Option<&str>,
    ) -> Result<i64, HistoryError> {
        let non_empty = |value: Option<&str>| value.filter(|s| !s.is_empty()).map(str::to_string);

        let mut stmt = self
            .conn
            .prepare(
                "INSERT INTO responses (prompt, response, schema_name, schema_urn, dataset_name)
                 VALUES (?, ?, ?, ?, ?)
                 RETURNING id",
            )
            .map_err(storage("prepare insert"))?;

        let id: i64 = stmt
            .query_row(
                params![
                    prompt,
                    response,
                    non_empty(schema_name),
                    non_empty(schema_urn),
                    non_empty(dataset_name)
                ],
                |row| row.get(0),
            )
            .map_err(storage("insert response"))?;

        debug!("Response saved to history with ID: {}", id);
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<HistoryEntry, HistoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .map_err(storage(format!("prepare lookup of response {}", id)))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_entry)
            .map_err(storage(format!("query response {}", id)))?;

        match rows.next() {
            Some(row) => row.map_err(storage(format!("read response {}", id))),
            None => Err(HistoryError::NotFound(id)),
        }
    }

    /// Newest first. An offset past the end yields an empty list.
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                SELECT_COLUMNS
            ))
            .map_err(storage("prepare history listing"))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX).min(MAX_LIMIT_OFFSET);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX).min(MAX_LIMIT_OFFSET);
        let rows = stmt
            .query_map(params![limit, offset], Self::row_to_entry)
            .map_err(storage("query responses"))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(storage("read response"))?);
        }
        Ok(entries)
    }

    /// Removing an id that is not there is not an error.
    pub fn delete(&self, id: i64) -> Result<(), HistoryError> {
        self.conn
            .execute("DELETE FROM responses WHERE id = ?", params![id])
            .map_err(storage(format!("delete response {}", id)))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let removed = self
            .conn
            .execute("DELETE FROM responses", [])
            .map_err(storage("clear history"))?;
        debug!("Cleared {} history entries", removed);
        Ok(())
    }
}
