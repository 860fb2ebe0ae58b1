use std::path::{Path, PathBuf};

use duckdb::{Connection, Result as DbResult};
use tracing::info;

/// File name of the history database inside the data directory.
pub const DB_FILE_NAME: &str = "history.db";

const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_responses_id START 1;

CREATE TABLE IF NOT EXISTS responses (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_responses_id'),
    prompt TEXT NOT NULL,
    response TEXT NOT NULL,
    schema_name VARCHAR,
    schema_urn VARCHAR,
    dataset_name VARCHAR,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

pub fn get_connection(path: &Path) -> DbResult<Connection> {
    info!("Connecting to DuckDB at {}", path.display());
    let conn = Connection::open(path)?;

    init_schema(&conn)?;

    Ok(conn)
}

pub(crate) fn init_schema(conn: &Connection) -> DbResult<()> {
    info!("Initializing history schema");
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
