pub mod connection;
pub mod models;
pub mod service;

pub use connection::{db_path, get_connection, DB_FILE_NAME};
pub use models::*;
pub use service::{HistoryError, HistoryStore};
