use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded generation. Rows are never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub prompt: String,
    pub response: String,
    pub schema_name: Option<String>,
    pub schema_urn: Option<String>,
    pub dataset_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
