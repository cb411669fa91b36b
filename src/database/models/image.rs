use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Uploaded image record. Rows are immutable once written; catalog entities
/// reference them by id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    pub uploader_id: Uuid,
    pub created_at: DateTime<Utc>,
}
