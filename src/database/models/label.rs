use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::models::Image;

/// Record label (entertainment company) row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Label with its logo and banner images eagerly loaded. The logo is
/// mandatory at the storage level, the banner is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelWithImages {
    pub id: Uuid,
    pub name: String,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
    pub logo_image: Image,
    pub banner_image: Option<Image>,
    pub created_at: DateTime<Utc>,
}
