use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::models::Image;

/// Solo artist or group member row. `english_name` is unique within its
/// label, independent of group membership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: Uuid,
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub avatar_image_id: Option<Uuid>,
    pub banner_image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Artist with avatar and banner images eagerly loaded. Both are optional
/// for artists, so either side may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistWithImages {
    pub id: Uuid,
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub avatar_image_id: Option<Uuid>,
    pub banner_image_id: Option<Uuid>,
    pub avatar: Option<Image>,
    pub banner: Option<Image>,
    pub created_at: DateTime<Utc>,
}
