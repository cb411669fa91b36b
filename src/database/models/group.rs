use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::models::{ArtistWithImages, Image};

/// Idol group row. `english_name` is unique within its label.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Group with its logo and banner images eagerly loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWithImages {
    pub id: Uuid,
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
    pub logo_image: Image,
    pub banner_image: Option<Image>,
    pub created_at: DateTime<Utc>,
}

/// Membership row joined with the member artist and that artist's images.
/// This is the shape both `group.members.get` and `group.members.create`
/// return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberWithArtist {
    pub id: Uuid,
    pub group_id: Uuid,
    pub artist_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub artist: ArtistWithImages,
}
