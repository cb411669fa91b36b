use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::models::Collectable;

/// Collector account record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub banner_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public collector page projection: profile fields plus every card the
/// collector owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorProfile {
    pub id: Uuid,
    pub name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub banner_image: Option<String>,
    pub cards: Vec<Collectable>,
}

impl CollectorProfile {
    pub fn from_parts(user: User, cards: Vec<Collectable>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            handle: user.handle,
            image: user.image,
            banner_image: user.banner_image,
            cards,
        }
    }
}
