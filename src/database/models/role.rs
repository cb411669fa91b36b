use serde::{Deserialize, Serialize};

/// Assignable roles, mirrored by the Postgres `role_kind` enum.
///
/// Role grants are stored per user in `user_roles`; the catalog metadata
/// (title, description, badge color) lives in `roles` and is seeded by the
/// CLI. Permission checks dispatch on this enum alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Sentinel,
    Paladin,
}

/// Catalog row describing a role for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub role: Role,
    pub title: String,
    pub description: String,
    pub color_code: String,
}
