use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Artist, Collectable, CollectorProfile, Group, GroupMemberWithArtist, GroupWithImages, Image,
    Label, LabelWithImages, Role, RoleRecord, User,
};

/// Storage-layer failures, classified so the API layer can map them onto
/// response kinds without inspecting driver internals.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a row that does not exist.
    #[error("{0} not found")]
    RowNotFound(&'static str),

    /// A unique constraint rejected the write (SQLSTATE 23505).
    #[error("{0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write (SQLSTATE 23503).
    #[error("unknown reference: {0}")]
    ForeignKeyViolation(String),

    /// The backing database could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other driver error.
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                Some("23505") => {
                    let detail = match db.constraint() {
                        Some(name) => format!("duplicate key ({})", name),
                        None => "duplicate key".to_string(),
                    };
                    return StoreError::UniqueViolation(detail);
                }
                Some("23503") => {
                    let detail = db.constraint().unwrap_or("foreign key").to_string();
                    return StoreError::ForeignKeyViolation(detail);
                }
                _ => {}
            }
        }
        if matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
            return StoreError::Unavailable(err.to_string());
        }
        StoreError::Sqlx(err)
    }
}

/// Fields required to create a collector account together with its OAuth
/// account link.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub handle: Option<String>,
    pub image: Option<String>,
    pub provider: String,
    pub provider_account_id: String,
}

#[derive(Debug, Clone)]
pub struct NewLabel {
    pub name: String,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
}

/// Partial label update. `None` fields keep their current value.
#[derive(Debug, Clone)]
pub struct LabelPatch {
    pub id: Uuid,
    pub name: Option<String>,
    pub logo_image_id: Option<Uuid>,
    pub banner_image_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewArtist {
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub avatar_image_id: Option<Uuid>,
    pub banner_image_id: Option<Uuid>,
}

/// Persistence contract for every entity the API serves.
///
/// Procedures and handlers talk to storage exclusively through this trait so
/// tests can swap in an in-memory implementation. Lookup methods return
/// `Ok(None)` when the row does not exist; only writes that require an
/// existing row report `RowNotFound`. Compound writes (`create_user`,
/// `create_artist_with_membership`) are transactional: either every row
/// lands or none do.
#[async_trait]
pub trait EntityStore: Send + Sync {
    // Collectors and sessions.
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_roles(&self, id: Uuid) -> Result<Vec<Role>, StoreError>;
    async fn find_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Creates a user plus its account link in one transaction. The very
    /// first user in the system is granted the administrator role; the
    /// returned roles reflect the grant.
    async fn create_user(&self, new: NewUser) -> Result<(User, Vec<Role>), StoreError>;

    async fn rename_user(&self, id: Uuid, name: &str) -> Result<User, StoreError>;
    async fn set_user_image(&self, id: Uuid, url: &str) -> Result<User, StoreError>;
    async fn set_user_banner(&self, id: Uuid, url: &str) -> Result<User, StoreError>;
    async fn collector_profile(&self, id: Uuid) -> Result<Option<CollectorProfile>, StoreError>;

    // Labels.
    async fn labels_with_images(&self) -> Result<Vec<LabelWithImages>, StoreError>;
    async fn label_with_images(&self, id: Uuid) -> Result<Option<LabelWithImages>, StoreError>;
    async fn label_groups(&self, label_id: Uuid) -> Result<Vec<GroupWithImages>, StoreError>;
    async fn create_label(&self, new: NewLabel) -> Result<Label, StoreError>;
    async fn update_label(&self, patch: LabelPatch) -> Result<Label, StoreError>;

    // Groups and memberships.
    async fn find_group_by_name(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<Option<Group>, StoreError>;
    async fn create_group(&self, new: NewGroup) -> Result<Group, StoreError>;
    async fn group_with_images(&self, id: Uuid) -> Result<Option<GroupWithImages>, StoreError>;
    async fn group_members(&self, group_id: Uuid)
        -> Result<Vec<GroupMemberWithArtist>, StoreError>;

    // Artists.
    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>, StoreError>;
    async fn count_label_artists(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<i64, StoreError>;

    /// Creates an artist and links it to `group_id` in one transaction,
    /// returning the membership with the artist (and its images) embedded.
    async fn create_artist_with_membership(
        &self,
        group_id: Uuid,
        new: NewArtist,
    ) -> Result<GroupMemberWithArtist, StoreError>;

    // Images.
    async fn create_image(&self, url: &str, uploader_id: Uuid) -> Result<Image, StoreError>;

    // Collectables.
    async fn random_collectable(&self) -> Result<Option<Collectable>, StoreError>;

    // Operational.
    async fn seed_roles(&self, catalog: &[RoleRecord]) -> Result<(), StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}
