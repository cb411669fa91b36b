use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::database::models::{
    Artist, ArtistWithImages, Collectable, CollectorProfile, Group, GroupMemberWithArtist,
    GroupWithImages, Image, Label, LabelWithImages, Role, RoleRecord, User,
};
use crate::database::store::{
    EntityStore, LabelPatch, NewArtist, NewGroup, NewLabel, NewUser, StoreError,
};

const USER_COLUMNS: &str = "id, name, handle, image, banner_image, created_at";
const LABEL_COLUMNS: &str = "id, name, logo_image_id, banner_image_id, created_at";
const GROUP_COLUMNS: &str =
    "id, label_id, english_name, hangul_name, logo_image_id, banner_image_id, created_at";
const ARTIST_COLUMNS: &str =
    "id, label_id, english_name, hangul_name, avatar_image_id, banner_image_id, created_at";
const IMAGE_COLUMNS: &str = "id, url, uploader_id, created_at";
const COLLECTABLE_COLUMNS: &str = "id, name, image_url, owner_id, created_at";

/// Postgres-backed [`EntityStore`].
///
/// The pool connects lazily, so the server boots even when the database is
/// down; queries report `Unavailable` until it comes back.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        let image = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE id = $1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }
}

fn optional_image(
    id: Option<Uuid>,
    url: Option<String>,
    uploader_id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
) -> Option<Image> {
    match (id, url, uploader_id, created_at) {
        (Some(id), Some(url), Some(uploader_id), Some(created_at)) => Some(Image {
            id,
            url,
            uploader_id,
            created_at,
        }),
        _ => None,
    }
}

/// Label row with its logo joined and its banner left-joined.
#[derive(Debug, FromRow)]
struct LabelImageRow {
    id: Uuid,
    name: String,
    logo_image_id: Uuid,
    banner_image_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    logo_url: String,
    logo_uploader_id: Uuid,
    logo_created_at: DateTime<Utc>,
    banner_url: Option<String>,
    banner_uploader_id: Option<Uuid>,
    banner_created_at: Option<DateTime<Utc>>,
}

impl From<LabelImageRow> for LabelWithImages {
    fn from(row: LabelImageRow) -> Self {
        let logo_image = Image {
            id: row.logo_image_id,
            url: row.logo_url,
            uploader_id: row.logo_uploader_id,
            created_at: row.logo_created_at,
        };
        let banner_image = optional_image(
            row.banner_image_id,
            row.banner_url,
            row.banner_uploader_id,
            row.banner_created_at,
        );
        LabelWithImages {
            id: row.id,
            name: row.name,
            logo_image_id: row.logo_image_id,
            banner_image_id: row.banner_image_id,
            logo_image,
            banner_image,
            created_at: row.created_at,
        }
    }
}

const LABEL_JOIN_SQL: &str = "\
    SELECT l.id, l.name, l.logo_image_id, l.banner_image_id, l.created_at, \
           lg.url AS logo_url, lg.uploader_id AS logo_uploader_id, lg.created_at AS logo_created_at, \
           bn.url AS banner_url, bn.uploader_id AS banner_uploader_id, bn.created_at AS banner_created_at \
    FROM labels l \
    JOIN images lg ON lg.id = l.logo_image_id \
    LEFT JOIN images bn ON bn.id = l.banner_image_id";

#[derive(Debug, FromRow)]
struct GroupImageRow {
    id: Uuid,
    label_id: Uuid,
    english_name: String,
    hangul_name: Option<String>,
    logo_image_id: Uuid,
    banner_image_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    logo_url: String,
    logo_uploader_id: Uuid,
    logo_created_at: DateTime<Utc>,
    banner_url: Option<String>,
    banner_uploader_id: Option<Uuid>,
    banner_created_at: Option<DateTime<Utc>>,
}

impl From<GroupImageRow> for GroupWithImages {
    fn from(row: GroupImageRow) -> Self {
        let logo_image = Image {
            id: row.logo_image_id,
            url: row.logo_url,
            uploader_id: row.logo_uploader_id,
            created_at: row.logo_created_at,
        };
        let banner_image = optional_image(
            row.banner_image_id,
            row.banner_url,
            row.banner_uploader_id,
            row.banner_created_at,
        );
        GroupWithImages {
            id: row.id,
            label_id: row.label_id,
            english_name: row.english_name,
            hangul_name: row.hangul_name,
            logo_image_id: row.logo_image_id,
            banner_image_id: row.banner_image_id,
            logo_image,
            banner_image,
            created_at: row.created_at,
        }
    }
}

const GROUP_JOIN_SQL: &str = "\
    SELECT g.id, g.label_id, g.english_name, g.hangul_name, g.logo_image_id, g.banner_image_id, g.created_at, \
           lg.url AS logo_url, lg.uploader_id AS logo_uploader_id, lg.created_at AS logo_created_at, \
           bn.url AS banner_url, bn.uploader_id AS banner_uploader_id, bn.created_at AS banner_created_at \
    FROM groups g \
    JOIN images lg ON lg.id = g.logo_image_id \
    LEFT JOIN images bn ON bn.id = g.banner_image_id";

/// Membership row joined with the artist and both artist images.
#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    group_id: Uuid,
    artist_id: Uuid,
    created_at: DateTime<Utc>,
    label_id: Uuid,
    english_name: String,
    hangul_name: Option<String>,
    avatar_image_id: Option<Uuid>,
    banner_image_id: Option<Uuid>,
    artist_created_at: DateTime<Utc>,
    avatar_url: Option<String>,
    avatar_uploader_id: Option<Uuid>,
    avatar_created_at: Option<DateTime<Utc>>,
    banner_url: Option<String>,
    banner_uploader_id: Option<Uuid>,
    banner_created_at: Option<DateTime<Utc>>,
}

impl From<MemberRow> for GroupMemberWithArtist {
    fn from(row: MemberRow) -> Self {
        let avatar = optional_image(
            row.avatar_image_id,
            row.avatar_url,
            row.avatar_uploader_id,
            row.avatar_created_at,
        );
        let banner = optional_image(
            row.banner_image_id,
            row.banner_url,
            row.banner_uploader_id,
            row.banner_created_at,
        );
        GroupMemberWithArtist {
            id: row.id,
            group_id: row.group_id,
            artist_id: row.artist_id,
            created_at: row.created_at,
            artist: ArtistWithImages {
                id: row.artist_id,
                label_id: row.label_id,
                english_name: row.english_name,
                hangul_name: row.hangul_name,
                avatar_image_id: row.avatar_image_id,
                banner_image_id: row.banner_image_id,
                avatar,
                banner,
                created_at: row.artist_created_at,
            },
        }
    }
}

const MEMBER_JOIN_SQL: &str = "\
    SELECT gm.id, gm.group_id, gm.artist_id, gm.created_at, \
           a.label_id, a.english_name, a.hangul_name, a.avatar_image_id, a.banner_image_id, \
           a.created_at AS artist_created_at, \
           av.url AS avatar_url, av.uploader_id AS avatar_uploader_id, av.created_at AS avatar_created_at, \
           bn.url AS banner_url, bn.uploader_id AS banner_uploader_id, bn.created_at AS banner_created_at \
    FROM group_members gm \
    JOIN artists a ON a.id = gm.artist_id \
    LEFT JOIN images av ON av.id = a.avatar_image_id \
    LEFT JOIN images bn ON bn.id = a.banner_image_id";

#[async_trait]
impl EntityStore for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn user_roles(&self, id: Uuid) -> Result<Vec<Role>, StoreError> {
        let roles =
            sqlx::query_scalar::<_, Role>("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(roles)
    }

    async fn find_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.name, u.handle, u.image, u.banner_image, u.created_at \
             FROM users u \
             JOIN accounts a ON a.user_id = u.id \
             WHERE a.provider = $1 AND a.provider_account_id = $2",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> Result<(User, Vec<Role>), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Exclusive lock serializes first-user detection: the administrator
        // bootstrap must happen at most once across concurrent sign-ups.
        sqlx::query("LOCK TABLE users IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, handle, image) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.handle)
        .bind(&new.image)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO accounts (provider, provider_account_id, user_id) VALUES ($1, $2, $3)")
            .bind(&new.provider)
            .bind(&new.provider_account_id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;

        let mut roles = Vec::new();
        if user_count <= 1 {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user.id)
                .bind(Role::Administrator)
                .execute(&mut *tx)
                .await?;
            roles.push(Role::Administrator);
        }

        tx.commit().await?;
        Ok((user, roles))
    }

    async fn rename_user(&self, id: Uuid, name: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RowNotFound("user"))
    }

    async fn set_user_image(&self, id: Uuid, url: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET image = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RowNotFound("user"))
    }

    async fn set_user_banner(&self, id: Uuid, url: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET banner_image = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RowNotFound("user"))
    }

    async fn collector_profile(&self, id: Uuid) -> Result<Option<CollectorProfile>, StoreError> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(None);
        };
        let cards = sqlx::query_as::<_, Collectable>(&format!(
            "SELECT {} FROM collectables WHERE owner_id = $1 ORDER BY created_at",
            COLLECTABLE_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(CollectorProfile::from_parts(user, cards)))
    }

    async fn labels_with_images(&self) -> Result<Vec<LabelWithImages>, StoreError> {
        let rows = sqlx::query_as::<_, LabelImageRow>(&format!(
            "{} ORDER BY l.name",
            LABEL_JOIN_SQL
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LabelWithImages::from).collect())
    }

    async fn label_with_images(&self, id: Uuid) -> Result<Option<LabelWithImages>, StoreError> {
        let row = sqlx::query_as::<_, LabelImageRow>(&format!(
            "{} WHERE l.id = $1",
            LABEL_JOIN_SQL
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LabelWithImages::from))
    }

    async fn label_groups(&self, label_id: Uuid) -> Result<Vec<GroupWithImages>, StoreError> {
        let rows = sqlx::query_as::<_, GroupImageRow>(&format!(
            "{} WHERE g.label_id = $1 ORDER BY g.english_name",
            GROUP_JOIN_SQL
        ))
        .bind(label_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GroupWithImages::from).collect())
    }

    async fn create_label(&self, new: NewLabel) -> Result<Label, StoreError> {
        let label = sqlx::query_as::<_, Label>(&format!(
            "INSERT INTO labels (name, logo_image_id, banner_image_id) \
             VALUES ($1, $2, $3) RETURNING {}",
            LABEL_COLUMNS
        ))
        .bind(&new.name)
        .bind(new.logo_image_id)
        .bind(new.banner_image_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(label)
    }

    async fn update_label(&self, patch: LabelPatch) -> Result<Label, StoreError> {
        sqlx::query_as::<_, Label>(&format!(
            "UPDATE labels SET \
                 name = COALESCE($2, name), \
                 logo_image_id = COALESCE($3, logo_image_id), \
                 banner_image_id = COALESCE($4, banner_image_id) \
             WHERE id = $1 RETURNING {}",
            LABEL_COLUMNS
        ))
        .bind(patch.id)
        .bind(patch.name)
        .bind(patch.logo_image_id)
        .bind(patch.banner_image_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RowNotFound("label"))
    }

    async fn find_group_by_name(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<Option<Group>, StoreError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {} FROM groups WHERE label_id = $1 AND english_name = $2",
            GROUP_COLUMNS
        ))
        .bind(label_id)
        .bind(english_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group, StoreError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "INSERT INTO groups (label_id, english_name, hangul_name, logo_image_id, banner_image_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            GROUP_COLUMNS
        ))
        .bind(new.label_id)
        .bind(&new.english_name)
        .bind(&new.hangul_name)
        .bind(new.logo_image_id)
        .bind(new.banner_image_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    async fn group_with_images(&self, id: Uuid) -> Result<Option<GroupWithImages>, StoreError> {
        let row = sqlx::query_as::<_, GroupImageRow>(&format!(
            "{} WHERE g.id = $1",
            GROUP_JOIN_SQL
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GroupWithImages::from))
    }

    async fn group_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMemberWithArtist>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "{} WHERE gm.group_id = $1 ORDER BY gm.created_at",
            MEMBER_JOIN_SQL
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GroupMemberWithArtist::from).collect())
    }

    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>, StoreError> {
        let artist = sqlx::query_as::<_, Artist>(&format!(
            "SELECT {} FROM artists WHERE id = $1",
            ARTIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(artist)
    }

    async fn count_label_artists(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM artists WHERE label_id = $1 AND english_name = $2",
        )
        .bind(label_id)
        .bind(english_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_artist_with_membership(
        &self,
        group_id: Uuid,
        new: NewArtist,
    ) -> Result<GroupMemberWithArtist, StoreError> {
        let mut tx = self.pool.begin().await?;

        let artist = sqlx::query_as::<_, Artist>(&format!(
            "INSERT INTO artists (label_id, english_name, hangul_name, avatar_image_id, banner_image_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ARTIST_COLUMNS
        ))
        .bind(new.label_id)
        .bind(&new.english_name)
        .bind(&new.hangul_name)
        .bind(new.avatar_image_id)
        .bind(new.banner_image_id)
        .fetch_one(&mut *tx)
        .await?;

        let (member_id, member_created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO group_members (group_id, artist_id) VALUES ($1, $2) \
             RETURNING id, created_at",
        )
        .bind(group_id)
        .bind(artist.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        // Image rows are immutable, so loading them after commit is safe.
        let avatar = match artist.avatar_image_id {
            Some(id) => self.find_image(id).await?,
            None => None,
        };
        let banner = match artist.banner_image_id {
            Some(id) => self.find_image(id).await?,
            None => None,
        };

        Ok(GroupMemberWithArtist {
            id: member_id,
            group_id,
            artist_id: artist.id,
            created_at: member_created_at,
            artist: ArtistWithImages {
                id: artist.id,
                label_id: artist.label_id,
                english_name: artist.english_name,
                hangul_name: artist.hangul_name,
                avatar_image_id: artist.avatar_image_id,
                banner_image_id: artist.banner_image_id,
                avatar,
                banner,
                created_at: artist.created_at,
            },
        })
    }

    async fn create_image(&self, url: &str, uploader_id: Uuid) -> Result<Image, StoreError> {
        let image = sqlx::query_as::<_, Image>(&format!(
            "INSERT INTO images (url, uploader_id) VALUES ($1, $2) RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(url)
        .bind(uploader_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    async fn random_collectable(&self) -> Result<Option<Collectable>, StoreError> {
        let card = sqlx::query_as::<_, Collectable>(&format!(
            "SELECT {} FROM collectables ORDER BY random() LIMIT 1",
            COLLECTABLE_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(card)
    }

    async fn seed_roles(&self, catalog: &[RoleRecord]) -> Result<(), StoreError> {
        for record in catalog {
            sqlx::query(
                "INSERT INTO roles (role, title, description, color_code) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT (role) DO NOTHING",
            )
            .bind(record.role)
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.color_code)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
