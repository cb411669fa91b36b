//! Test support: an in-memory [`EntityStore`] with the same observable
//! behavior as the Postgres store, including referential integrity,
//! unique constraints and the transactional compound writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::models::{
    Artist, ArtistWithImages, Collectable, CollectorProfile, Group, GroupMemberWithArtist,
    GroupWithImages, Image, Label, LabelWithImages, Role, RoleRecord, User,
};
use crate::database::store::{
    EntityStore, LabelPatch, NewArtist, NewGroup, NewLabel, NewUser, StoreError,
};

#[derive(Debug, Clone)]
struct AccountRow {
    provider: String,
    provider_account_id: String,
    user_id: Uuid,
}

#[derive(Debug, Clone)]
struct MemberLink {
    id: Uuid,
    group_id: Uuid,
    artist_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    accounts: Vec<AccountRow>,
    user_roles: Vec<(Uuid, Role)>,
    images: Vec<Image>,
    labels: Vec<Label>,
    groups: Vec<Group>,
    artists: Vec<Artist>,
    members: Vec<MemberLink>,
    collectables: Vec<Collectable>,
    roles: Vec<RoleRecord>,
}

impl Inner {
    fn image(&self, id: Uuid) -> Option<Image> {
        self.images.iter().find(|i| i.id == id).cloned()
    }

    fn require_image(&self, id: Uuid, constraint: &str) -> Result<(), StoreError> {
        if self.images.iter().any(|i| i.id == id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(constraint.to_string()))
        }
    }

    fn label_with_images(&self, label: &Label) -> LabelWithImages {
        LabelWithImages {
            id: label.id,
            name: label.name.clone(),
            logo_image_id: label.logo_image_id,
            banner_image_id: label.banner_image_id,
            logo_image: self
                .image(label.logo_image_id)
                .expect("label rows always reference a stored logo"),
            banner_image: label.banner_image_id.and_then(|id| self.image(id)),
            created_at: label.created_at,
        }
    }

    fn group_with_images(&self, group: &Group) -> GroupWithImages {
        GroupWithImages {
            id: group.id,
            label_id: group.label_id,
            english_name: group.english_name.clone(),
            hangul_name: group.hangul_name.clone(),
            logo_image_id: group.logo_image_id,
            banner_image_id: group.banner_image_id,
            logo_image: self
                .image(group.logo_image_id)
                .expect("group rows always reference a stored logo"),
            banner_image: group.banner_image_id.and_then(|id| self.image(id)),
            created_at: group.created_at,
        }
    }

    fn member_with_artist(&self, link: &MemberLink) -> GroupMemberWithArtist {
        let artist = self
            .artists
            .iter()
            .find(|a| a.id == link.artist_id)
            .expect("membership rows always reference a stored artist")
            .clone();
        let avatar = artist.avatar_image_id.and_then(|id| self.image(id));
        let banner = artist.banner_image_id.and_then(|id| self.image(id));

        GroupMemberWithArtist {
            id: link.id,
            group_id: link.group_id,
            artist_id: link.artist_id,
            created_at: link.created_at,
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
        }
    }
}

/// In-memory store for unit tests.
///
/// Mirrors the Postgres behavior procedures can observe: misses are
/// `Ok(None)`, duplicate keys are `UniqueViolation`, dangling references
/// are `ForeignKeyViolation`, and the first user ever created receives the
/// administrator grant.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_member_link: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            fail_member_link: AtomicBool::new(false),
        }
    }

    /// Makes the next `create_artist_with_membership` call fail after the
    /// artist insert, as a mid-transaction fault would.
    pub fn fail_next_member_link(&self) {
        self.fail_member_link.store(true, Ordering::SeqCst);
    }

    /// Inserts a user directly, bypassing the account-link path.
    pub fn seed_user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            handle: None,
            image: None,
            banner_image: None,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_user_with_roles(&self, name: &str, roles: &[Role]) -> User {
        let user = self.seed_user(name);
        let mut inner = self.inner.lock().unwrap();
        for role in roles {
            inner.user_roles.push((user.id, *role));
        }
        user
    }

    pub fn seed_image(&self, url: &str, uploader_id: Uuid) -> Image {
        let image = Image {
            id: Uuid::new_v4(),
            url: url.to_string(),
            uploader_id,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().images.push(image.clone());
        image
    }

    pub fn seed_collectable(&self, name: &str, owner_id: Option<Uuid>) -> Collectable {
        let card = Collectable {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: Some(format!("https://cdn.test/cards/{}.webp", name)),
            owner_id,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().collectables.push(card.clone());
        card
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_roles(&self, id: Uuid) -> Result<Vec<Role>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .user_roles
            .iter()
            .filter(|(user_id, _)| *user_id == id)
            .map(|(_, role)| *role)
            .collect())
    }

    async fn find_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id);
        Ok(account.and_then(|a| inner.users.iter().find(|u| u.id == a.user_id).cloned()))
    }

    async fn create_user(&self, new: NewUser) -> Result<(User, Vec<Role>), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let duplicate = inner
            .accounts
            .iter()
            .any(|a| a.provider == new.provider && a.provider_account_id == new.provider_account_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "duplicate key (accounts_pkey)".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            handle: new.handle,
            image: new.image,
            banner_image: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        inner.accounts.push(AccountRow {
            provider: new.provider,
            provider_account_id: new.provider_account_id,
            user_id: user.id,
        });

        let mut roles = Vec::new();
        if inner.users.len() == 1 {
            inner.user_roles.push((user.id, Role::Administrator));
            roles.push(Role::Administrator);
        }

        Ok((user, roles))
    }

    async fn rename_user(&self, id: Uuid, name: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::RowNotFound("user"))?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn set_user_image(&self, id: Uuid, url: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::RowNotFound("user"))?;
        user.image = Some(url.to_string());
        Ok(user.clone())
    }

    async fn set_user_banner(&self, id: Uuid, url: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::RowNotFound("user"))?;
        user.banner_image = Some(url.to_string());
        Ok(user.clone())
    }

    async fn collector_profile(&self, id: Uuid) -> Result<Option<CollectorProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };
        let cards = inner
            .collectables
            .iter()
            .filter(|c| c.owner_id == Some(id))
            .cloned()
            .collect();
        Ok(Some(CollectorProfile::from_parts(user, cards)))
    }

    async fn labels_with_images(&self) -> Result<Vec<LabelWithImages>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut labels: Vec<_> = inner
            .labels
            .iter()
            .map(|l| inner.label_with_images(l))
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    async fn label_with_images(&self, id: Uuid) -> Result<Option<LabelWithImages>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .labels
            .iter()
            .find(|l| l.id == id)
            .map(|l| inner.label_with_images(l)))
    }

    async fn label_groups(&self, label_id: Uuid) -> Result<Vec<GroupWithImages>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut groups: Vec<_> = inner
            .groups
            .iter()
            .filter(|g| g.label_id == label_id)
            .map(|g| inner.group_with_images(g))
            .collect();
        groups.sort_by(|a, b| a.english_name.cmp(&b.english_name));
        Ok(groups)
    }

    async fn create_label(&self, new: NewLabel) -> Result<Label, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.require_image(new.logo_image_id, "labels_logo_image_id_fkey")?;
        if let Some(banner_id) = new.banner_image_id {
            inner.require_image(banner_id, "labels_banner_image_id_fkey")?;
        }

        let label = Label {
            id: Uuid::new_v4(),
            name: new.name,
            logo_image_id: new.logo_image_id,
            banner_image_id: new.banner_image_id,
            created_at: Utc::now(),
        };
        inner.labels.push(label.clone());
        Ok(label)
    }

    async fn update_label(&self, patch: LabelPatch) -> Result<Label, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(logo_id) = patch.logo_image_id {
            inner.require_image(logo_id, "labels_logo_image_id_fkey")?;
        }
        if let Some(banner_id) = patch.banner_image_id {
            inner.require_image(banner_id, "labels_banner_image_id_fkey")?;
        }

        let label = inner
            .labels
            .iter_mut()
            .find(|l| l.id == patch.id)
            .ok_or(StoreError::RowNotFound("label"))?;
        if let Some(name) = patch.name {
            label.name = name;
        }
        if let Some(logo_id) = patch.logo_image_id {
            label.logo_image_id = logo_id;
        }
        if let Some(banner_id) = patch.banner_image_id {
            label.banner_image_id = Some(banner_id);
        }
        Ok(label.clone())
    }

    async fn find_group_by_name(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<Option<Group>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .groups
            .iter()
            .find(|g| g.label_id == label_id && g.english_name == english_name)
            .cloned())
    }

    async fn create_group(&self, new: NewGroup) -> Result<Group, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.labels.iter().any(|l| l.id == new.label_id) {
            return Err(StoreError::ForeignKeyViolation(
                "groups_label_id_fkey".to_string(),
            ));
        }
        inner.require_image(new.logo_image_id, "groups_logo_image_id_fkey")?;
        if let Some(banner_id) = new.banner_image_id {
            inner.require_image(banner_id, "groups_banner_image_id_fkey")?;
        }
        let duplicate = inner
            .groups
            .iter()
            .any(|g| g.label_id == new.label_id && g.english_name == new.english_name);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "duplicate key (groups_label_english_name_key)".to_string(),
            ));
        }

        let group = Group {
            id: Uuid::new_v4(),
            label_id: new.label_id,
            english_name: new.english_name,
            hangul_name: new.hangul_name,
            logo_image_id: new.logo_image_id,
            banner_image_id: new.banner_image_id,
            created_at: Utc::now(),
        };
        inner.groups.push(group.clone());
        Ok(group)
    }

    async fn group_with_images(&self, id: Uuid) -> Result<Option<GroupWithImages>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .groups
            .iter()
            .find(|g| g.id == id)
            .map(|g| inner.group_with_images(g)))
    }

    async fn group_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMemberWithArtist>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut links: Vec<_> = inner
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        links.sort_by_key(|m| m.created_at);
        Ok(links.iter().map(|m| inner.member_with_artist(m)).collect())
    }

    async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.artists.iter().find(|a| a.id == id).cloned())
    }

    async fn count_label_artists(
        &self,
        label_id: Uuid,
        english_name: &str,
    ) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .artists
            .iter()
            .filter(|a| a.label_id == label_id && a.english_name == english_name)
            .count() as i64)
    }

    async fn create_artist_with_membership(
        &self,
        group_id: Uuid,
        new: NewArtist,
    ) -> Result<GroupMemberWithArtist, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.labels.iter().any(|l| l.id == new.label_id) {
            return Err(StoreError::ForeignKeyViolation(
                "artists_label_id_fkey".to_string(),
            ));
        }
        if let Some(avatar_id) = new.avatar_image_id {
            inner.require_image(avatar_id, "artists_avatar_image_id_fkey")?;
        }
        if let Some(banner_id) = new.banner_image_id {
            inner.require_image(banner_id, "artists_banner_image_id_fkey")?;
        }
        let duplicate = inner
            .artists
            .iter()
            .any(|a| a.label_id == new.label_id && a.english_name == new.english_name);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "duplicate key (artists_label_english_name_key)".to_string(),
            ));
        }
        if !inner.groups.iter().any(|g| g.id == group_id) {
            return Err(StoreError::ForeignKeyViolation(
                "group_members_group_id_fkey".to_string(),
            ));
        }

        // Injected fault between the two inserts; nothing was pushed yet,
        // which is exactly what a rolled-back transaction leaves behind.
        if self.fail_member_link.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::Protocol(
                "injected membership-link failure".to_string(),
            )));
        }

        let artist = Artist {
            id: Uuid::new_v4(),
            label_id: new.label_id,
            english_name: new.english_name,
            hangul_name: new.hangul_name,
            avatar_image_id: new.avatar_image_id,
            banner_image_id: new.banner_image_id,
            created_at: Utc::now(),
        };
        let link = MemberLink {
            id: Uuid::new_v4(),
            group_id,
            artist_id: artist.id,
            created_at: Utc::now(),
        };
        inner.artists.push(artist);
        inner.members.push(link.clone());

        Ok(inner.member_with_artist(&link))
    }

    async fn create_image(&self, url: &str, uploader_id: Uuid) -> Result<Image, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.iter().any(|u| u.id == uploader_id) {
            return Err(StoreError::ForeignKeyViolation(
                "images_uploader_id_fkey".to_string(),
            ));
        }
        let image = Image {
            id: Uuid::new_v4(),
            url: url.to_string(),
            uploader_id,
            created_at: Utc::now(),
        };
        inner.images.push(image.clone());
        Ok(image)
    }

    async fn random_collectable(&self) -> Result<Option<Collectable>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.collectables.is_empty() {
            return Ok(None);
        }
        let pick = Uuid::new_v4().as_u128() as usize % inner.collectables.len();
        Ok(Some(inner.collectables[pick].clone()))
    }

    async fn seed_roles(&self, catalog: &[RoleRecord]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for record in catalog {
            if !inner.roles.iter().any(|r| r.role == record.role) {
                inner.roles.push(record.clone());
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            handle: None,
            image: None,
            provider: "discord".to_string(),
            provider_account_id: format!("discord-{}", name),
        }
    }

    #[tokio::test]
    async fn only_the_first_user_is_bootstrapped_as_administrator() {
        let store = MemoryStore::new();

        let (first, first_roles) = store.create_user(profile("First")).await.unwrap();
        assert_eq!(first_roles, vec![Role::Administrator]);
        assert_eq!(
            store.user_roles(first.id).await.unwrap(),
            vec![Role::Administrator]
        );

        let (second, second_roles) = store.create_user(profile("Second")).await.unwrap();
        assert!(second_roles.is_empty());
        assert!(store.user_roles(second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_account_link_is_a_unique_violation() {
        let store = MemoryStore::new();
        store.create_user(profile("Once")).await.unwrap();
        let err = store.create_user(profile("Once")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn account_link_resolves_back_to_the_user() {
        let store = MemoryStore::new();
        let (user, _) = store.create_user(profile("Linked")).await.unwrap();
        let found = store
            .find_user_by_account("discord", "discord-Linked")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert!(store
            .find_user_by_account("discord", "someone-else")
            .await
            .unwrap()
            .is_none());
    }
}
