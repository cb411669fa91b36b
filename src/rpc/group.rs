use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Group, GroupMemberWithArtist, GroupWithImages};
use crate::database::store::{NewArtist, NewGroup};
use crate::error::ApiError;
use crate::rpc::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
    pub label_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersCreateInput {
    pub group_id: Uuid,
    pub label_id: Uuid,
    pub english_name: String,
    pub hangul_name: Option<String>,
    pub banner_image_id: Option<Uuid>,
    pub avatar_image_id: Option<Uuid>,
}

/// `group.create` — editor-tier mutation. A label never carries two groups
/// with the same english name; duplicates fail `CONFLICT`.
pub async fn create(ctx: RequestContext, input: CreateInput) -> Result<Group, ApiError> {
    ctx.require_editor()?;

    // Fast-path duplicate answer; the storage unique constraint closes the
    // remaining race window.
    let existing = ctx
        .store
        .find_group_by_name(input.label_id, &input.english_name)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Group Already Exists"));
    }

    let group = ctx
        .store
        .create_group(NewGroup {
            label_id: input.label_id,
            english_name: input.english_name,
            hangul_name: input.hangul_name,
            logo_image_id: input.logo_image_id,
            banner_image_id: input.banner_image_id,
        })
        .await?;
    Ok(group)
}

/// `group.info` — group with images, or null. Public.
pub async fn info(ctx: RequestContext, id: Uuid) -> Result<Option<GroupWithImages>, ApiError> {
    Ok(ctx.store.group_with_images(id).await?)
}

/// `group.members.create` — editor-tier mutation creating an artist and
/// its membership link as one atomic unit.
///
/// The duplicate check is scoped to the label: an artist may sit in
/// several groups, but one label never signs the same english name twice.
pub async fn members_create(
    ctx: RequestContext,
    input: MembersCreateInput,
) -> Result<GroupMemberWithArtist, ApiError> {
    ctx.require_editor()?;

    let existing = ctx
        .store
        .count_label_artists(input.label_id, &input.english_name)
        .await?;
    if existing >= 1 {
        return Err(ApiError::conflict("Artist Already Exists"));
    }

    let member = ctx
        .store
        .create_artist_with_membership(
            input.group_id,
            NewArtist {
                label_id: input.label_id,
                english_name: input.english_name,
                hangul_name: input.hangul_name,
                avatar_image_id: input.avatar_image_id,
                banner_image_id: input.banner_image_id,
            },
        )
        .await?;
    Ok(member)
}

/// `group.members.get` — memberships of a group, each with the artist and
/// its images joined. Public.
pub async fn members_get(
    ctx: RequestContext,
    group_id: Uuid,
) -> Result<Vec<GroupMemberWithArtist>, ApiError> {
    Ok(ctx.store.group_members(group_id).await?)
}
