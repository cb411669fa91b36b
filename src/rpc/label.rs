use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{GroupWithImages, Label, LabelWithImages};
use crate::database::store::{LabelPatch, NewLabel};
use crate::error::ApiError;
use crate::rpc::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
    pub name: String,
    pub logo_image_id: Uuid,
    pub banner_image_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub logo_image_id: Option<Uuid>,
    pub banner_image_id: Option<Uuid>,
}

/// `label.get` — every label with logo and banner joined. Public.
pub async fn get(ctx: RequestContext, _input: ()) -> Result<Vec<LabelWithImages>, ApiError> {
    Ok(ctx.store.labels_with_images().await?)
}

/// `label.unique` — one label with images, or null. Public.
pub async fn unique(ctx: RequestContext, id: Uuid) -> Result<Option<LabelWithImages>, ApiError> {
    Ok(ctx.store.label_with_images(id).await?)
}

/// `label.get.groups` — all groups signed to a label, with images. Public.
pub async fn get_groups(
    ctx: RequestContext,
    label_id: Uuid,
) -> Result<Vec<GroupWithImages>, ApiError> {
    Ok(ctx.store.label_groups(label_id).await?)
}

/// `label.create` — editor-tier mutation.
pub async fn create(ctx: RequestContext, input: CreateInput) -> Result<Label, ApiError> {
    ctx.require_editor()?;

    let label = ctx
        .store
        .create_label(NewLabel {
            name: input.name,
            logo_image_id: input.logo_image_id,
            banner_image_id: input.banner_image_id,
        })
        .await?;
    Ok(label)
}

/// `label.update` — editor-tier partial update; absent fields keep their
/// stored value. Unknown ids fail `NOT_FOUND`.
pub async fn update(ctx: RequestContext, input: UpdateInput) -> Result<Label, ApiError> {
    ctx.require_editor()?;

    let label = ctx
        .store
        .update_label(LabelPatch {
            id: input.id,
            name: input.name,
            logo_image_id: input.logo_image_id,
            banner_image_id: input.banner_image_id,
        })
        .await?;
    Ok(label)
}
