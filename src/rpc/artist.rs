use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Artist;
use crate::error::ApiError;
use crate::rpc::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInput {
    pub id: Uuid,
}

/// `artist.get` — artist row by id, or null. Public.
pub async fn get(ctx: RequestContext, input: GetInput) -> Result<Option<Artist>, ApiError> {
    Ok(ctx.store.find_artist(input.id).await?)
}
