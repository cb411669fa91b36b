use crate::database::models::Collectable;
use crate::error::ApiError;
use crate::rpc::RequestContext;

/// `collectable.random` — one uniformly random card, or null when the
/// table is empty. Sampling happens store-side so the table never crosses
/// the wire. Public.
pub async fn random(ctx: RequestContext, _input: ()) -> Result<Option<Collectable>, ApiError> {
    Ok(ctx.store.random_collectable().await?)
}
