use uuid::Uuid;

use crate::database::models::{CollectorProfile, User};
use crate::error::ApiError;
use crate::rpc::RequestContext;

/// `collector.get` — public collector profile (with owned cards), or null.
pub async fn get(ctx: RequestContext, id: Uuid) -> Result<Option<CollectorProfile>, ApiError> {
    Ok(ctx.store.collector_profile(id).await?)
}

/// `protectedCollector.rename` — renames the calling user.
///
/// The target id always comes from the session, never from the input, so
/// one collector can never rename another.
pub async fn rename(ctx: RequestContext, name: String) -> Result<User, ApiError> {
    let session = ctx.require_session()?;
    Ok(ctx.store.rename_user(session.user.id, &name).await?)
}
