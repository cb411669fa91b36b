use crate::database::models::User;
use crate::error::ApiError;
use crate::rpc::RequestContext;

// Both mutations trust the caller-supplied URL as-is; nothing verifies it
// came out of the asset upload endpoint. Known hardening candidate.

/// `image.avatar` — sets the calling user's avatar URL.
pub async fn avatar(ctx: RequestContext, url: String) -> Result<User, ApiError> {
    let session = ctx.require_session()?;
    Ok(ctx.store.set_user_image(session.user.id, &url).await?)
}

/// `image.banner` — sets the calling user's profile banner URL.
pub async fn banner(ctx: RequestContext, url: String) -> Result<User, ApiError> {
    let session = ctx.require_session()?;
    Ok(ctx.store.set_user_banner(session.user.id, &url).await?)
}
