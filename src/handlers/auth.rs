use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::issue_token;
use crate::database::models::{Role, User};
use crate::database::store::NewUser;
use crate::error::ApiError;
use crate::rpc::Session;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub provider: String,
    pub provider_account_id: String,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub image: Option<String>,
}

/// Session user wire shape: the user row with its roles inlined.
#[derive(Debug, Serialize)]
struct SessionUser<'a> {
    #[serde(flatten)]
    user: &'a User,
    roles: &'a [Role],
}

/// POST /auth/callback - exchange a verified provider profile for a session
///
/// The OAuth handshake happens in the external provider; by the time this
/// endpoint is called the profile is trusted. A first sign-in creates the
/// user and its account link (plus the administrator bootstrap grant when
/// it is the first user ever); later sign-ins resolve the existing link.
///
/// Expected Input:
/// ```json
/// { "provider": "discord", "providerAccountId": "1234", "name": "Yeji" }
/// ```
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "token": "<jwt>", "user": { ..., "roles": [] } } }
/// ```
pub async fn callback(
    State(state): State<AppState>,
    Json(req): Json<CallbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let linked = state
        .store
        .find_user_by_account(&req.provider, &req.provider_account_id)
        .await?;

    let (user, roles) = match linked {
        Some(user) => {
            let roles = state.store.user_roles(user.id).await?;
            (user, roles)
        }
        None => {
            state
                .store
                .create_user(NewUser {
                    name: req.name.unwrap_or_default(),
                    handle: req.handle,
                    image: req.image,
                    provider: req.provider,
                    provider_account_id: req.provider_account_id,
                })
                .await?
        }
    };

    let token = issue_token(user.id).map_err(|e| {
        tracing::error!("failed to issue session token: {}", e);
        ApiError::internal("failed to issue session token")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": SessionUser {
                user: &user,
                roles: &roles,
            },
        }
    })))
}

/// GET /auth/session - the resolved session, or null when anonymous
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "user": { ..., "roles": ["paladin"] } } }
/// ```
pub async fn session(Extension(session): Extension<Option<Session>>) -> Json<Value> {
    let data = session.as_ref().map(|s| {
        json!({
            "user": SessionUser {
                user: &s.user,
                roles: &s.roles,
            }
        })
    });

    Json(json!({ "success": true, "data": data }))
}
