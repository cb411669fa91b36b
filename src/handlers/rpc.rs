use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::rpc::{ProcedureKind, RequestContext, Session};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    input: Option<String>,
}

/// GET /rpc/:procedure?input=<url-encoded JSON> - invoke a query
///
/// Expected Output:
/// ```json
/// { "success": true, "data": ... }
/// ```
pub async fn call_query(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    Query(params): Query<QueryParams>,
    Extension(session): Extension<Option<Session>>,
) -> Result<Response, ApiError> {
    let input = match params.input {
        None => Value::Null,
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| ApiError::bad_request(format!("input is not valid JSON: {}", e)))?,
    };

    dispatch(state, &procedure, ProcedureKind::Query, session, input).await
}

/// POST /rpc/:procedure - invoke a mutation; the body is the JSON input
/// (an empty body means no input).
pub async fn call_mutation(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    Extension(session): Extension<Option<Session>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let input = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("body is not valid JSON: {}", e)))?
    };

    dispatch(state, &procedure, ProcedureKind::Mutation, session, input).await
}

async fn dispatch(
    state: AppState,
    procedure: &str,
    kind: ProcedureKind,
    session: Option<Session>,
    input: Value,
) -> Result<Response, ApiError> {
    let ctx = RequestContext::new(state.store.clone(), session);
    let data = state.registry.dispatch(procedure, kind, ctx, input).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response())
}
