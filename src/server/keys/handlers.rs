use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{CreateKeyRequest, CreateKeyResponse, KeyResponse, required};
use crate::server::response::{ApiError, ApiResponse, message};
use crate::types::Permissions;

/// Issues a key owned by the caller. The secret appears only in this response.
pub async fn issue_key(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateKeyRequest>,
) -> impl IntoResponse {
    auth.require(Permissions::KEYS_MANAGE)?;

    let name = required(req.name).ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let key = state.keys.issue(&auth.identity, &name)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(CreateKeyResponse::from(key))))
}

pub async fn list_keys(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    auth.require(Permissions::KEYS_MANAGE)?;

    let keys: Vec<KeyResponse> = state
        .keys
        .list(&auth.identity)?
        .into_iter()
        .map(KeyResponse::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(keys)))
}

pub async fn revoke_key(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(prefix): Path<String>,
) -> impl IntoResponse {
    auth.require(Permissions::KEYS_MANAGE)?;

    state
        .keys
        .revoke(&auth.identity, &auth.credential, &prefix)?;

    Ok::<_, ApiError>(message("API key revoked"))
}
