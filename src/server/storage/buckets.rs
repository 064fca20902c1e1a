use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{BucketListResponse, BucketResponse, CreateBucketRequest, required};
use crate::server::response::{ApiError, ApiResponse, message};
use crate::types::Permissions;

pub async fn create_bucket(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBucketRequest>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    let name = required(req.name).ok_or_else(|| ApiError::bad_request("Bucket name is required"))?;
    let region = required(req.region);

    let bucket = state
        .buckets
        .create(&auth.identity, &name, region.as_deref())
        .await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(BucketResponse::from(bucket))))
}

/// Lists the caller's own buckets keyed by name.
pub async fn list_buckets(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_READ)?;

    let buckets: BucketListResponse = state
        .buckets
        .list(&auth.identity)?
        .into_iter()
        .map(|b| (b.name.clone(), BucketResponse::from(b)))
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(buckets)))
}

pub async fn delete_bucket(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    state.buckets.delete(&auth.identity, &name).await?;

    Ok::<_, ApiError>(message("Bucket deleted"))
}

pub async fn storage_stats(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_READ)?;

    let usage = state.objects.usage(&auth.identity).await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(usage)))
}
