mod buckets;
mod objects;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

/// Room for multipart boundaries and the non-file fields on top of the
/// upload cap itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn storage_router(max_upload_bytes: u64) -> Router<Arc<AppState>> {
    let body_limit =
        usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX);

    Router::new()
        .route("/stats", get(buckets::storage_stats))
        // Bucket routes
        .route("/buckets", post(buckets::create_bucket))
        .route("/buckets", get(buckets::list_buckets))
        .route("/buckets/{name}", delete(buckets::delete_bucket))
        // Item routes
        .route("/buckets/{name}/folders", post(objects::create_folder))
        .route("/buckets/{name}/browse", get(objects::browse))
        .route("/buckets/{name}/items", delete(objects::delete_item))
        .route("/buckets/{name}/rename", put(objects::rename_item))
        .route(
            "/{bucket}/upload",
            post(objects::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/{bucket}/download/{filename}", get(objects::download))
}
