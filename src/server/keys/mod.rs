mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn keys_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keys", post(handlers::issue_key))
        .route("/keys", get(handlers::list_keys))
        .route("/keys/{prefix}", delete(handlers::revoke_key))
}
