use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::KeyStore;
use super::helpers::{CredentialError, extract_credential};
use crate::error::{Error, ErrorKind, Result};
use crate::server::AppState;
use crate::types::{Identity, Permissions};

/// Extractor that requires any valid credential (master or issued key).
pub struct RequireAuth {
    pub identity: Identity,
    /// The raw credential presented with this request.
    pub credential: String,
}

impl RequireAuth {
    pub fn require(&self, capability: Permissions) -> Result<()> {
        KeyStore::require(&self.identity, capability)
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidCredential,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AuthError::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                ErrorKind::Unauthenticated,
                "API key required. Include X-API-Key header.",
            ),
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                ErrorKind::Unauthenticated,
                "Invalid authorization scheme",
            ),
            AuthError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                ErrorKind::Unauthenticated,
                "Invalid API key",
            ),
            AuthError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Internal,
                "Internal server error",
            ),
        };

        let body = json!({ "data": null, "error": message, "kind": kind.as_str() });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"cloudx\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        authenticate(parts, state)
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> std::result::Result<RequireAuth, AuthError> {
    let credential = extract_credential(&parts.headers)
        .map_err(|e| match e {
            CredentialError::InvalidScheme => AuthError::InvalidScheme,
            CredentialError::InvalidHeader => AuthError::InvalidCredential,
        })?
        .ok_or(AuthError::MissingAuth)?;

    let identity = state.keys.validate(&credential).map_err(|e| match e {
        Error::InvalidCredential => AuthError::InvalidCredential,
        e => {
            tracing::error!("Failed to validate API key: {e}");
            AuthError::InternalError
        }
    })?;

    Ok(RequireAuth {
        identity,
        credential,
    })
}
