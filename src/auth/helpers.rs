use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, PartialEq, Eq)]
pub enum CredentialError {
    InvalidScheme,
    InvalidHeader,
}

/// Extracts the raw credential from `X-API-Key`, falling back to
/// `Authorization: Bearer`.
/// Returns None if neither header is present.
pub fn extract_credential(headers: &HeaderMap) -> Result<Option<String>, CredentialError> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        let value = value.to_str().map_err(|_| CredentialError::InvalidHeader)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(CredentialError::InvalidHeader);
        }
        return Ok(Some(value.to_string()));
    }

    match headers.get(AUTHORIZATION).map(|h| h.to_str()) {
        Some(Ok(header)) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            Some(_) => Err(CredentialError::InvalidHeader),
            None => Err(CredentialError::InvalidScheme),
        },
        Some(Err(_)) => Err(CredentialError::InvalidHeader),
        None => Ok(None),
    }
}
