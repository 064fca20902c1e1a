use crate::error::{Error, Result};

const MAX_BUCKET_NAME_LEN: usize = 63;
const MAX_REGION_LEN: usize = 64;

pub const DEFAULT_REGION: &str = "us-east-1";

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest("Bucket name is required".to_string()));
    }
    if name.len() > MAX_BUCKET_NAME_LEN {
        return Err(Error::BadRequest(format!(
            "Bucket name cannot exceed {MAX_BUCKET_NAME_LEN} characters"
        )));
    }
    if !name.chars().all(is_valid_name_char) {
        return Err(Error::BadRequest(
            "Bucket name can only contain alphanumeric characters, hyphens, and underscores"
                .to_string(),
        ));
    }
    Ok(())
}

/// Regions are free-form labels; only length and control characters are checked.
pub fn validate_region(region: &str) -> Result<()> {
    if region.len() > MAX_REGION_LEN {
        return Err(Error::BadRequest(format!(
            "Region cannot exceed {MAX_REGION_LEN} characters"
        )));
    }
    if region.chars().any(char::is_control) {
        return Err(Error::BadRequest(
            "Region contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
