use rand::RngCore;
use rand::rngs::OsRng;

pub const KEY_PREFIX: &str = "cx_";
const SECRET_BYTES: usize = 32;
const SECRET_HEX_LEN: usize = SECRET_BYTES * 2;

/// Generates a new API key secret with the format: cx_<64 hex chars>
/// carrying 256 bits from the OS random source.
#[must_use]
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// Returns true if `s` has the shape of an issued key.
#[must_use]
pub fn is_well_formed(s: &str) -> bool {
    s.strip_prefix(KEY_PREFIX).is_some_and(|hex| {
        hex.len() == SECRET_HEX_LEN
            && hex
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    })
}
