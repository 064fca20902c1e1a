mod helpers;
mod key;
mod keystore;
mod middleware;

pub use helpers::{API_KEY_HEADER, extract_credential};
pub use key::{KEY_PREFIX, generate_secret, is_well_formed};
pub use keystore::KeyStore;
pub use middleware::{AuthError, RequireAuth};
