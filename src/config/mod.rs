mod server;

pub use server::{DEFAULT_MASTER_KEY, MASTER_KEY_ENV, ServerConfig};
