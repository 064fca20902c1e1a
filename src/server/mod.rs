pub mod dto;
mod keys;
pub mod response;
mod router;
mod storage;

pub use keys::keys_router;
pub use router::{AppState, create_router};
pub use storage::storage_router;
