#![allow(dead_code)]

mod test_server;

pub use test_server::{MASTER_KEY, MAX_UPLOAD_BYTES, TestServer};
