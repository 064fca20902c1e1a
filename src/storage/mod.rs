mod buckets;
mod names;
mod objects;
mod path;

pub use buckets::BucketRegistry;
pub use names::{DEFAULT_REGION, validate_bucket_name};
pub use objects::{MAX_UPLOAD_SIZE, ObjectStore, UploadSession};
pub use path::{resolve, validate_file_name};
