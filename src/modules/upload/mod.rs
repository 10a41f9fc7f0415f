pub mod data_uri;
pub mod filename;
pub mod handle;
pub mod model;
pub mod route;
pub mod schema;
pub mod service;
pub mod storage;
pub mod storage_fs;
pub mod validation;

pub use model::{Rejection, UploadConfig};
pub use service::FileUploadService;
pub use storage::FileStorage;
pub use storage_fs::{ensure_layout, FsStorage};
