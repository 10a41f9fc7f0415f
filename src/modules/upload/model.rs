use std::path::PathBuf;

use crate::constants::Env;

/// A file part parsed out of a multipart request. Consumed once by the upload service.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub fieldname: String,
    pub original_name: String,
    pub encoding: String,
    pub mime_type: String,
    pub buffer: Vec<u8>,
    pub size: usize,
}

impl UploadedFile {
    pub fn new(
        fieldname: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        buffer: Vec<u8>,
    ) -> Self {
        let size = buffer.len();
        Self {
            fieldname: fieldname.into(),
            original_name: original_name.into(),
            encoding: "7bit".to_string(),
            mime_type: mime_type.into(),
            buffer,
            size,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }
}

/// Why an upload was refused before anything touched storage.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("unsupported type: {mime_type} is not an accepted image type")]
    UnsupportedType { mime_type: String },
    #[error("too large: {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    /// Size unknown: reading stopped once the limit was passed.
    #[error("too large: more than {max} bytes")]
    ExceedsLimit { max: usize },
    #[error("invalid format: expected data:image/<ext>;base64,<payload>")]
    InvalidDataUri,
    #[error("invalid folder: '{0}'")]
    InvalidFolder(String),
    #[error("too many files: at most {max} per request")]
    TooManyFiles { max: usize },
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::UnsupportedType { .. } => "unsupported_type",
            Rejection::TooLarge { .. } | Rejection::ExceedsLimit { .. } => "too_large",
            Rejection::InvalidDataUri => "invalid_format",
            Rejection::InvalidFolder(_) => "invalid_folder",
            Rejection::TooManyFiles { .. } => "too_many_files",
        }
    }
}

/// File upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub root: PathBuf,
    pub base_url: String,
    pub folders: Vec<String>,
    pub default_folder: String,
    pub max_file_size: usize,
    pub max_files: usize,
    pub allowed_mime_types: Vec<String>,
}

impl UploadConfig {
    pub fn with_root(root: impl Into<String>) -> Self {
        let root = root.into();
        Self { base_url: format!("/{}", root), root: PathBuf::from(root), ..Self::default() }
    }

    pub fn from_env(env: &Env) -> Self {
        Self {
            max_file_size: env.upload_max_file_size,
            max_files: env.upload_max_files,
            ..Self::with_root(env.upload_root.clone())
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            base_url: "/uploads".to_string(),
            folders: vec!["images".to_string(), "activities".to_string(), "plots".to_string()],
            default_folder: "images".to_string(),
            max_file_size: 5 * 1024 * 1024, // 5MB
            max_files: 10,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}
