use serde::{Deserialize, Serialize};
use validator::Validate;

/// What a caller gets back for every stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Base64UploadBody {
    #[validate(length(min = 1))]
    pub base64: String,
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteFileBody {
    #[validate(length(min = 1))]
    pub url: String,
}
