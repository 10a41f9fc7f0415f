use crate::modules::upload::model::{Rejection, UploadConfig};

impl UploadConfig {
    /// Checks MIME type against the allow-list, then size against the limit.
    pub fn validate(&self, mime_type: &str, size: usize) -> Result<(), Rejection> {
        if !self.allowed_mime_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(mime_type)) {
            return Err(Rejection::UnsupportedType { mime_type: mime_type.to_string() });
        }

        if size > self.max_file_size {
            return Err(Rejection::TooLarge { size, max: self.max_file_size });
        }

        Ok(())
    }

    pub fn check_count(&self, count: usize) -> Result<(), Rejection> {
        if count > self.max_files {
            return Err(Rejection::TooManyFiles { max: self.max_files });
        }
        Ok(())
    }
}
