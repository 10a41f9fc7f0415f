use std::path::Path;
use uuid::Uuid;

const MAX_SEGMENT_LEN: usize = 64;
const MAX_FILENAME_LEN: usize = 255;

/// `<uuid-v4>.<ext>` using the extension of `original_name`, if it has a usable one.
pub fn generate_filename(original_name: &str) -> String {
    let extension =
        Path::new(original_name).extension().and_then(|ext| ext.to_str()).unwrap_or("");
    filename_with_extension(extension)
}

pub fn filename_with_extension(extension: &str) -> String {
    let id = Uuid::new_v4();
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        id.to_string()
    } else {
        format!("{}.{}", id, extension)
    }
}

/// A folder is a single path segment of ASCII letters, digits, `-` or `_`.
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder.len() <= MAX_SEGMENT_LEN
        && folder.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Stored names never start with a dot and never contain separators.
pub fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename.len() <= MAX_FILENAME_LEN
        && !filename.starts_with('.')
        && filename.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
