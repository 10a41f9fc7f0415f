use crate::api::error;

/// Durable home for stored files, addressed by `(folder, filename)`.
#[async_trait::async_trait]
pub trait FileStorage {
    async fn write(&self, folder: &str, filename: &str, bytes: &[u8])
        -> Result<(), error::SystemError>;

    async fn read(&self, folder: &str, filename: &str)
        -> Result<Option<Vec<u8>>, error::SystemError>;

    /// `Ok(false)` when there was nothing to remove.
    async fn remove(&self, folder: &str, filename: &str) -> Result<bool, error::SystemError>;
}
