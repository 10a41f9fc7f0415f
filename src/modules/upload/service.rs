use std::sync::Arc;

use crate::api::error;
use crate::modules::upload::{
    data_uri,
    filename::{filename_with_extension, generate_filename, is_valid_filename, is_valid_folder},
    model::{Rejection, UploadConfig, UploadedFile},
    schema::UploadResult,
    storage::FileStorage,
};

#[derive(Clone)]
pub struct FileUploadService<S>
where
    S: FileStorage + Send + Sync,
{
    storage: Arc<S>,
    config: UploadConfig,
}

impl<S> FileUploadService<S>
where
    S: FileStorage + Send + Sync,
{
    pub fn new(storage: Arc<S>, config: UploadConfig) -> Self {
        log::info!("FileUploadService initialized with root {}", config.root.display());
        Self { storage, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn resolve_folder<'a>(&'a self, folder: Option<&'a str>) -> Result<&'a str, Rejection> {
        let folder = folder.unwrap_or(&self.config.default_folder);
        if !is_valid_folder(folder) {
            return Err(Rejection::InvalidFolder(folder.to_string()));
        }
        Ok(folder)
    }

    fn url_for(&self, folder: &str, filename: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, folder, filename)
    }

    /// Public URL back to `(folder, filename)`; `None` for anything outside the root.
    fn locate<'u>(&self, url: &'u str) -> Option<(&'u str, &'u str)> {
        let prefix = self.config.base_url.trim_matches('/');
        let relative = url.trim_start_matches('/').strip_prefix(prefix)?.strip_prefix('/')?;
        let (folder, filename) = relative.split_once('/')?;

        (is_valid_folder(folder) && is_valid_filename(filename)).then_some((folder, filename))
    }

    pub async fn upload_one(
        &self,
        file: UploadedFile,
        folder: Option<&str>,
    ) -> Result<UploadResult, error::SystemError> {
        log::debug!(
            "Received {} from field '{}' ({}, {})",
            file.original_name,
            file.fieldname,
            file.mime_type,
            file.encoding
        );
        self.config.validate(&file.mime_type, file.size)?;
        let folder = self.resolve_folder(folder)?;

        let filename = generate_filename(&file.original_name);
        self.storage.write(folder, &filename, &file.buffer).await?;
        log::info!("Stored {} as {}/{} ({} bytes)", file.original_name, folder, filename, file.size);

        Ok(UploadResult {
            url: self.url_for(folder, &filename),
            filename,
            original_name: file.original_name,
            size: file.size,
            mime_type: file.mime_type,
        })
    }

    /// Stores files one after another. The first failure aborts the batch and files
    /// already written stay on storage.
    pub async fn upload_many(
        &self,
        files: Vec<UploadedFile>,
        folder: Option<&str>,
    ) -> Result<Vec<UploadResult>, error::SystemError> {
        self.config.check_count(files.len())?;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.upload_one(file, folder).await?);
        }
        Ok(results)
    }

    pub async fn upload_base64(
        &self,
        input: &str,
        folder: Option<&str>,
    ) -> Result<UploadResult, error::SystemError> {
        let data = data_uri::parse(input)?;
        let size = data.bytes.len();
        self.config.validate(&data.mime_type, size)?;
        let folder = self.resolve_folder(folder)?;

        let filename = filename_with_extension(&data.extension);
        self.storage.write(folder, &filename, &data.bytes).await?;
        log::info!("Stored base64 payload as {}/{} ({} bytes)", folder, filename, size);

        Ok(UploadResult {
            url: self.url_for(folder, &filename),
            original_name: filename.clone(),
            filename,
            size,
            mime_type: data.mime_type,
        })
    }

    /// Never fails: unknown URLs and storage errors both come back as `false`.
    pub async fn delete(&self, url: &str) -> bool {
        let Some((folder, filename)) = self.locate(url) else {
            log::warn!("Refusing to delete {}: not a stored file URL", url);
            return false;
        };

        match self.storage.remove(folder, filename).await {
            Ok(true) => {
                log::info!("Deleted {}/{}", folder, filename);
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("Failed to delete {}: {:?}", url, e);
                false
            }
        }
    }

    pub async fn open(
        &self,
        folder: &str,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, error::SystemError> {
        if !is_valid_folder(folder) || !is_valid_filename(filename) {
            return Ok(None);
        }
        self.storage.read(folder, filename).await
    }
}
