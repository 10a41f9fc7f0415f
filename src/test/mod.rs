use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::modules::upload::{
    model::{UploadConfig, UploadedFile},
    service::FileUploadService,
    storage_fs::FsStorage,
};

pub fn upload_config(temp: &TempDir) -> UploadConfig {
    UploadConfig { root: temp.path().join("uploads"), ..UploadConfig::default() }
}

pub fn upload_service(temp: &TempDir) -> FileUploadService<FsStorage> {
    let config = upload_config(temp);
    FileUploadService::new(Arc::new(FsStorage::new(&config.root)), config)
}

pub fn png(name: &str, size: usize) -> UploadedFile {
    UploadedFile::new("file", name, "image/png", vec![0x89; size])
}

/// Every regular file below `dir`, recursively.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_in(&path));
        } else {
            files.push(path);
        }
    }
    files
}
