use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Public URL prefix every stored resume is referenced by.
pub const PUBLIC_PREFIX: &str = "/uploads/applications/";

const ALLOWED_EXTENSIONS: [&str; 9] = ["pdf", "doc", "docx", "txt", "rtf", "jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub size: i64,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileStat {
    pub size: i64,
    pub content_type: String,
}

#[derive(Debug)]
pub struct OpenedFile {
    pub file: fs::File,
    pub stat: FileStat,
}

/// Flat store of uploaded resumes addressed by their public URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Validates and writes a new object under a generated name.
    async fn save(&self, original_name: &str, data: Bytes) -> Result<StoredFile>;

    async fn stat(&self, url: &str) -> Result<Option<FileStat>>;

    async fn open(&self, url: &str) -> Result<Option<OpenedFile>>;

    /// `Ok(false)` when the object was already absent.
    async fn delete(&self, url: &str) -> Result<bool>;
}

/// Extracts the stored name from a public URL. Anything that is not a single
/// plain path component under [`PUBLIC_PREFIX`] is refused.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let name = url.strip_prefix(PUBLIC_PREFIX)?;
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    valid.then_some(name)
}

pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn check_upload(ext: &str, data: &[u8]) -> Result<()> {
    if !ALLOWED_EXTENSIONS.contains(&ext) {
        return Err(Error::BadRequest(format!("File type .{} is not allowed", ext)));
    }
    if data.is_empty() {
        return Err(Error::BadRequest("Uploaded file is empty".into()));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".into()));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".into()));
    }
    Ok(())
}

/// Resumes kept as plain files in `<root>/applications`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(uploads_root: impl AsRef<Path>) -> Self {
        Self {
            dir: uploads_root.as_ref().join("applications"),
        }
    }

    fn path_for(&self, url: &str) -> Option<PathBuf> {
        file_name_from_url(url).map(|name| self.dir.join(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, original_name: &str, data: Bytes) -> Result<StoredFile> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        check_upload(&ext, &data)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create upload dir: {}", e)))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.dir.join(&file_name);

        // create_new: a generated name is never written twice
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", file_name, e)))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", file_name, e)))?;

        tracing::info!(file = %file_name, size = data.len(), "Stored resume upload");

        Ok(StoredFile {
            url: format!("{}{}", PUBLIC_PREFIX, file_name),
            content_type: content_type_for(&file_name),
            size: data.len() as i64,
            file_name,
        })
    }

    async fn stat(&self, url: &str) -> Result<Option<FileStat>> {
        let Some(path) = self.path_for(url) else {
            return Ok(None);
        };
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(FileStat {
                size: meta.len() as i64,
                content_type: content_type_for(url),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to inspect {}: {}", url, e))),
        }
    }

    async fn open(&self, url: &str) -> Result<Option<OpenedFile>> {
        let Some(stat) = self.stat(url).await? else {
            return Ok(None);
        };
        let Some(path) = self.path_for(url) else {
            return Ok(None);
        };
        match fs::File::open(&path).await {
            Ok(file) => Ok(Some(OpenedFile { file, stat })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to open {}: {}", url, e))),
        }
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        let Some(path) = self.path_for(url) else {
            return Ok(false);
        };
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %url, "Deleted resume file");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("Failed to delete {}: {}", url, e))),
        }
    }
}
