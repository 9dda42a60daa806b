//! File storage for SmartLMS
//!
//! Uploaded documents and images are written through [`object_store`] so the
//! same code runs against S3, a local directory, or memory in tests.
//!
//! Objects are addressed by a public URL of the form `{base_url}/{key}`;
//! deleting by URL strips the base again to recover the key.

pub mod api;
pub mod form;

use std::sync::Arc;

use chrono::Utc;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload,
    aws::AmazonS3Builder,
    local::LocalFileSystem,
    memory::InMemory,
    path::Path,
};

use crate::core::db::models::FileAttachment;

pub use api::{UploadApiState, upload_api_router};
pub use form::{FormData, FormFile};

const MEGABYTE: u64 = 1024 * 1024;

/// Images accepted on project and task forms
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage is not configured: {0}")]
    Config(String),

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),

    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Invalid object path: {0}")]
    Path(#[from] object_store::path::Error),
}

/// Which object store backs uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3 {
        bucket: String,
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        endpoint: Option<String>,
    },
    Local {
        root: String,
    },
    Memory,
}

/// Storage configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Prefix prepended to object keys to form public URLs
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// `STORAGE_BACKEND` selects `s3` (default when `AWS_S3_BUCKET_NAME` is set),
    /// `local` or `memory`.
    pub fn from_env() -> Result<Self, StorageError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let requested = var("STORAGE_BACKEND").map(|v| v.to_ascii_lowercase());
        let bucket = var("AWS_S3_BUCKET_NAME");

        let backend = match (requested.as_deref(), bucket) {
            (Some("memory"), _) => StorageBackend::Memory,
            (Some("local"), _) => StorageBackend::Local {
                root: var("STORAGE_LOCAL_DIR").unwrap_or_else(|| "./uploads".to_string()),
            },
            (Some("s3") | None, Some(bucket)) => StorageBackend::S3 {
                bucket,
                region: var("AWS_S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: var("AWS_S3_ACCESS_KEY_ID"),
                secret_access_key: var("AWS_S3_SECRET_ACCESS_KEY"),
                endpoint: var("AWS_S3_ENDPOINT"),
            },
            (Some("s3"), None) => {
                return Err(StorageError::Config(
                    "AWS_S3_BUCKET_NAME must be set for the s3 backend".to_string(),
                ));
            }
            (None, None) => StorageBackend::Local {
                root: var("STORAGE_LOCAL_DIR").unwrap_or_else(|| "./uploads".to_string()),
            },
            (Some(other), _) => {
                return Err(StorageError::Config(format!(
                    "unknown STORAGE_BACKEND '{}'",
                    other
                )));
            }
        };

        Ok(Self {
            backend,
            public_base_url: var("STORAGE_PUBLIC_BASE_URL"),
        })
    }

    fn base_url(&self) -> String {
        if let Some(url) = &self.public_base_url {
            return url.trim_end_matches('/').to_string();
        }
        match &self.backend {
            StorageBackend::S3 {
                bucket,
                endpoint: Some(endpoint),
                ..
            } => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            StorageBackend::S3 { bucket, region, .. } => {
                format!("https://{}.s3.{}.amazonaws.com", bucket, region)
            }
            StorageBackend::Local { .. } => "/uploads".to_string(),
            StorageBackend::Memory => "memory://uploads".to_string(),
        }
    }
}

/// Object storage handle shared by every upload path
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    base_url: String,
    /// LocalFileSystem rejects put attributes
    content_types: bool,
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("store", &self.store.to_string())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ObjectStorage {
    pub fn new(store: Arc<dyn ObjectStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            content_types: true,
        }
    }

    /// Build the configured backend
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let base_url = config.base_url();

        let storage = match &config.backend {
            StorageBackend::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_region(region);
                if let Some(key) = access_key_id {
                    builder = builder.with_access_key_id(key);
                }
                if let Some(secret) = secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                Self::new(Arc::new(builder.build()?), base_url)
            }
            StorageBackend::Local { root } => {
                std::fs::create_dir_all(root)
                    .map_err(|e| StorageError::Config(format!("{}: {}", root, e)))?;
                let store = LocalFileSystem::new_with_prefix(root)?;
                Self {
                    content_types: false,
                    ..Self::new(Arc::new(store), base_url)
                }
            }
            StorageBackend::Memory => Self::in_memory(),
        };

        tracing::info!("File storage ready: {:?}", storage);
        Ok(storage)
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory://uploads")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL for an object key
    pub fn url_for(&self, key: &Path) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Store `bytes` under `{folder}/{timestamp}-{name}` and describe the result
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
    ) -> Result<FileAttachment, StorageError> {
        let key = format!(
            "{}/{}-{}",
            folder.trim_matches('/'),
            Utc::now().timestamp_millis(),
            dash_whitespace(file_name)
        );
        let url = self.put(&key, bytes.clone(), file_name).await?;

        Ok(FileAttachment {
            url,
            name: file_name.to_string(),
            file_size: bytes.len() as i64,
        })
    }

    /// Store `bytes` under an exact key and return its public URL
    pub async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, StorageError> {
        let path = Path::from(key);

        let mut attributes = Attributes::new();
        if self.content_types {
            attributes.insert(Attribute::ContentType, content_type(file_name).into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&path, PutPayload::from(bytes), options)
            .await?;

        tracing::debug!("Stored object {}", path);
        Ok(self.url_for(&path))
    }

    /// Delete the object behind a public URL
    pub async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self.key_from_url(url)?;
        self.store.delete(&path).await?;
        tracing::debug!("Deleted object {}", path);
        Ok(())
    }

    /// Recover the object key from one of our URLs
    pub fn key_from_url(&self, url: &str) -> Result<Path, StorageError> {
        let key = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        Ok(Path::parse(key)?)
    }

    #[cfg(test)]
    pub(crate) async fn read(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.key_from_url(url)?;
        let bytes = self.store.get(&path).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn dash_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Lowercase extension of a file name, if any
pub fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// MIME type for a file name, by extension
pub fn content_type(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("txt") => "text/plain",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("zip") => "application/zip",
        Some("rar") => "application/x-rar-compressed",
        Some("7z") => "application/x-7z-compressed",
        _ => "application/octet-stream",
    }
}

/// Why an uploaded file was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("File {0} is empty")]
    Empty(String),

    #[error("File size must be less than {0}MB")]
    TooLarge(u64),

    #[error("File type not allowed. Allowed types: {0}")]
    TypeNotAllowed(String),
}

/// Check size and type of an upload; an empty `allowed_types` accepts any type
pub fn validate_file(
    file_name: &str,
    size: usize,
    max_mb: u64,
    allowed_types: &[&str],
) -> Result<(), FileRejection> {
    if size == 0 {
        return Err(FileRejection::Empty(file_name.to_string()));
    }
    if size as u64 > max_mb * MEGABYTE {
        return Err(FileRejection::TooLarge(max_mb));
    }
    if !allowed_types.is_empty() && !allowed_types.contains(&content_type(file_name)) {
        return Err(FileRejection::TypeNotAllowed(allowed_types.join(", ")));
    }
    Ok(())
}

/// Reduce a name to characters that are safe in an object key
pub fn safe_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            out.push(ch);
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}
