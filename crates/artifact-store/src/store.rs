//! The storage facade.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Result, StorageError};

const KEY_NONCE_LEN: usize = 8;

/// Object storage for recordings and reports.
#[derive(Clone)]
pub struct ArtifactStore {
    inner: Arc<dyn ObjectStore>,
    prefix: String,
    base_url: String,
    /// Local disk rejects object attributes, so content types are only sent
    /// to backends that keep them.
    content_type_attributes: bool,
}

impl ArtifactStore {
    /// Build a store for the configured backend.
    pub fn new(config: StorageConfig) -> Result<Self> {
        let (inner, default_base, content_type_attributes): (Arc<dyn ObjectStore>, String, bool) =
            match &config.backend {
                StorageBackend::S3 {
                    bucket,
                    region,
                    access_key_id,
                    secret_access_key,
                } => {
                    let mut builder = AmazonS3Builder::new()
                        .with_bucket_name(bucket)
                        .with_region(region);
                    if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
                        builder = builder
                            .with_access_key_id(key_id)
                            .with_secret_access_key(secret.expose_secret());
                    }
                    let base = if region == "us-east-1" {
                        format!("https://{}.s3.amazonaws.com", bucket)
                    } else {
                        format!("https://{}.s3.{}.amazonaws.com", bucket, region)
                    };
                    (Arc::new(builder.build()?), base, true)
                }
                StorageBackend::Local { root } => {
                    std::fs::create_dir_all(root).map_err(|e| {
                        StorageError::Config(format!("cannot create {}: {}", root.display(), e))
                    })?;
                    let root = std::fs::canonicalize(root).map_err(|e| {
                        StorageError::Config(format!("cannot resolve {}: {}", root.display(), e))
                    })?;
                    let base = format!("file://{}", root.display());
                    (Arc::new(LocalFileSystem::new_with_prefix(&root)?), base, false)
                }
                StorageBackend::Memory => {
                    (Arc::new(InMemory::new()), "memory://".to_string(), true)
                }
            };

        let base_url = config
            .public_url
            .clone()
            .unwrap_or(default_base)
            .trim_end_matches('/')
            .to_string();

        info!(backend = ?backend_name(&config.backend), base_url = %base_url, "Object storage ready");

        Ok(Self {
            inner,
            prefix: config.prefix,
            base_url,
            content_type_attributes,
        })
    }

    /// In-memory store with no prefix.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            prefix: String::new(),
            base_url: "memory://".to_string(),
            content_type_attributes: true,
        }
    }

    /// Store `data` under `key`, returning its URL.
    #[instrument(skip(self, data), fields(key = %key))]
    pub async fn put(
        &self,
        key: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<String> {
        let path = object_path(key)?;
        let data = data.into();
        let size = data.len();

        let mut options = PutOptions::default();
        if self.content_type_attributes {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            options.attributes = attributes;
        }

        self.inner
            .put_opts(&path, PutPayload::from(data), options)
            .await?;

        debug!(size, content_type, "Object stored");
        Ok(self.url_for(key))
    }

    /// Read an object back.
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = object_path(key)?;
        let bytes = self.inner.get(&path).await?.bytes().await?;
        Ok(bytes)
    }

    /// Delete an object. Returns `false` when there was nothing to delete.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        if !self.exists(key).await? {
            return Ok(false);
        }
        self.inner.delete(&object_path(key)?).await?;
        debug!("Object deleted");
        Ok(true)
    }

    /// Whether an object exists under `key`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = object_path(key)?;
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL of `key`.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    /// Key for an uploaded recording:
    /// `{prefix}YYYY/MM/DD/HHMMSS-{nonce}-{clean filename}`.
    pub fn recording_key(&self, filename: &str) -> String {
        format!("{}{}", self.prefix, stamped_name(filename))
    }

    /// Key for an archived report under `reports/`.
    pub fn report_key(&self, filename: &str) -> String {
        format!("{}reports/{}", self.prefix, stamped_name(filename))
    }
}

/// Same-second uploads of one filename differ by the random nonce.
fn stamped_name(filename: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().format("%Y/%m/%d/%H%M%S"),
        &nonce[..KEY_NONCE_LEN],
        clean_filename(filename)
    )
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("store", &self.inner.to_string())
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Make a client-supplied filename safe to embed in a key.
pub fn clean_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn object_path(key: &str) -> Result<Path> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "empty".to_string(),
        });
    }
    Path::parse(key).map_err(|e| StorageError::InvalidKey {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn backend_name(backend: &StorageBackend) -> &'static str {
    match backend {
        StorageBackend::S3 { .. } => "s3",
        StorageBackend::Local { .. } => "local",
        StorageBackend::Memory => "memory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("call recording (1).mp4"), "call_recording_1.mp4");
        assert_eq!(clean_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(clean_filename("   "), "file");
    }

    #[test]
    fn test_keys_are_timestamped_and_prefixed() {
        let store = ArtifactStore::new(StorageConfig::memory().with_prefix("recordings/")).unwrap();

        let key = store.recording_key("my call.mp4");
        assert!(key.starts_with("recordings/"));
        assert!(key.ends_with("-my_call.mp4"));
        // recordings/YYYY/MM/DD/HHMMSS-xxxxxxxx-my_call.mp4
        let middle = &key["recordings/".len()..key.len() - "-my_call.mp4".len()];
        let (stamp, nonce) = middle.rsplit_once('-').unwrap();
        assert_eq!(stamp.len(), "2025/01/01/120000".len());
        assert_eq!(stamp.matches('/').count(), 3);
        assert_eq!(nonce.len(), KEY_NONCE_LEN);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(store.report_key("r.pdf").starts_with("recordings/reports/"));
    }

    #[test]
    fn test_same_filename_gets_distinct_keys() {
        let store = ArtifactStore::in_memory();
        assert_ne!(store.recording_key("call.mp4"), store.recording_key("call.mp4"));
        assert_ne!(store.report_key("report.txt"), store.report_key("report.txt"));
    }

    #[test]
    fn test_s3_urls_follow_region() {
        let east = ArtifactStore::new(StorageConfig::new(StorageBackend::S3 {
            bucket: "claims".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
        }))
        .unwrap();
        assert_eq!(east.url_for("a/b.mp4"), "https://claims.s3.amazonaws.com/a/b.mp4");

        let west = ArtifactStore::new(StorageConfig::new(StorageBackend::S3 {
            bucket: "claims".to_string(),
            region: "us-west-2".to_string(),
            access_key_id: None,
            secret_access_key: None,
        }))
        .unwrap();
        assert_eq!(
            west.url_for("a/b.mp4"),
            "https://claims.s3.us-west-2.amazonaws.com/a/b.mp4"
        );
    }

    #[tokio::test]
    async fn test_memory_put_exists_delete() {
        let store = ArtifactStore::in_memory();

        assert!(!store.exists("a/b.mp4").await.unwrap());
        let url = store.put("a/b.mp4", b"video".to_vec(), "video/mp4").await.unwrap();
        assert_eq!(url, "memory:///a/b.mp4");
        assert!(store.exists("a/b.mp4").await.unwrap());
        assert_eq!(store.get("a/b.mp4").await.unwrap(), Bytes::from_static(b"video"));

        assert!(store.delete("a/b.mp4").await.unwrap());
        assert!(!store.delete("a/b.mp4").await.unwrap());
        assert!(!store.exists("a/b.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_backend_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("objects");
        let store = ArtifactStore::new(
            StorageConfig::new(StorageBackend::Local { root: root.clone() })
                .with_public_url("https://cdn.example.com/"),
        )
        .unwrap();

        let url = store
            .put("2025/01/01/120000-call.mp4", b"video".to_vec(), "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/2025/01/01/120000-call.mp4");
        assert!(root.join("2025/01/01/120000-call.mp4").exists());
        assert!(store.delete("2025/01/01/120000-call.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = ArtifactStore::in_memory();
        assert!(matches!(
            store.put("", b"x".to_vec(), "text/plain").await,
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
