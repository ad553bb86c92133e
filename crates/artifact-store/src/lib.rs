//! Object storage for call recordings and archived reports.
//!
//! [`ArtifactStore`] wraps an [`object_store::ObjectStore`] (S3, local disk
//! or in-memory) behind the four operations the rest of the system needs:
//! put, delete, exists and public URL resolution.
//!
//! # Example
//!
//! ```no_run
//! use artifact_store::{ArtifactStore, StorageConfig};
//!
//! # async fn example() -> artifact_store::Result<()> {
//! let store = ArtifactStore::new(StorageConfig::from_env()?)?;
//!
//! let key = store.recording_key("call (1).mp4");
//! let url = store.put(&key, b"...".to_vec(), "video/mp4").await?;
//! println!("stored at {}", url);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod store;

pub use config::{StorageBackend, StorageConfig};
pub use error::{Result, StorageError};
pub use store::{clean_filename, ArtifactStore};
