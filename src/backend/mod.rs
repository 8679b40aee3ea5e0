//! Back-end: a key-addressed blob store bound to a single bucket name (C3).

pub mod object_bucket;
pub mod remote_file_server;

use std::collections::HashMap;
use std::path::Path;

use crate::config::{Config, Provider};
use crate::error::VaultError;

pub use object_bucket::ObjectBucketBackend;
pub use remote_file_server::RemoteFileServerBackend;

/// Back-end-specific attributes surfaced only by the diagnostic listing
/// commands (`list-cloud-keys`).
#[derive(Debug, Clone)]
pub struct BlobAttrs {
    pub size: u64,
    pub last_modified: Option<String>,
}

/// A key-addressed blob store. `connect`/`disconnect` are idempotent scoped
/// session acquisition; `connect` on an already-open instance returns it.
pub trait Backend {
    fn connect(&mut self) -> Result<(), VaultError>;
    fn disconnect(&mut self) -> Result<(), VaultError>;

    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<(), VaultError>;
    fn store_from_filename(&mut self, key: &str, path: &Path) -> Result<(), VaultError> {
        let bytes = std::fs::read(path).map_err(|e| VaultError::backend(e.to_string()))?;
        self.store(key, &bytes)
    }

    /// Missing key yields a Back-end error distinguishable as "not found".
    fn retrieve(&mut self, key: &str) -> Result<Vec<u8>, VaultError>;
    fn retrieve_to_filename(&mut self, key: &str, path: &Path) -> Result<(), VaultError> {
        let bytes = self.retrieve(key)?;
        std::fs::write(path, bytes).map_err(|e| VaultError::backend(e.to_string()))
    }

    /// Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), VaultError>;

    fn list(&mut self) -> Result<HashMap<String, Vec<u8>>, VaultError>;
    fn list_keys(&mut self) -> Result<HashMap<String, BlobAttrs>, VaultError>;
}

/// The `back_end_id` stamped on every metadata record (spec.md §3):
/// identifies the metadata back-end instance, e.g.
/// `"amazon-s3-bucket:<name>"` or `"sftp-bucket:<name>"`.
pub fn metadata_back_end_id(config: &Config, provider: Provider) -> Result<String, VaultError> {
    match provider {
        Provider::ObjectBucket => {
            let cfg = config.object_bucket.as_ref().ok_or_else(|| {
                VaultError::config("object-bucket", "access_key", config.path.display().to_string())
            })?;
            Ok(format!("amazon-s3-bucket:{}", cfg.metadata_bucket))
        }
        Provider::RemoteFileServer => {
            let cfg = config.remote_file_server.as_ref().ok_or_else(|| {
                VaultError::config("remote-file-server", "host", config.path.display().to_string())
            })?;
            Ok(format!("sftp-bucket:{}", cfg.metadata_bucket))
        }
    }
}

/// Constructs the two (metadata, data) back-ends for the configured
/// provider, keyed on `--provider`.
pub fn build_backends(
    config: &Config,
    provider: Provider,
) -> Result<(Box<dyn Backend>, Box<dyn Backend>), VaultError> {
    match provider {
        Provider::ObjectBucket => {
            let cfg = config.object_bucket.as_ref().ok_or_else(|| {
                VaultError::config("object-bucket", "access_key", config.path.display().to_string())
            })?;
            let metadata = ObjectBucketBackend::new(cfg, &cfg.metadata_bucket)?;
            let data = ObjectBucketBackend::new(cfg, &cfg.data_bucket)?;
            Ok((Box::new(metadata), Box::new(data)))
        }
        Provider::RemoteFileServer => {
            let cfg = config.remote_file_server.as_ref().ok_or_else(|| {
                VaultError::config("remote-file-server", "host", config.path.display().to_string())
            })?;
            let metadata = RemoteFileServerBackend::new(cfg, &cfg.metadata_bucket)?;
            let data = RemoteFileServerBackend::new(cfg, &cfg.data_bucket)?;
            Ok((Box::new(metadata), Box::new(data)))
        }
    }
}
