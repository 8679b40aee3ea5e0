//! Object-bucket back-end: an S3-compatible cloud object service.
//!
//! `bucket_name` is namespaced by the access identifier and lowercased; the
//! bucket is created on first connect if absent.

use std::collections::HashMap;

use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use crate::config::ObjectBucketConfig;
use crate::error::VaultError;

use super::{Backend, BlobAttrs};

pub struct ObjectBucketBackend {
    bucket_name: String,
    credentials: Credentials,
    region: Region,
    bucket: Option<Box<Bucket>>,
}

impl ObjectBucketBackend {
    pub fn new(cfg: &ObjectBucketConfig, logical_bucket: &str) -> Result<Self, VaultError> {
        let bucket_name = format!("{}-{}", cfg.access_key, logical_bucket).to_lowercase();
        let credentials = Credentials::new(
            Some(&cfg.access_key),
            Some(cfg.secret_access_key.expose_secret()),
            None,
            None,
            None,
        )
        .map_err(|e| VaultError::backend(format!("bad object-bucket credentials: {e}")))?;

        Ok(ObjectBucketBackend {
            bucket_name,
            credentials,
            region: Region::Custom {
                region: "us-east-1".to_owned(),
                endpoint: "s3.amazonaws.com".to_owned(),
            },
            bucket: None,
        })
    }

    fn bucket(&mut self) -> Result<&Bucket, VaultError> {
        self.bucket
            .as_deref()
            .ok_or_else(|| VaultError::backend("object-bucket back-end is not connected"))
    }
}

impl Backend for ObjectBucketBackend {
    fn connect(&mut self) -> Result<(), VaultError> {
        if self.bucket.is_some() {
            return Ok(());
        }

        let bucket = Bucket::new(&self.bucket_name, self.region.clone(), self.credentials.clone())
            .map_err(|e| VaultError::backend(format!("failed to address bucket: {e}")))?;

        match bucket.head_object("/") {
            Ok(_) => {}
            Err(_) => {
                Bucket::create_with_path_style(
                    &self.bucket_name,
                    self.region.clone(),
                    self.credentials.clone(),
                    s3::bucket_ops::BucketConfiguration::default(),
                )
                .map_err(|e| VaultError::backend(format!("failed to create bucket: {e}")))?;
            }
        }

        self.bucket = Some(bucket);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), VaultError> {
        self.bucket = None;
        Ok(())
    }

    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<(), VaultError> {
        self.bucket()?
            .put_object(key, bytes)
            .map_err(|e| VaultError::backend(format!("put_object({key}) failed: {e}")))?;
        Ok(())
    }

    fn retrieve(&mut self, key: &str) -> Result<Vec<u8>, VaultError> {
        let response = self
            .bucket()?
            .get_object(key)
            .map_err(|e| VaultError::backend(format!("not found: {key}: {e}")))?;
        Ok(response.bytes().to_vec())
    }

    fn delete(&mut self, key: &str) -> Result<(), VaultError> {
        // S3's DELETE is idempotent: removing a missing key returns success,
        // not an error, so there is no "not found" case to special-case here
        // — any error is a genuine transport/auth failure and must propagate.
        self.bucket()?
            .delete_object(key)
            .map_err(|e| VaultError::backend(format!("delete_object({key}) failed: {e}")))?;
        Ok(())
    }

    fn list(&mut self) -> Result<HashMap<String, Vec<u8>>, VaultError> {
        let keys: Vec<String> = self
            .list_keys()?
            .into_keys()
            .collect();
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            let bytes = self.retrieve(&key)?;
            out.insert(key, bytes);
        }
        Ok(out)
    }

    fn list_keys(&mut self) -> Result<HashMap<String, BlobAttrs>, VaultError> {
        let listing = self
            .bucket()?
            .list("".to_owned(), None)
            .map_err(|e| VaultError::backend(format!("list failed: {e}")))?;

        let mut out = HashMap::new();
        for page in listing {
            for object in page.contents {
                out.insert(
                    object.key,
                    BlobAttrs {
                        size: object.size,
                        last_modified: Some(object.last_modified),
                    },
                );
            }
        }
        Ok(out)
    }
}
