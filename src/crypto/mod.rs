//! Cipher: three interchangeable symmetric pipelines (C2).
//!
//! `gpg` wraps the hybrid public-key pipeline used for metadata (always) and
//! optionally for data; `symmetric` and `remote` share one wire format and
//! differ only in where the AES-256-CBC work happens.

pub mod gpg;
pub mod remote;
pub mod symmetric;

use std::io::{Read, Write};

use crate::error::VaultError;

pub use gpg::GpgCipher;
pub use remote::{HttpRemoteWorker, RemoteCipher, RemoteWorker};
pub use symmetric::SymmetricCipher;

/// Output of an encrypt operation: the random per-record key (null for
/// *gpg*) and the byte length / SHA-256 of the exact bytes written to the
/// data bucket.
pub struct EncryptOutput {
    pub encryption_key: Option<String>,
    pub encrypted_size: u64,
    pub encrypted_checksum: String,
}

/// Common streaming interface implemented by all three pipelines.
///
/// `encrypt` is a pure function of (plaintext, configuration); `decrypt`
/// inverts it and returns identical bytes on success.
pub trait DataCipher {
    fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<EncryptOutput, VaultError>;

    /// `encryption_key` is `None` for the *gpg* pipeline, `Some(token)` for
    /// *symmetric*/*remote*.
    fn decrypt(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        encryption_key: Option<&str>,
    ) -> Result<(), VaultError>;
}

/// The configured data-pipeline selector (SPEC_FULL.md §4b `general.data_cipher`).
/// Metadata always uses *gpg* regardless of this choice; this selector is
/// only consulted for the data bucket's blobs.
pub enum CipherPipeline {
    Gpg(GpgCipher),
    Symmetric(SymmetricCipher),
    Remote(RemoteCipher),
}

impl DataCipher for CipherPipeline {
    fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<EncryptOutput, VaultError> {
        match self {
            CipherPipeline::Gpg(c) => c.encrypt(reader, writer),
            CipherPipeline::Symmetric(c) => c.encrypt(reader, writer),
            CipherPipeline::Remote(c) => c.encrypt(reader, writer),
        }
    }

    fn decrypt(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        encryption_key: Option<&str>,
    ) -> Result<(), VaultError> {
        match self {
            CipherPipeline::Gpg(c) => c.decrypt(reader, writer, encryption_key),
            CipherPipeline::Symmetric(c) => c.decrypt(reader, writer, encryption_key),
            CipherPipeline::Remote(c) => c.decrypt(reader, writer, encryption_key),
        }
    }
}
