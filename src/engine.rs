//! Engine: binds Hasher + Cipher + Back-end(×2) + Index (C5).
//!
//! Encodes the store/retrieve/delete/sync/list protocols and enforces the
//! dedup and integrity invariants I1–I5.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::backend::{self, Backend};
use crate::config::{Config, DataCipherKind, Provider};
use crate::crypto::{CipherPipeline, DataCipher, GpgCipher, HttpRemoteWorker, RemoteCipher, SymmetricCipher};
use crate::error::VaultError;
use crate::hash::{hash_bytes, hash_bytes_with_extra, hash_reader, hash_reader_with_extra};
use crate::index::{Index, MetadataRecord, RecordFilter, SqliteIndex, CURRENT_METADATA_VERSION};

/// POSIX-style attributes captured at backup time; zero when unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAttrs {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

/// Binds the back-end identifier, the metadata back-end, the data back-end
/// (implicitly carrying the chosen Cipher variant), and the local Index. No
/// hidden global state: every dependency is an explicit field.
pub struct Engine {
    back_end_id: String,
    metadata_backend: Box<dyn Backend>,
    data_backend: Box<dyn Backend>,
    metadata_cipher: Box<dyn DataCipher>,
    data_cipher: CipherPipeline,
    index: Box<dyn Index>,
}

impl Engine {
    /// `metadata_cipher` always encrypts metadata regardless of the chosen
    /// data pipeline (spec step 4.1.5); in production this is a `GpgCipher`.
    pub fn new(
        back_end_id: String,
        metadata_backend: Box<dyn Backend>,
        data_backend: Box<dyn Backend>,
        metadata_cipher: Box<dyn DataCipher>,
        data_cipher: CipherPipeline,
        index: Box<dyn Index>,
    ) -> Result<Self, VaultError> {
        let mut engine = Engine {
            back_end_id,
            metadata_backend,
            data_backend,
            metadata_cipher,
            data_cipher,
            index,
        };
        engine.metadata_backend.connect()?;
        engine.data_backend.connect()?;
        Ok(engine)
    }

    /// Wires an `Engine` from configuration: the two back-ends for
    /// `provider`, the `gpg` metadata cipher (always), the configured data
    /// cipher, and the on-disk `Index`. `back_end_id` identifies the
    /// metadata back-end instance per spec.md §3, e.g.
    /// `"amazon-s3-bucket:<bucket>"` or `"sftp-bucket:<bucket>"`.
    pub fn open(config: &Config, provider: Provider) -> Result<Self, VaultError> {
        config.require_provider(provider)?;

        let (metadata_backend, data_backend) = backend::build_backends(config, provider)?;
        let back_end_id = backend::metadata_back_end_id(config, provider)?;

        let metadata_cipher: Box<dyn DataCipher> =
            Box::new(GpgCipher::new(config.gnupg.recipients.clone(), config.gnupg.signer.clone()));

        let data_cipher = match config.data_cipher {
            DataCipherKind::Gpg => {
                CipherPipeline::Gpg(GpgCipher::new(config.gnupg.recipients.clone(), config.gnupg.signer.clone()))
            }
            DataCipherKind::Symmetric => CipherPipeline::Symmetric(SymmetricCipher::new()),
            DataCipherKind::Remote => {
                let worker_cfg = config.remote_worker.as_ref().ok_or_else(|| {
                    VaultError::config("remote-worker", "endpoint", config.path.display().to_string())
                })?;
                CipherPipeline::Remote(RemoteCipher::new(Box::new(HttpRemoteWorker::new(&worker_cfg.endpoint))))
            }
        };

        let index = Box::new(SqliteIndex::open(&config.database)?);

        Engine::new(back_end_id, metadata_backend, data_backend, metadata_cipher, data_cipher, index)
    }

    pub fn back_end_id(&self) -> &str {
        &self.back_end_id
    }

    fn encrypt_metadata_record(&self, record: &MetadataRecord) -> Result<Vec<u8>, VaultError> {
        let json = serde_json::to_vec(record)
            .map_err(|e| VaultError::metadata(format!("failed to serialize record: {e}"), record.entry_key.clone()))?;
        let mut out = Vec::new();
        self.metadata_cipher.encrypt(&mut Cursor::new(json), &mut out)?;
        Ok(out)
    }

    fn decrypt_metadata_record(&self, key: &str, bytes: &[u8]) -> Result<MetadataRecord, VaultError> {
        let mut plaintext = Vec::new();
        self.metadata_cipher
            .decrypt(&mut Cursor::new(bytes), &mut plaintext, None)
            .map_err(|e| VaultError::metadata(format!("undecryptable metadata object: {e}"), key.to_owned()))?;

        let record: MetadataRecord = serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::metadata(format!("corrupt metadata JSON: {e}"), key.to_owned()))?;

        if record.metadata_version != CURRENT_METADATA_VERSION {
            return Err(VaultError::metadata(
                format!("unsupported metadata_version {}", record.metadata_version),
                key.to_owned(),
            ));
        }
        Ok(record)
    }

    /// Shared by `store` and `store_from_filename` once `source`'s length,
    /// checksum, and entry_key are known. `source` is read at most once (for
    /// the fresh-ciphertext case) or not at all (dedup case); callers that
    /// need the reader positioned at the start of the plaintext are
    /// responsible for seeking it there first.
    #[instrument(skip(self, source, attrs))]
    fn store_stream(
        &mut self,
        source: &mut dyn Read,
        size: u64,
        checksum: &str,
        entry_key: &str,
        logical_path: &str,
        attrs: FileAttrs,
    ) -> Result<MetadataRecord, VaultError> {
        let dedup = self.index.find_one(&RecordFilter {
            back_end_id: Some(self.back_end_id.clone()),
            checksum: Some(checksum.to_owned()),
            ..Default::default()
        })?;

        let mut fresh_ciphertext: Option<Vec<u8>> = None;
        let (encryption_key, encrypted_size, encrypted_checksum) = if let Some(existing) = &dedup {
            debug!(checksum, "deduplicated onto existing data blob");
            (
                existing.encryption_key.clone(),
                existing.encrypted_size,
                existing.encrypted_checksum.clone(),
            )
        } else {
            let mut ciphertext = Vec::new();
            let output = self.data_cipher.encrypt(source, &mut ciphertext)?;
            let result = (output.encryption_key, output.encrypted_size, output.encrypted_checksum);
            fresh_ciphertext = Some(ciphertext);
            result
        };

        let name = logical_path
            .rsplit('/')
            .next()
            .unwrap_or(logical_path)
            .to_owned();

        let record = MetadataRecord {
            metadata_version: CURRENT_METADATA_VERSION,
            back_end_id: self.back_end_id.clone(),
            entry_key: entry_key.to_owned(),
            name,
            path: logical_path.to_owned(),
            size,
            mode: attrs.mode,
            uid: attrs.uid,
            gid: attrs.gid,
            atime: attrs.atime,
            mtime: attrs.mtime,
            ctime: attrs.ctime,
            checksum: checksum.to_owned(),
            encryption_key,
            encrypted_size,
            encrypted_checksum,
        };

        let encrypted_record = self.encrypt_metadata_record(&record)?;

        // Ordering rule: metadata before data. An orphan metadata object is
        // self-evident at sync time; an orphan data blob is merely wasted space.
        self.metadata_backend.store(entry_key, &encrypted_record)?;

        if let Some(ciphertext) = fresh_ciphertext {
            self.data_backend.store(checksum, &ciphertext)?;
        }

        self.index.upsert(&record)?;
        info!(entry_key, checksum, "stored record");
        Ok(record)
    }

    pub fn store(
        &mut self,
        plaintext: &[u8],
        logical_path: &str,
        attrs: FileAttrs,
    ) -> Result<MetadataRecord, VaultError> {
        let checksum = hash_bytes(plaintext);
        let entry_key = hash_bytes_with_extra(plaintext, logical_path.as_bytes());
        self.store_stream(
            &mut Cursor::new(plaintext),
            plaintext.len() as u64,
            &checksum,
            &entry_key,
            logical_path,
            attrs,
        )
    }

    /// Streams the file rather than materializing it: the checksum and
    /// entry_key are computed directly off the file handle with
    /// `hash_reader`/`hash_reader_with_extra`, and the cipher reads straight
    /// from the (rewound) file instead of from a plaintext buffer.
    #[cfg(unix)]
    pub fn store_from_filename(
        &mut self,
        local_path: &Path,
        logical_path: &str,
    ) -> Result<MetadataRecord, VaultError> {
        use std::io::{Seek, SeekFrom};
        use std::os::unix::fs::MetadataExt;

        let mut file = File::open(local_path)
            .map_err(|e| VaultError::input(format!("cannot open {}: {e}", local_path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|e| VaultError::input(format!("cannot stat {}: {e}", local_path.display())))?;

        let attrs = FileAttrs {
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            atime: metadata.atime(),
            mtime: metadata.mtime(),
            ctime: metadata.ctime(),
        };
        let size = metadata.len();

        let checksum = hash_reader(&mut file)
            .map_err(|e| VaultError::input(format!("cannot read {}: {e}", local_path.display())))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| VaultError::input(format!("cannot seek {}: {e}", local_path.display())))?;

        let entry_key = hash_reader_with_extra(&mut file, logical_path.as_bytes())
            .map_err(|e| VaultError::input(format!("cannot read {}: {e}", local_path.display())))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| VaultError::input(format!("cannot seek {}: {e}", local_path.display())))?;

        self.store_stream(&mut file, size, &checksum, &entry_key, logical_path, attrs)
    }

    #[instrument(skip(self))]
    pub fn retrieve(&mut self, record: &MetadataRecord) -> Result<Vec<u8>, VaultError> {
        let ciphertext = self.data_backend.retrieve(&record.checksum)?;

        let actual_encrypted_checksum = hash_bytes(&ciphertext);
        if actual_encrypted_checksum != record.encrypted_checksum {
            return Err(VaultError::data(
                "ciphertext checksum mismatch",
                record.checksum.clone(),
            ));
        }

        let mut plaintext = Vec::new();
        self.data_cipher.decrypt(
            &mut Cursor::new(ciphertext),
            &mut plaintext,
            record.encryption_key.as_deref(),
        )?;

        let actual_checksum = hash_bytes(&plaintext);
        if actual_checksum != record.checksum {
            return Err(VaultError::data(
                "plaintext checksum mismatch",
                record.checksum.clone(),
            ));
        }

        Ok(plaintext)
    }

    #[cfg(unix)]
    pub fn retrieve_to_filename(&mut self, record: &MetadataRecord, local_path: &Path) -> Result<(), VaultError> {
        use std::os::unix::fs::PermissionsExt;

        let plaintext = self.retrieve(record)?;

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VaultError::input(format!("cannot create {}: {e}", parent.display())))?;
        }

        // Stage into a tempfile so a later failure never leaves partial
        // plaintext at the user-visible destination.
        let staging_dir = local_path.parent().unwrap_or_else(|| Path::new("."));
        let mut staging = tempfile::Builder::new()
            .permissions(std::fs::Permissions::from_mode(0o600))
            .tempfile_in(staging_dir)
            .map_err(|e| VaultError::backend(format!("failed to create staging file: {e}")))?;

        use std::io::Write;
        staging
            .write_all(&plaintext)
            .map_err(|e| VaultError::backend(format!("failed writing staging file: {e}")))?;
        staging
            .flush()
            .map_err(|e| VaultError::backend(format!("failed flushing staging file: {e}")))?;

        staging
            .persist(local_path)
            .map_err(|e| VaultError::backend(format!("failed to finalize {}: {e}", local_path.display())))?;

        std::fs::set_permissions(local_path, std::fs::Permissions::from_mode(record.mode))
            .map_err(|e| VaultError::backend(format!("chmod failed: {e}")))?;

        filetime::set_file_times(
            local_path,
            filetime::FileTime::from_unix_time(record.atime, 0),
            filetime::FileTime::from_unix_time(record.mtime, 0),
        )
        .map_err(|e| VaultError::backend(format!("utimes failed: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, record: &MetadataRecord) -> Result<(), VaultError> {
        self.metadata_backend.delete(&record.entry_key)?;

        self.index.delete_by(&RecordFilter {
            back_end_id: Some(self.back_end_id.clone()),
            entry_key: Some(record.entry_key.clone()),
            ..Default::default()
        })?;

        let remaining = self.index.find(&RecordFilter {
            back_end_id: Some(self.back_end_id.clone()),
            checksum: Some(record.checksum.clone()),
            ..Default::default()
        })?;

        if remaining.is_empty() {
            self.data_backend.delete(&record.checksum)?;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub fn sync(&mut self) -> Result<(), VaultError> {
        self.index.drop(&RecordFilter {
            back_end_id: Some(self.back_end_id.clone()),
            ..Default::default()
        })?;

        let objects = self.metadata_backend.list()?;
        for (key, bytes) in objects {
            let record = self.decrypt_metadata_record(&key, &bytes)?;
            self.index.upsert(&record)?;
        }

        info!(back_end_id = %self.back_end_id, "sync complete");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<MetadataRecord>, VaultError> {
        self.index.list(&RecordFilter {
            back_end_id: Some(self.back_end_id.clone()),
            ..Default::default()
        })
    }

    pub fn find(&self, filter: &RecordFilter) -> Result<Vec<MetadataRecord>, VaultError> {
        let mut scoped = filter.clone();
        scoped.back_end_id = Some(self.back_end_id.clone());
        self.index.find(&scoped)
    }

    pub fn find_one(&self, filter: &RecordFilter) -> Result<Option<MetadataRecord>, VaultError> {
        let mut scoped = filter.clone();
        scoped.back_end_id = Some(self.back_end_id.clone());
        self.index.find_one(&scoped)
    }

    /// Diagnostic: raw keys (and back-end-specific attrs) in both buckets,
    /// bypassing the Index entirely. Backs `list-cloud-keys`.
    pub fn list_cloud_keys(
        &mut self,
    ) -> Result<(std::collections::HashMap<String, backend::BlobAttrs>, std::collections::HashMap<String, backend::BlobAttrs>), VaultError>
    {
        Ok((self.metadata_backend.list_keys()?, self.data_backend.list_keys()?))
    }

    /// Diagnostic: raw blobs in both buckets, bypassing decryption. Backs
    /// `list-cloud-data`.
    pub fn list_cloud_data(
        &mut self,
    ) -> Result<(std::collections::HashMap<String, Vec<u8>>, std::collections::HashMap<String, Vec<u8>>), VaultError>
    {
        Ok((self.metadata_backend.list()?, self.data_backend.list()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::symmetric::SymmetricCipher;
    use crate::index::SqliteIndex;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// An in-memory back-end test double, one instance per bucket.
    struct MemoryBackend {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        connected: bool,
    }

    impl MemoryBackend {
        fn new() -> Self {
            MemoryBackend { objects: Mutex::new(HashMap::new()), connected: false }
        }
    }

    impl Backend for MemoryBackend {
        fn connect(&mut self) -> Result<(), VaultError> {
            self.connected = true;
            Ok(())
        }
        fn disconnect(&mut self) -> Result<(), VaultError> {
            self.connected = false;
            Ok(())
        }
        fn store(&mut self, key: &str, bytes: &[u8]) -> Result<(), VaultError> {
            self.objects.lock().unwrap().insert(key.to_owned(), bytes.to_vec());
            Ok(())
        }
        fn retrieve(&mut self, key: &str) -> Result<Vec<u8>, VaultError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| VaultError::backend(format!("not found: {key}")))
        }
        fn delete(&mut self, key: &str) -> Result<(), VaultError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
        fn list(&mut self) -> Result<HashMap<String, Vec<u8>>, VaultError> {
            Ok(self.objects.lock().unwrap().clone())
        }
        fn list_keys(&mut self) -> Result<HashMap<String, crate::backend::BlobAttrs>, VaultError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), crate::backend::BlobAttrs { size: v.len() as u64, last_modified: None }))
                .collect())
        }
    }

    /// Stands in for the gpg pipeline in unit tests that exercise Engine
    /// orchestration (dedup, ordering, sync), not cipher correctness, which
    /// `crypto::gpg`/`crypto::symmetric` cover on their own.
    struct PassThroughCipher;

    impl DataCipher for PassThroughCipher {
        fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn std::io::Write) -> Result<crate::crypto::EncryptOutput, VaultError> {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).map_err(|e| VaultError::cipher(e.to_string()))?;
            writer.write_all(&bytes).map_err(|e| VaultError::cipher(e.to_string()))?;
            Ok(crate::crypto::EncryptOutput {
                encryption_key: None,
                encrypted_size: bytes.len() as u64,
                encrypted_checksum: hash_bytes(&bytes),
            })
        }

        fn decrypt(&self, reader: &mut dyn Read, writer: &mut dyn std::io::Write, _encryption_key: Option<&str>) -> Result<(), VaultError> {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).map_err(|e| VaultError::cipher(e.to_string()))?;
            writer.write_all(&bytes).map_err(|e| VaultError::cipher(e.to_string()))
        }
    }

    fn test_engine() -> Engine {
        Engine::new(
            "test-back-end".to_owned(),
            Box::new(MemoryBackend::new()),
            Box::new(MemoryBackend::new()),
            Box::new(PassThroughCipher),
            CipherPipeline::Symmetric(SymmetricCipher::new()),
            Box::new(SqliteIndex::in_memory().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn dedup_shares_one_data_blob_across_two_paths() {
        // This exercises the dedup-lookup and ordering logic directly
        // against the Index and a MemoryBackend, without touching gpg.
        let mut index = SqliteIndex::in_memory().unwrap();
        let cipher = SymmetricCipher::new();

        let plaintext = b"Dup";
        let checksum = hash_bytes(plaintext);

        let entry_key_a = hash_bytes_with_extra(plaintext, b"a/x.txt");
        let entry_key_b = hash_bytes_with_extra(plaintext, b"a/y.txt");
        assert_ne!(entry_key_a, entry_key_b);

        let mut ciphertext = Vec::new();
        let out = cipher.encrypt(&mut Cursor::new(plaintext), &mut ciphertext).unwrap();

        let record_a = MetadataRecord {
            metadata_version: 1,
            back_end_id: "be".into(),
            entry_key: entry_key_a,
            name: "x.txt".into(),
            path: "a/x.txt".into(),
            size: plaintext.len() as u64,
            mode: 0,
            uid: 0,
            gid: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            checksum: checksum.clone(),
            encryption_key: out.encryption_key.clone(),
            encrypted_size: out.encrypted_size,
            encrypted_checksum: out.encrypted_checksum.clone(),
        };
        let mut record_b = record_a.clone();
        record_b.entry_key = entry_key_b;
        record_b.path = "a/y.txt".into();
        record_b.name = "y.txt".into();

        index.upsert(&record_a).unwrap();
        index.upsert(&record_b).unwrap();

        let rows = index
            .list(&RecordFilter { back_end_id: Some("be".into()), ..Default::default() })
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].checksum, rows[1].checksum);
    }

    #[test]
    fn sync_rebuilds_index_from_metadata_backend() {
        let mut engine = test_engine();
        engine
            .store(b"hello world", "a/x.txt", FileAttrs::default())
            .unwrap();
        engine
            .store(b"goodbye world", "a/y.txt", FileAttrs::default())
            .unwrap();

        assert_eq!(engine.list().unwrap().len(), 2);

        engine.sync().unwrap();
        assert_eq!(engine.list().unwrap().len(), 2);
    }

    #[test]
    fn delete_removes_the_record_and_frees_unreferenced_data() {
        let mut engine = test_engine();
        let record = engine.store(b"only copy", "a/x.txt", FileAttrs::default()).unwrap();
        engine.delete(&record).unwrap();
        assert!(engine.list().unwrap().is_empty());
    }

    #[test]
    fn delete_keeps_shared_data_blob_alive_for_the_remaining_record() {
        let mut engine = test_engine();
        let record_a = engine.store(b"shared", "a/x.txt", FileAttrs::default()).unwrap();
        let record_b = engine.store(b"shared", "a/y.txt", FileAttrs::default()).unwrap();

        engine.delete(&record_a).unwrap();

        assert_eq!(engine.list().unwrap().len(), 1);
        assert_eq!(engine.retrieve(&record_b).unwrap(), b"shared");
    }

    /// P3: a corrupted ciphertext byte is caught before any plaintext is
    /// returned, tagged as a Data error.
    #[test]
    fn corrupted_ciphertext_fails_retrieve_with_a_data_error() {
        let mut engine = test_engine();
        let record = engine.store(b"trustworthy", "a/x.txt", FileAttrs::default()).unwrap();

        let mut corrupted = engine.data_backend.retrieve(&record.checksum).unwrap();
        corrupted[0] ^= 0xFF;
        engine.data_backend.store(&record.checksum, &corrupted).unwrap();

        let err = engine.retrieve(&record).unwrap_err();
        assert_eq!(err.kind(), "Data");
    }

    /// P4: sync is idempotent — running it twice in a row leaves the Index
    /// in the same state as running it once.
    #[test]
    fn sync_twice_in_a_row_is_idempotent() {
        let mut engine = test_engine();
        engine.store(b"hello world", "a/x.txt", FileAttrs::default()).unwrap();
        engine.store(b"goodbye world", "a/y.txt", FileAttrs::default()).unwrap();

        engine.sync().unwrap();
        let mut first = engine.list().unwrap();
        engine.sync().unwrap();
        let mut second = engine.list().unwrap();

        first.sort_by(|a, b| a.entry_key.cmp(&b.entry_key));
        second.sort_by(|a, b| a.entry_key.cmp(&b.entry_key));
        assert_eq!(first, second);
    }

    proptest::proptest! {
        /// P1: retrieve(store(p, q)) == p for arbitrary plaintext and path.
        #[test]
        fn round_trip_returns_the_original_bytes(
            plaintext in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..4096),
            logical_path in "[a-zA-Z0-9_/]{1,40}",
        ) {
            let mut engine = test_engine();
            let record = engine.store(&plaintext, &logical_path, FileAttrs::default()).unwrap();
            let retrieved = engine.retrieve(&record).unwrap();
            proptest::prop_assert_eq!(retrieved, plaintext);
        }

        /// P2: two stores of the same plaintext under different paths share
        /// one checksum, get distinct entry_keys, and only the first store
        /// touches the data backend.
        #[test]
        fn dedup_reuses_the_data_blob_across_paths(
            plaintext in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..4096),
            path_a in "[a-zA-Z0-9_/]{1,20}",
            path_b in "[a-zA-Z0-9_/]{1,20}",
        ) {
            proptest::prop_assume!(path_a != path_b);
            let mut engine = test_engine();

            let record_a = engine.store(&plaintext, &path_a, FileAttrs::default()).unwrap();
            let record_b = engine.store(&plaintext, &path_b, FileAttrs::default()).unwrap();

            proptest::prop_assert_eq!(&record_a.checksum, &record_b.checksum);
            proptest::prop_assert_ne!(&record_a.entry_key, &record_b.entry_key);
            proptest::prop_assert_eq!(engine.data_backend.list().unwrap().len(), 1);
        }

        /// P6: entry_key depends on both plaintext and path; changing either
        /// alone changes the entry_key.
        #[test]
        fn entry_key_depends_on_both_plaintext_and_path(
            plaintext_a in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256),
            plaintext_b in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256),
            path_a in "[a-zA-Z0-9_/]{1,20}",
            path_b in "[a-zA-Z0-9_/]{1,20}",
        ) {
            proptest::prop_assume!(plaintext_a != plaintext_b || path_a != path_b);

            let entry_key_a = hash_bytes_with_extra(&plaintext_a, path_a.as_bytes());
            let entry_key_b = hash_bytes_with_extra(&plaintext_b, path_b.as_bytes());

            proptest::prop_assert_ne!(entry_key_a, entry_key_b);
        }
    }
}
