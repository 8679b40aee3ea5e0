//! Delegated-worker pipeline (C2c). The worker runs the same base64-wrapped
//! AES-256-CBC pipeline elsewhere; the Engine treats it as an opaque,
//! synchronous request/response broker and blocks until completion.

use std::io::{Read, Write};

use crate::error::VaultError;
use crate::hash::hash_bytes;

use super::{DataCipher, EncryptOutput};

/// What the worker returns for an encrypt request.
pub struct WorkerEncryptResponse {
    pub encryption_key: String,
    pub ciphertext: Vec<u8>,
    /// The worker's self-reported checksum; the Engine never trusts this and
    /// always recomputes it from `ciphertext` before persisting anything.
    pub ciphertext_checksum: String,
}

/// What the worker returns for a decrypt request.
pub struct WorkerDecryptResponse {
    pub plaintext: Vec<u8>,
    pub plaintext_checksum: String,
}

/// A synchronous delegate: the same symmetric pipeline, running elsewhere.
/// Implementations may talk to a subprocess, a socket, or an in-process
/// stand-in for tests.
pub trait RemoteWorker: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<WorkerEncryptResponse, VaultError>;
    fn decrypt(&self, ciphertext: &[u8], encryption_key: &str) -> Result<WorkerDecryptResponse, VaultError>;
}

#[derive(serde::Deserialize)]
struct EncryptResponse {
    encryption_key: String,
    ciphertext_b64: String,
    ciphertext_checksum: String,
}

#[derive(serde::Serialize)]
struct DecryptRequest {
    ciphertext_b64: String,
    encryption_key: String,
}

#[derive(serde::Deserialize)]
struct DecryptResponse {
    plaintext_b64: String,
    plaintext_checksum: String,
}

/// Stands in for `cryptoengine/server.py`'s Celery worker: a synchronous
/// HTTP delegate that runs the same base64-wrapped AES-256-CBC pipeline on
/// a separate host. The Engine blocks on the request and never trusts the
/// worker's self-reported checksums.
pub struct HttpRemoteWorker {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpRemoteWorker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpRemoteWorker {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl RemoteWorker for HttpRemoteWorker {
    fn encrypt(&self, plaintext: &[u8]) -> Result<WorkerEncryptResponse, VaultError> {
        use base64::Engine as _;

        let body = serde_json::json!({
            "plaintext_b64": base64::engine::general_purpose::STANDARD.encode(plaintext),
        });

        let response: EncryptResponse = self
            .client
            .post(format!("{}/encrypt", self.endpoint))
            .json(&body)
            .send()
            .map_err(|e| VaultError::cipher(format!("remote worker request failed: {e}")))?
            .error_for_status()
            .map_err(|e| VaultError::cipher(format!("remote worker returned an error: {e}")))?
            .json()
            .map_err(|e| VaultError::cipher(format!("malformed remote worker response: {e}")))?;

        let ciphertext = base64::engine::general_purpose::STANDARD
            .decode(&response.ciphertext_b64)
            .map_err(|e| VaultError::cipher(format!("malformed remote worker ciphertext: {e}")))?;

        Ok(WorkerEncryptResponse {
            encryption_key: response.encryption_key,
            ciphertext,
            ciphertext_checksum: response.ciphertext_checksum,
        })
    }

    fn decrypt(&self, ciphertext: &[u8], encryption_key: &str) -> Result<WorkerDecryptResponse, VaultError> {
        use base64::Engine as _;

        let body = DecryptRequest {
            ciphertext_b64: base64::engine::general_purpose::STANDARD.encode(ciphertext),
            encryption_key: encryption_key.to_owned(),
        };

        let response: DecryptResponse = self
            .client
            .post(format!("{}/decrypt", self.endpoint))
            .json(&body)
            .send()
            .map_err(|e| VaultError::cipher(format!("remote worker request failed: {e}")))?
            .error_for_status()
            .map_err(|e| VaultError::cipher(format!("remote worker returned an error: {e}")))?
            .json()
            .map_err(|e| VaultError::cipher(format!("malformed remote worker response: {e}")))?;

        let plaintext = base64::engine::general_purpose::STANDARD
            .decode(&response.plaintext_b64)
            .map_err(|e| VaultError::cipher(format!("malformed remote worker plaintext: {e}")))?;

        Ok(WorkerDecryptResponse { plaintext, plaintext_checksum: response.plaintext_checksum })
    }
}

pub struct RemoteCipher {
    worker: Box<dyn RemoteWorker>,
}

impl RemoteCipher {
    pub fn new(worker: Box<dyn RemoteWorker>) -> Self {
        RemoteCipher { worker }
    }
}

impl DataCipher for RemoteCipher {
    fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<EncryptOutput, VaultError> {
        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        let response = self.worker.encrypt(&plaintext)?;

        writer
            .write_all(&response.ciphertext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        // Open question (SPEC_FULL.md §5): the worker's own checksum is not
        // trusted. Recompute over the exact bytes just written.
        Ok(EncryptOutput {
            encryption_key: Some(response.encryption_key),
            encrypted_size: response.ciphertext.len() as u64,
            encrypted_checksum: hash_bytes(&response.ciphertext),
        })
    }

    fn decrypt(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        encryption_key: Option<&str>,
    ) -> Result<(), VaultError> {
        let encryption_key = encryption_key
            .ok_or_else(|| VaultError::cipher("remote decrypt requires an encryption_key"))?;

        let mut ciphertext = Vec::new();
        reader
            .read_to_end(&mut ciphertext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        let response = self.worker.decrypt(&ciphertext, encryption_key)?;
        writer
            .write_all(&response.plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::symmetric::SymmetricCipher;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// A worker stand-in that runs the real symmetric pipeline in-process,
    /// for exercising the delegation contract without a subprocess.
    struct InlineWorker {
        inner: Mutex<SymmetricCipher>,
    }

    impl RemoteWorker for InlineWorker {
        fn encrypt(&self, plaintext: &[u8]) -> Result<WorkerEncryptResponse, VaultError> {
            let cipher = self.inner.lock().unwrap();
            let mut ciphertext = Vec::new();
            let out = cipher.encrypt(&mut Cursor::new(plaintext), &mut ciphertext)?;
            Ok(WorkerEncryptResponse {
                encryption_key: out.encryption_key.unwrap(),
                ciphertext,
                ciphertext_checksum: "lies".to_owned(),
            })
        }

        fn decrypt(&self, ciphertext: &[u8], encryption_key: &str) -> Result<WorkerDecryptResponse, VaultError> {
            let cipher = self.inner.lock().unwrap();
            let mut plaintext = Vec::new();
            cipher.decrypt(&mut Cursor::new(ciphertext), &mut plaintext, Some(encryption_key))?;
            let checksum = crate::hash::hash_bytes(&plaintext);
            Ok(WorkerDecryptResponse { plaintext, plaintext_checksum: checksum })
        }
    }

    #[test]
    fn engine_recomputes_checksum_rather_than_trusting_the_worker() {
        let cipher = RemoteCipher::new(Box::new(InlineWorker { inner: Mutex::new(SymmetricCipher::new()) }));
        let mut ciphertext = Vec::new();
        let out = cipher.encrypt(&mut Cursor::new(b"payload"), &mut ciphertext).unwrap();
        assert_ne!(out.encrypted_checksum, "lies");
        assert_eq!(out.encrypted_checksum, crate::hash::hash_bytes(&ciphertext));
    }

    #[test]
    fn round_trips_through_the_delegate() {
        let cipher = RemoteCipher::new(Box::new(InlineWorker { inner: Mutex::new(SymmetricCipher::new()) }));
        let mut ciphertext = Vec::new();
        let out = cipher.encrypt(&mut Cursor::new(b"round trip me"), &mut ciphertext).unwrap();

        let mut plaintext = Vec::new();
        cipher
            .decrypt(&mut Cursor::new(&ciphertext), &mut plaintext, out.encryption_key.as_deref())
            .unwrap();
        assert_eq!(plaintext, b"round trip me");
    }
}
