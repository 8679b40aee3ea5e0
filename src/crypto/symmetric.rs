//! Password-derived AES-256-CBC pipeline, base64-wrapped (C2b).

use std::io::{Read, Write};

use aes::Aes256;
use base64::Engine as _;
use block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::VaultError;
use crate::hash::hash_bytes;

use super::{DataCipher, EncryptOutput};

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const SALT_LEN: usize = 16;
const PASSWORD_LEN: usize = 32;

/// Iteratively derives `key ‖ iv` bytes: `D_i = SHA256(D_{i-1} ‖ password ‖ salt)`,
/// starting from the empty string, concatenated until long enough.
fn derive(password: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut out = Vec::with_capacity(KEY_LEN + IV_LEN + Sha256::output_size());
    let mut prev: Vec<u8> = Vec::new();
    while out.len() < KEY_LEN + IV_LEN {
        let mut hasher = Sha256::new();
        hasher.update(&prev);
        hasher.update(password);
        hasher.update(salt);
        let digest = hasher.finalize();
        out.extend_from_slice(&digest);
        prev = digest.to_vec();
    }
    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&out[..KEY_LEN]);
    iv.copy_from_slice(&out[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}

/// Password-derived AES-256-CBC; a fresh random password/salt pair is
/// generated per `encrypt` call and carried in the metadata record.
pub struct SymmetricCipher;

impl SymmetricCipher {
    pub fn new() -> Self {
        SymmetricCipher
    }
}

impl Default for SymmetricCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCipher for SymmetricCipher {
    fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<EncryptOutput, VaultError> {
        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        let mut password = [0u8; PASSWORD_LEN];
        rand::thread_rng().fill_bytes(&mut password);
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let (key, iv) = derive(&password, &salt);
        let ciphertext = Encryptor::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        let mut framed = Vec::with_capacity(SALT_LEN + ciphertext.len());
        framed.extend_from_slice(&salt);
        framed.extend_from_slice(&ciphertext);

        let encoded = base64::engine::general_purpose::STANDARD.encode(&framed);
        writer
            .write_all(encoded.as_bytes())
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        Ok(EncryptOutput {
            encryption_key: Some(hex::encode(password)),
            encrypted_size: encoded.len() as u64,
            encrypted_checksum: hash_bytes(encoded.as_bytes()),
        })
    }

    fn decrypt(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        encryption_key: Option<&str>,
    ) -> Result<(), VaultError> {
        let password_hex = encryption_key
            .ok_or_else(|| VaultError::cipher("symmetric decrypt requires an encryption_key"))?;
        let password = hex::decode(password_hex)
            .map_err(|e| VaultError::cipher(format!("malformed encryption_key: {e}")))?;

        let mut encoded = Vec::new();
        reader
            .read_to_end(&mut encoded)
            .map_err(|e| VaultError::cipher(e.to_string()))?;
        let framed = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| VaultError::cipher(format!("malformed ciphertext: {e}")))?;

        if framed.len() < SALT_LEN {
            return Err(VaultError::cipher("ciphertext shorter than the salt prefix"));
        }
        let (salt, ciphertext) = framed.split_at(SALT_LEN);
        let (key, iv) = derive(&password, salt);

        let plaintext = Decryptor::new(&key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| VaultError::cipher(format!("padding or key mismatch: {e}")))?;

        writer
            .write_all(&plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_arbitrary_plaintext() {
        let cipher = SymmetricCipher::new();
        let plaintext = b"This is my test data! This is my test data!\n".repeat(100);

        let mut ciphertext = Vec::new();
        let out = cipher
            .encrypt(&mut Cursor::new(&plaintext), &mut ciphertext)
            .unwrap();
        assert!(out.encryption_key.is_some());

        let mut decrypted = Vec::new();
        cipher
            .decrypt(
                &mut Cursor::new(&ciphertext),
                &mut decrypted,
                out.encryption_key.as_deref(),
            )
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let cipher = SymmetricCipher::new();
        let mut ciphertext = Vec::new();
        let out = cipher.encrypt(&mut Cursor::new(b""), &mut ciphertext).unwrap();

        let mut decrypted = Vec::new();
        cipher
            .decrypt(&mut Cursor::new(&ciphertext), &mut decrypted, out.encryption_key.as_deref())
            .unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let cipher = SymmetricCipher::new();
        let mut ciphertext = Vec::new();
        cipher.encrypt(&mut Cursor::new(b"secret"), &mut ciphertext).unwrap();

        let mut out = Vec::new();
        let wrong_key = hex::encode([0u8; PASSWORD_LEN]);
        assert!(cipher
            .decrypt(&mut Cursor::new(&ciphertext), &mut out, Some(&wrong_key))
            .is_err());
    }
}
