//! Streaming SHA-256 (C1).
//!
//! Used for plaintext checksums, ciphertext checksums, and the entry-key
//! fold of plaintext bytes with a logical path (I1).

use std::io::{self, Read};

use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 64 * 1024;

/// Hashes a reader to completion, returning the lowercase hex digest.
pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hashes a byte slice, returning the lowercase hex digest.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hashes a reader followed by extra trailing bytes folded into the same
/// digest, without materializing the reader's contents. Used to compute
/// `entry_key = SHA256(plaintext ‖ path_bytes)` while streaming plaintext.
pub fn hash_reader_with_extra<R: Read>(reader: &mut R, extra: &[u8]) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    hasher.update(extra);
    Ok(hex::encode(hasher.finalize()))
}

/// Hashes a byte slice followed by extra trailing bytes in the same digest.
pub fn hash_bytes_with_extra(bytes: &[u8], extra: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update(extra);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn reader_and_slice_agree() {
        let data = b"vaultkeep";
        let mut cursor = std::io::Cursor::new(data);
        assert_eq!(hash_reader(&mut cursor).unwrap(), hash_bytes(data));
    }

    #[test]
    fn extra_bytes_change_the_digest() {
        let data = b"same plaintext";
        let a = hash_bytes_with_extra(data, b"path/a");
        let b = hash_bytes_with_extra(data, b"path/b");
        assert_ne!(a, b);
    }
}
