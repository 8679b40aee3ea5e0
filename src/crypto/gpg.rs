//! OpenPGP hybrid pipeline via the external `gpg` binary and its keyring/agent.
//!
//! There is no maintained OpenPGP crate; this mirrors the original tool's use
//! of a `gpg` wrapper library, which itself shells out to the same binary.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use crate::error::VaultError;
use crate::hash::hash_bytes;

use super::{DataCipher, EncryptOutput};

/// Constructed once and shared by the Engine; holds the recipient/signer
/// identities resolved from configuration (no module-level global state).
pub struct GpgCipher {
    gpg_binary: String,
    recipients: Vec<String>,
    signer: Option<String>,
}

impl GpgCipher {
    pub fn new(recipients: Vec<String>, signer: Option<String>) -> Self {
        GpgCipher {
            gpg_binary: "gpg".to_owned(),
            recipients,
            signer,
        }
    }

    fn run(&self, args: &[&str], input: &[u8]) -> Result<Vec<u8>, VaultError> {
        let mut child = Command::new(&self.gpg_binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VaultError::cipher(format!("failed to spawn gpg: {e}")))?;

        let mut stdin = child.stdin.take().expect("piped stdin");

        // gpg starts writing to stdout before it has finished reading stdin;
        // once both OS pipe buffers fill, a single-threaded write-then-wait
        // deadlocks. Write on a separate thread while this thread blocks on
        // `wait_with_output`, which drains stdout/stderr concurrently.
        let writer = std::thread::scope(|scope| {
            let handle = scope.spawn(move || stdin.write_all(input));

            let output = child
                .wait_with_output()
                .map_err(|e| VaultError::cipher(format!("failed waiting on gpg: {e}")))?;

            let write_result = handle.join().map_err(|_| VaultError::cipher("gpg stdin writer thread panicked"))?;
            write_result.map_err(|e| VaultError::cipher(format!("failed writing to gpg stdin: {e}")))?;

            Ok::<_, VaultError>(output)
        })?;

        if !writer.status.success() {
            let status_fd = String::from_utf8_lossy(&writer.stderr).trim().to_owned();
            return Err(VaultError::cipher(format!(
                "gpg exited with {}: {status_fd}",
                writer.status
            )));
        }

        Ok(writer.stdout)
    }
}

impl DataCipher for GpgCipher {
    fn encrypt(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<EncryptOutput, VaultError> {
        if self.recipients.is_empty() {
            return Err(VaultError::cipher("gpg pipeline requires at least one recipient"));
        }

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        let mut args = vec!["--batch", "--yes", "--trust-model", "always", "--encrypt"];
        for recipient in &self.recipients {
            args.push("--recipient");
            args.push(recipient.as_str());
        }
        if let Some(signer) = &self.signer {
            args.push("--sign");
            args.push("--local-user");
            args.push(signer.as_str());
        }

        let ciphertext = self.run(&args, &plaintext)?;
        writer
            .write_all(&ciphertext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        Ok(EncryptOutput {
            encryption_key: None,
            encrypted_size: ciphertext.len() as u64,
            encrypted_checksum: hash_bytes(&ciphertext),
        })
    }

    fn decrypt(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        _encryption_key: Option<&str>,
    ) -> Result<(), VaultError> {
        let mut ciphertext = Vec::new();
        reader
            .read_to_end(&mut ciphertext)
            .map_err(|e| VaultError::cipher(e.to_string()))?;

        let args = ["--batch", "--yes", "--decrypt"];
        let plaintext = self.run(&args, &ciphertext)?;
        writer
            .write_all(&plaintext)
            .map_err(|e| VaultError::cipher(e.to_string()))
    }
}
