//! Remote-file-server back-end: an SFTP directory under a configured root.
//!
//! `bucket_name` is a directory under the remote root; on first connect,
//! stat it and create it with mode 0o700 if absent.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::{Session, Sftp};

use crate::config::RemoteFileServerConfig;
use crate::error::VaultError;

use super::{Backend, BlobAttrs};

/// SFTP status code `LIBSSH2_FX_NO_SUCH_FILE`; distinguishes "key was
/// already absent" (not an error, spec.md §4.3) from a genuine transport or
/// permission failure.
const SFTP_NO_SUCH_FILE: i32 = 2;

fn is_sftp_not_found(err: &ssh2::Error) -> bool {
    matches!(err.code(), ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE))
}

pub struct RemoteFileServerBackend {
    host: String,
    port: u16,
    username: String,
    identity_file: String,
    directory: String,
    session: Option<Session>,
}

impl RemoteFileServerBackend {
    pub fn new(cfg: &RemoteFileServerConfig, logical_bucket: &str) -> Result<Self, VaultError> {
        Ok(RemoteFileServerBackend {
            host: cfg.host.clone(),
            port: cfg.port,
            username: cfg.username.clone(),
            identity_file: cfg.identity_file.clone(),
            directory: format!("{}/{}", cfg.remote_directory.trim_end_matches('/'), logical_bucket),
            session: None,
        })
    }

    fn sftp(&self) -> Result<Sftp, VaultError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| VaultError::backend("remote-file-server back-end is not connected"))?;
        session
            .sftp()
            .map_err(|e| VaultError::backend(format!("sftp channel failed: {e}")))
    }

    fn key_path(&self, key: &str) -> String {
        format!("{}/{key}", self.directory)
    }
}

impl Backend for RemoteFileServerBackend {
    fn connect(&mut self) -> Result<(), VaultError> {
        if self.session.is_some() {
            return Ok(());
        }

        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(|e| VaultError::backend(format!("tcp connect to {}:{} failed: {e}", self.host, self.port)))?;

        let mut session = Session::new()
            .map_err(|e| VaultError::backend(format!("ssh session init failed: {e}")))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| VaultError::backend(format!("ssh handshake failed: {e}")))?;
        session
            .userauth_pubkey_file(&self.username, None, Path::new(&self.identity_file), None)
            .map_err(|e| VaultError::backend(format!("ssh auth failed: {e}")))?;

        let sftp = session
            .sftp()
            .map_err(|e| VaultError::backend(format!("sftp channel failed: {e}")))?;
        if sftp.stat(Path::new(&self.directory)).is_err() {
            sftp.mkdir(Path::new(&self.directory), 0o700)
                .map_err(|e| VaultError::backend(format!("mkdir {} failed: {e}", self.directory)))?;
        }

        self.session = Some(session);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), VaultError> {
        self.session = None;
        Ok(())
    }

    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<(), VaultError> {
        let sftp = self.sftp()?;
        let mut file = sftp
            .create(Path::new(&self.key_path(key)))
            .map_err(|e| VaultError::backend(format!("create({key}) failed: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| VaultError::backend(format!("write({key}) failed: {e}")))
    }

    fn retrieve(&mut self, key: &str) -> Result<Vec<u8>, VaultError> {
        let sftp = self.sftp()?;
        let mut file = sftp
            .open(Path::new(&self.key_path(key)))
            .map_err(|e| VaultError::backend(format!("not found: {key}: {e}")))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| VaultError::backend(format!("read({key}) failed: {e}")))?;
        Ok(bytes)
    }

    fn delete(&mut self, key: &str) -> Result<(), VaultError> {
        let sftp = self.sftp()?;
        match sftp.unlink(Path::new(&self.key_path(key))) {
            Ok(_) => Ok(()),
            Err(e) if is_sftp_not_found(&e) => Ok(()),
            Err(e) => Err(VaultError::backend(format!("unlink({key}) failed: {e}"))),
        }
    }

    fn list(&mut self) -> Result<HashMap<String, Vec<u8>>, VaultError> {
        let keys: Vec<String> = self.list_keys()?.into_keys().collect();
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            let bytes = self.retrieve(&key)?;
            out.insert(key, bytes);
        }
        Ok(out)
    }

    fn list_keys(&mut self) -> Result<HashMap<String, BlobAttrs>, VaultError> {
        let sftp = self.sftp()?;
        let entries = sftp
            .readdir(Path::new(&self.directory))
            .map_err(|e| VaultError::backend(format!("readdir failed: {e}")))?;

        let mut out = HashMap::new();
        for (path, stat) in entries {
            if stat.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                out.insert(
                    name.to_owned(),
                    BlobAttrs {
                        size: stat.size.unwrap_or(0),
                        last_modified: stat.mtime.map(|t| t.to_string()),
                    },
                );
            }
        }
        Ok(out)
    }
}
