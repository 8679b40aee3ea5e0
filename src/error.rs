//! The single error type threaded through every core component.

use thiserror::Error;

/// Errors surfaced by the Hasher, Cipher, Back-end, Index, and Engine.
///
/// `Display` renders the CLI-facing form: `ERROR: <kind>: <message>`, with a
/// `(key: <k>)` suffix for the two variants that carry an offending key.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("ERROR: Config: missing `{key}` in section [{section}] of {path}")]
    Config {
        section: String,
        key: String,
        path: String,
    },

    #[error("ERROR: Backend: {message}")]
    Backend { message: String },

    #[error("ERROR: Cipher: {message}")]
    Cipher { message: String },

    #[error("ERROR: Metadata: {message} (key: {key})")]
    Metadata { message: String, key: String },

    #[error("ERROR: Data: {message} (key: {key})")]
    Data { message: String, key: String },

    #[error("ERROR: Input: {message}")]
    Input { message: String },
}

impl VaultError {
    pub fn config(section: impl Into<String>, key: impl Into<String>, path: impl Into<String>) -> Self {
        VaultError::Config {
            section: section.into(),
            key: key.into(),
            path: path.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        VaultError::Backend { message: message.into() }
    }

    pub fn cipher(message: impl Into<String>) -> Self {
        VaultError::Cipher { message: message.into() }
    }

    pub fn metadata(message: impl Into<String>, key: impl Into<String>) -> Self {
        VaultError::Metadata { message: message.into(), key: key.into() }
    }

    pub fn data(message: impl Into<String>, key: impl Into<String>) -> Self {
        VaultError::Data { message: message.into(), key: key.into() }
    }

    pub fn input(message: impl Into<String>) -> Self {
        VaultError::Input { message: message.into() }
    }

    /// The kind tag used in CLI output and tracing fields, e.g. `Config`, `Backend`.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::Config { .. } => "Config",
            VaultError::Backend { .. } => "Backend",
            VaultError::Cipher { .. } => "Cipher",
            VaultError::Metadata { .. } => "Metadata",
            VaultError::Data { .. } => "Data",
            VaultError::Input { .. } => "Input",
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::backend(err.to_string())
    }
}
