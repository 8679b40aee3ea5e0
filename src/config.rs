//! Sectioned configuration file (general/gnupg/object-bucket/remote-file-server).

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::VaultError;
use crate::secret::SecretString;

/// Back-end transport selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Provider {
    ObjectBucket,
    RemoteFileServer,
}

#[derive(Debug, Clone)]
pub struct GnupgConfig {
    pub recipients: Vec<String>,
    pub signer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectBucketConfig {
    pub access_key: String,
    pub secret_access_key: SecretString,
    pub data_bucket: String,
    pub metadata_bucket: String,
}

#[derive(Debug, Clone)]
pub struct RemoteFileServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub identity_file: String,
    pub remote_directory: String,
    pub data_bucket: String,
    pub metadata_bucket: String,
}

/// The data pipeline selector (SPEC_FULL.md §4b). Metadata always uses
/// *gpg* regardless of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DataCipherKind {
    Gpg,
    Symmetric,
    Remote,
}

impl Default for DataCipherKind {
    fn default() -> Self {
        DataCipherKind::Gpg
    }
}

/// Configures the `remote` data-cipher pipeline: a synchronous HTTP
/// delegate standing in for the original's Celery worker.
#[derive(Debug, Clone)]
pub struct RemoteWorkerConfig {
    pub endpoint: String,
}

/// Configuration read once at startup; never watched for changes.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub database: String,
    pub data_cipher: DataCipherKind,
    pub gnupg: GnupgConfig,
    pub object_bucket: Option<ObjectBucketConfig>,
    pub remote_file_server: Option<RemoteFileServerConfig>,
    pub remote_worker: Option<RemoteWorkerConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        let path_str = path.display().to_string();
        let ini = Ini::load_from_file(path)
            .map_err(|_| VaultError::config("general", "database", &path_str))?;

        let general = section(&ini, "general", &path_str)?;
        let database = required(general, "general", "database", &path_str)?;
        let data_cipher = general
            .get("data_cipher")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<DataCipherKind>()
                    .map_err(|_| VaultError::config("general", "data_cipher", &path_str))
            })
            .transpose()?
            .unwrap_or_default();

        let gnupg_section = section(&ini, "gnupg", &path_str)?;
        let recipients = required(gnupg_section, "gnupg", "recipients", &path_str)?
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        let signer = gnupg_section
            .get("signer")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let object_bucket = ini
            .section(Some("object-bucket"))
            .map(|sec| {
                Ok::<_, VaultError>(ObjectBucketConfig {
                    access_key: required(sec, "object-bucket", "access_key", &path_str)?,
                    secret_access_key: SecretString::from_str(&required(
                        sec,
                        "object-bucket",
                        "secret_access_key",
                        &path_str,
                    )?),
                    data_bucket: required(sec, "object-bucket", "data_bucket", &path_str)?,
                    metadata_bucket: required(sec, "object-bucket", "metadata_bucket", &path_str)?,
                })
            })
            .transpose()?;

        let remote_file_server = ini
            .section(Some("remote-file-server"))
            .map(|sec| {
                Ok::<_, VaultError>(RemoteFileServerConfig {
                    host: required(sec, "remote-file-server", "host", &path_str)?,
                    port: required(sec, "remote-file-server", "port", &path_str)?
                        .parse()
                        .map_err(|_| {
                            VaultError::config("remote-file-server", "port", &path_str)
                        })?,
                    username: required(sec, "remote-file-server", "username", &path_str)?,
                    identity_file: required(
                        sec,
                        "remote-file-server",
                        "identity_file",
                        &path_str,
                    )?,
                    remote_directory: required(
                        sec,
                        "remote-file-server",
                        "remote_directory",
                        &path_str,
                    )?,
                    data_bucket: required(sec, "remote-file-server", "data_bucket", &path_str)?,
                    metadata_bucket: required(
                        sec,
                        "remote-file-server",
                        "metadata_bucket",
                        &path_str,
                    )?,
                })
            })
            .transpose()?;

        let remote_worker = ini
            .section(Some("remote-worker"))
            .map(|sec| {
                Ok::<_, VaultError>(RemoteWorkerConfig {
                    endpoint: required(sec, "remote-worker", "endpoint", &path_str)?,
                })
            })
            .transpose()?;

        Ok(Config {
            path: path.to_owned(),
            database,
            data_cipher,
            gnupg: GnupgConfig { recipients, signer },
            object_bucket,
            remote_file_server,
            remote_worker,
        })
    }

    /// Validates that the section required by `provider` is present,
    /// matching the original `Config.check()` behavior.
    pub fn require_provider(&self, provider: Provider) -> Result<(), VaultError> {
        let path_str = self.path.display().to_string();
        match provider {
            Provider::ObjectBucket if self.object_bucket.is_none() => {
                Err(VaultError::config("object-bucket", "access_key", &path_str))
            }
            Provider::RemoteFileServer if self.remote_file_server.is_none() => {
                Err(VaultError::config("remote-file-server", "host", &path_str))
            }
            _ => Ok(()),
        }
    }
}

fn section<'a>(ini: &'a Ini, name: &str, path: &str) -> Result<&'a ini::Properties, VaultError> {
    ini.section(Some(name))
        .ok_or_else(|| VaultError::config(name, "<section>", path))
}

fn required(
    props: &ini::Properties,
    section: &str,
    key: &str,
    path: &str,
) -> Result<String, VaultError> {
    props
        .get(key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| VaultError::config(section, key, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn loads_minimal_config() {
        let file = write_config(
            "[general]\ndatabase = sqlite:///tmp/vaultkeep.db\n\n[gnupg]\nrecipients = me@example.com\n",
        );
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.database, "sqlite:///tmp/vaultkeep.db");
        assert_eq!(cfg.gnupg.recipients, vec!["me@example.com".to_string()]);
        assert!(cfg.gnupg.signer.is_none());
    }

    #[test]
    fn missing_mandatory_key_is_a_config_error() {
        let file = write_config("[general]\n\n[gnupg]\nrecipients = me@example.com\n");
        let err = Config::load(file.path()).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn data_cipher_defaults_to_gpg() {
        let file = write_config(
            "[general]\ndatabase = sqlite:///tmp/vaultkeep.db\n\n[gnupg]\nrecipients = me@example.com\n",
        );
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.data_cipher, DataCipherKind::Gpg);
    }

    #[test]
    fn data_cipher_is_parsed_when_present() {
        let file = write_config(
            "[general]\ndatabase = sqlite:///tmp/vaultkeep.db\ndata_cipher = symmetric\n\n[gnupg]\nrecipients = me@example.com\n",
        );
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.data_cipher, DataCipherKind::Symmetric);
    }

    #[test]
    fn require_provider_checks_the_matching_section() {
        let file = write_config(
            "[general]\ndatabase = sqlite:///tmp/vaultkeep.db\n\n[gnupg]\nrecipients = me@example.com\n",
        );
        let cfg = Config::load(file.path()).unwrap();
        assert!(cfg.require_provider(Provider::ObjectBucket).is_err());
    }
}
