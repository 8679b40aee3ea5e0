//! Command-line surface (external collaborator, §6).

pub mod commands;
pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Provider;

/// VaultKeep - client-side encrypted backup engine for untrusted object storage.
#[derive(Parser)]
#[command(name = "vaultkeep")]
#[command(version)]
#[command(about = "Store files in untrusted back-ends without revealing plaintext, paths, or attributes.")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "vaultkeep.conf")]
    pub config: PathBuf,

    /// Back-end transport to use for this invocation.
    #[arg(long, global = true, value_enum, default_value = "object-bucket")]
    pub provider: ProviderArg,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    #[value(name = "object-bucket")]
    ObjectBucket,
    #[value(name = "remote-file-server")]
    RemoteFileServer,
}

impl From<ProviderArg> for Provider {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::ObjectBucket => Provider::ObjectBucket,
            ProviderArg::RemoteFileServer => Provider::RemoteFileServer,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print Index rows for the current metadata back-end.
    List,

    /// Store a file or directory.
    Backup {
        /// Local file or directory to read.
        local: PathBuf,
        /// Logical path to store under (defaults to `local`).
        cloud: Option<String>,
    },

    /// Retrieve a single record or every record under a logical prefix.
    Restore {
        /// Exact logical path or directory prefix.
        cloud: String,
        /// Local destination (defaults to `cloud`).
        local: Option<PathBuf>,
    },

    /// Delete a single record or every record under a logical prefix.
    Remove {
        /// Exact logical path or directory prefix.
        cloud: String,
    },

    /// Rebuild the Index from the metadata bucket, then list.
    Sync,

    /// Diagnostic: enumerate raw keys in both buckets.
    ListCloudKeys,

    /// Diagnostic: enumerate raw blobs in both buckets.
    ListCloudData,
}
