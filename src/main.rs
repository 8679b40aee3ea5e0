// VaultKeep - client-side encrypted backup engine for untrusted object storage.
//
// Encrypts files before they ever reach a data or metadata bucket: the
// back-end operator sees only content-addressed ciphertext and encrypted
// sidecar metadata, never plaintext, path names, or file attributes.

mod backend;
mod cli;
mod config;
mod crypto;
mod engine;
mod error;
mod hash;
mod index;
mod secret;
mod walker;

use std::process;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use engine::Engine;
use error::VaultError;

/// Entry point.
///
/// Initializes logging from `--verbose`, loads configuration, builds the
/// `Engine` for the selected `--provider`, and dispatches to the requested
/// subcommand.
///
/// # Exit Codes
/// * 0 - Success
/// * 1 - Error (message printed to stderr with a `ERROR: <kind>: ...` tag)
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("{}", render_error(&err));
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// `true`/`false` mirror the CLI's own exit-code table (spec.md §6); `Err`
/// covers everything surfaced from the Engine or its collaborators.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = Config::load(&cli.config)
        .map_err(anyhow::Error::from)
        .map_err(|e| e.context(format!("loading configuration from {}", cli.config.display())))?;

    let mut engine = Engine::open(&config, cli.provider.into())?;

    match cli.command {
        Commands::List => {
            cli::commands::list(&engine, cli.verbose)?;
            Ok(true)
        }
        Commands::Backup { local, cloud } => cli::commands::backup(&mut engine, &local, cloud),
        Commands::Restore { cloud, local } => cli::commands::restore(&mut engine, &cloud, local),
        Commands::Remove { cloud } => cli::commands::remove(&mut engine, &cloud),
        Commands::Sync => {
            cli::commands::sync(&mut engine)?;
            Ok(true)
        }
        Commands::ListCloudKeys => {
            cli::commands::list_cloud_keys(&mut engine)?;
            Ok(true)
        }
        Commands::ListCloudData => {
            cli::commands::list_cloud_data(&mut engine)?;
            Ok(true)
        }
    }
}

/// Renders the spec.md §7 CLI error form: `ERROR: <kind>: <message>`, with a
/// `(key: <k>)` suffix when the underlying `VaultError` carries one.
/// Errors that never touched the core (bad CLI input, config load failure)
/// fall back to an `Input`-shaped message built from the anyhow chain.
fn render_error(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(vault_err) = cause.downcast_ref::<VaultError>() {
            return vault_err.to_string();
        }
    }
    format!("ERROR: Input: {err}")
}
