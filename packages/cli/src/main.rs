use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value as JsonValue;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use docfs_cli::{default_config_path, execute, Cli, CliError, Config};
use docfs_json_store::{EncryptedBackend, FilesystemBackend, FilesystemOptions};

async fn run(cli: Cli) -> Result<Option<JsonValue>, CliError> {
    let config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let root = cli
        .root
        .or(config.root)
        .unwrap_or_else(|| PathBuf::from("."));
    let options = FilesystemOptions {
        create_dirs: cli.create_dirs || config.options.create_dirs,
        prune_empty_dirs: cli.prune_empty_dirs || config.options.prune_empty_dirs,
    };
    tracing::debug!("Opening {} with {:?}", root.display(), options);
    let backend = FilesystemBackend::new(root, options)?;

    match cli.passphrase {
        Some(passphrase) => {
            let backend = EncryptedBackend::new(backend, &passphrase);
            execute(Arc::new(backend), &cli.command).await
        }
        None => execute(Arc::new(backend), &cli.command).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(Some(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
