//! # docfs-cli
//!
//! One-shot command-line access to a docfs document tree.
//!
//! Every command is turned into a document request and dispatched through
//! [`docfs_http::DocumentService`], so the CLI sees exactly the status codes and error bodies a
//! networked client would.
//!
//! ## Usage
//!
//! ```bash
//! docfs --root ~/docs --create-dirs put users/alice.json '{"name": "Alice"}'
//! docfs --root ~/docs patch users/alice.json '{"email": "alice@example.com"}'
//! docfs --root ~/docs all users
//! DOCFS_PASSPHRASE=hunter2 docfs --root ~/vault get secrets.json
//! ```

pub mod commands;
pub mod config;

pub use commands::{execute, Cli, CliError, Command};
pub use config::{default_config_path, Config, ConfigError};
