//! Command parsing and execution.
//!
//! Commands:
//! - `get <path>` - Print the document at path
//! - `put <path> <json>` - Create or replace a document
//! - `patch <path> <json>` - Merge a patch into a document and print the result
//! - `rm <path>` - Delete a document
//! - `ls [dir] [--without-extension]` - List the documents in a directory
//! - `dirs [dir]` - List the sub-directories of a directory
//! - `all [dir]` - Print every document in a directory as an array
//! - `exists <path>` - Print whether a document exists

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use http::StatusCode;
use serde_json::Value as JsonValue;

use docfs_http::{
    DocRequest, DocResponse, DocumentService, GET_ALL_SUFFIX, LIST_ALL_SUFFIX, LIST_DIR_SUFFIX,
    WITHOUT_EXTENSION_PARAM,
};
use docfs_store::FileBackend;

use crate::config::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Store error: {0}")]
    Store(#[from] docfs_store::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{status}: {message}")]
    Request { status: StatusCode, message: String },
}

/// docfs - read and write JSON documents in a directory tree
#[derive(Parser, Debug)]
#[command(name = "docfs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the documents (defaults to the config file, then ".")
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Create missing directories on write
    #[arg(long, global = true)]
    pub create_dirs: bool,

    /// Remove directories left empty by a delete
    #[arg(long, global = true)]
    pub prune_empty_dirs: bool,

    /// Encrypt documents at rest with this passphrase
    #[arg(long, global = true, env = "DOCFS_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the document at PATH
    Get { path: String },
    /// Create or replace the document at PATH
    Put { path: String, json: String },
    /// Merge JSON into the document at PATH and print the result
    Patch { path: String, json: String },
    /// Delete the document at PATH
    Rm { path: String },
    /// List the documents in DIR
    Ls {
        #[arg(default_value = "")]
        dir: String,
        /// Print names without the ".json" suffix
        #[arg(long)]
        without_extension: bool,
    },
    /// List the sub-directories of DIR
    Dirs {
        #[arg(default_value = "")]
        dir: String,
    },
    /// Print every document in DIR as one array
    All {
        #[arg(default_value = "")]
        dir: String,
    },
    /// Print whether a document exists at PATH
    Exists { path: String },
}

fn document_route(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

fn container_route(dir: &str, suffix: &str) -> String {
    let dir = dir.trim_matches('/');
    let name = suffix.trim_start_matches('/');
    if dir.is_empty() {
        format!("/{}", name)
    } else {
        format!("/{}/{}", dir, name)
    }
}

impl Command {
    pub fn to_request(&self) -> DocRequest {
        match self {
            Command::Get { path } => DocRequest::get(document_route(path)),
            Command::Put { path, json } => DocRequest::put(document_route(path), json.clone()),
            Command::Patch { path, json } => DocRequest::patch(document_route(path), json.clone()),
            Command::Rm { path } => DocRequest::delete(document_route(path)),
            Command::Ls {
                dir,
                without_extension,
            } => {
                let request = DocRequest::get(container_route(dir, LIST_ALL_SUFFIX));
                if *without_extension {
                    request.with_query(WITHOUT_EXTENSION_PARAM)
                } else {
                    request
                }
            }
            Command::Dirs { dir } => DocRequest::get(container_route(dir, LIST_DIR_SUFFIX)),
            Command::All { dir } => DocRequest::get(container_route(dir, GET_ALL_SUFFIX)),
            Command::Exists { path } => DocRequest::options(document_route(path)),
        }
    }
}

fn failure(response: DocResponse) -> CliError {
    CliError::Request {
        status: response.status,
        message: response
            .error_message()
            .unwrap_or_else(|| response.status.canonical_reason().unwrap_or("request failed"))
            .to_string(),
    }
}

/// Run one command against `backend`, returning what should be printed.
pub async fn execute<B>(backend: Arc<B>, command: &Command) -> Result<Option<JsonValue>, CliError>
where
    B: FileBackend + ?Sized + 'static,
{
    let service = DocumentService::new(backend)
        .with_get_all()
        .with_list_all()
        .with_list_dir();

    let response = service.handle(command.to_request()).await;

    match command {
        Command::Exists { .. } if response.status == StatusCode::NOT_FOUND => {
            Ok(Some(JsonValue::Bool(false)))
        }
        Command::Exists { .. } if response.is_success() => Ok(Some(JsonValue::Bool(true))),
        _ if response.is_success() => Ok(response.body),
        _ => Err(failure(response)),
    }
}
