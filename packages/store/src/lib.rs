//! docfs-store: paths, errors and the storage backend contract.
//!
//! Everything at this level is bytes.  JSON decoding, merge patches and the concrete backends
//! live in `docfs-json-store`.
//!
//! # Example
//!
//! ```rust
//! use docfs_store::{Backend, ContainerPath, DocPath, Error};
//!
//! fn names(backend: &dyn Backend, dir: &str) -> Result<Vec<String>, Error> {
//!     backend.list(&ContainerPath::parse(dir)?)
//! }
//!
//! fn read(backend: &dyn Backend, path: &str) -> Result<bytes::Bytes, Error> {
//!     backend.get(&DocPath::parse(path)?)
//! }
//! ```

pub use bytes::Bytes;

mod backend;
mod error;
pub mod path;

pub use backend::{Backend, EntryKind, FileBackend};
pub use error::{Error, ErrorKind};
pub use path::{ContainerPath, DocPath, Error as PathError, DOCUMENT_SUFFIX};

#[cfg(any(test, feature = "test-utils"))]
pub mod trait_test_suite;
