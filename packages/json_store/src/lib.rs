//! JSON document backends for docfs.
//!
//! [`FilesystemBackend`] and [`MemoryBackend`] implement the [`docfs_store::Backend`] contract.
//! [`EncryptedBackend`] wraps either one.  [`json_utils`] holds the merge-patch engine and
//! [`aggregate`] the concurrent container read.

pub mod aggregate;
pub mod encrypted;
pub mod in_memory;
pub mod json_utils;
pub mod local_disk;

pub use docfs_store::{
    Backend, ContainerPath, DocPath, EntryKind, Error, ErrorKind, FileBackend, PathError,
};

pub use aggregate::get_all;
pub use encrypted::EncryptedBackend;
pub use in_memory::{MemoryBackend, MemoryOptions};
pub use json_utils::{merge_patch, patch_document};
pub use local_disk::{FilesystemBackend, FilesystemOptions};
