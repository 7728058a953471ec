//! Storage backend traits.

use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

use crate::{ContainerPath, DocPath, Error};

/// The uniform storage contract.
///
/// Content is opaque bytes at this level; nothing here parses JSON.  Paths arrive already
/// validated, so every implementation rejects malformed paths the same way.
///
/// Backends are shared between concurrently running handlers, so every operation takes `&self`
/// and implementations are `Send + Sync`.  There is no locking across operations: concurrent
/// writers to the same path race and the last write wins.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn Backend>`.
pub trait Backend: Send + Sync {
    /// True iff `path` resolves to a document.  Containers and missing paths are `false`, not
    /// errors.
    fn exists(&self, path: &DocPath) -> Result<bool, Error>;

    /// Read the content of a document.
    ///
    /// Fails with [`Error::NotFound`] when nothing, or a container, lives at `path`.
    fn get(&self, path: &DocPath) -> Result<Bytes, Error>;

    /// Create or overwrite a document.
    ///
    /// The last-modified time of the document strictly advances, even when the content is
    /// unchanged.
    fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error>;

    /// Remove a document, pruning containers that become empty when the backend is configured
    /// to do so.
    fn delete(&self, path: &DocPath) -> Result<(), Error>;

    /// Names of the documents directly inside a container, sorted.
    ///
    /// Fails with [`Error::NotFound`] when `path` is not an existing container.
    fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error>;

    fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error>;
}

/// What kind of entry [`FileBackend::list_types`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Document,
    Container,
}

/// Backends that can tell documents and containers apart when listing.
pub trait FileBackend: Backend {
    /// Names of the entries of `kind` directly inside a container, sorted.
    fn list_types(&self, path: &ContainerPath, kind: EntryKind) -> Result<Vec<String>, Error>;
}

// Blanket implementations for references and smart pointers

macro_rules! forward_backend {
    ($($wrapper:ty),*) => {
        $(
            impl<T: Backend + ?Sized> Backend for $wrapper {
                fn exists(&self, path: &DocPath) -> Result<bool, Error> {
                    (**self).exists(path)
                }

                fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
                    (**self).get(path)
                }

                fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
                    (**self).write(path, data)
                }

                fn delete(&self, path: &DocPath) -> Result<(), Error> {
                    (**self).delete(path)
                }

                fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
                    (**self).list(path)
                }

                fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
                    (**self).last_modified(path)
                }
            }

            impl<T: FileBackend + ?Sized> FileBackend for $wrapper {
                fn list_types(
                    &self,
                    path: &ContainerPath,
                    kind: EntryKind,
                ) -> Result<Vec<String>, Error> {
                    (**self).list_types(path, kind)
                }
            }
        )*
    };
}

forward_backend!(&T, Box<T>, Arc<T>);
