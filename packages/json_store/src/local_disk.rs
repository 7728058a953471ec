use std::io::Write;
use std::time::{Duration, SystemTime};
use std::{ffi, fmt, fs, io, path};

use bytes::Bytes;
use serde::Deserialize;

use docfs_store::{Backend, ContainerPath, DocPath, EntryKind, Error, FileBackend};

/// Smallest step used to push a file's mtime past its previous value.
const MTIME_STEP: Duration = Duration::from_micros(1);

/// Construction options for [`FilesystemBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilesystemOptions {
    /// Create missing parent directories on write.
    pub create_dirs: bool,
    /// Remove directories left empty by a delete, walking up toward (never including) the root.
    pub prune_empty_dirs: bool,
}

impl FilesystemOptions {
    #[must_use]
    pub fn with_create_dirs(mut self) -> Self {
        self.create_dirs = true;
        self
    }

    #[must_use]
    pub fn with_prune_empty_dirs(mut self) -> Self {
        self.prune_empty_dirs = true;
        self
    }
}

/// A backend mapping every document path onto a file below a root directory.
///
/// Containers are plain directories.  Only files carrying the `.json` suffix are listed as
/// documents; anything else found on disk is left alone.
///
/// The pruning walk performed by [`Backend::delete`] re-checks emptiness without holding any
/// lock, so it can remove a directory another writer has just created and is about to fill.
/// That writer then fails with `NotFound` (or recreates the directory when `create_dirs` is
/// set).
pub struct FilesystemBackend {
    root: path::PathBuf,
    options: FilesystemOptions,
}

impl FilesystemBackend {
    /// Open the document tree at `root`, which must be an existing, writable directory.
    pub fn new(root: path::PathBuf, options: FilesystemOptions) -> Result<Self, Error> {
        let invalid = |path: &path::Path, error: io::Error| Error::RootPathInvalid {
            path: path.to_path_buf(),
            error,
        };

        let canonical = root.canonicalize().map_err(|error| invalid(&root, error))?;
        let attr = fs::metadata(&canonical).map_err(|error| invalid(&root, error))?;
        let problem = if !attr.is_dir() {
            Some("is not a directory")
        } else if attr.permissions().readonly() {
            Some("is read-only")
        } else {
            None
        };
        if let Some(problem) = problem {
            let message = format!("document root {}", problem);
            return Err(invalid(&root, io::Error::other(message)));
        }

        tracing::debug!("Opened document root {} ({:?})", canonical.display(), options);
        Ok(FilesystemBackend {
            root: canonical,
            options,
        })
    }

    pub fn root(&self) -> &path::Path {
        &self.root
    }

    pub fn options(&self) -> FilesystemOptions {
        self.options
    }

    fn file_path<'a>(&self, components: impl IntoIterator<Item = &'a String>) -> path::PathBuf {
        self.root
            .components()
            .chain(
                components
                    .into_iter()
                    .map(|s| path::Component::Normal(ffi::OsStr::new(s))),
            )
            .collect()
    }

    /// Makes sure every ancestor of `path` is a directory, creating missing ones if allowed.
    ///
    /// A file standing where a directory is needed is reported rather than replaced.
    fn prepare_parent(&self, path: &DocPath) -> Result<(), Error> {
        let mut dir = self.root.clone();
        for component in path.parent().iter() {
            dir.push(component);
            match fs::metadata(&dir) {
                Ok(attr) if attr.is_dir() => continue,
                Ok(_) => {
                    return Err(Error::NotAContainer {
                        path: path.to_string(),
                    })
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    if !self.options.create_dirs {
                        return Err(Error::not_found(path.parent()));
                    }
                    tracing::debug!("Creating directory {}...", dir.display());
                    match fs::create_dir(&dir) {
                        Ok(()) => {}
                        // Lost a race with another writer creating the same directory.
                        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
                        Err(err) => return Err(classify_write_error(err, path)),
                    }
                }
                Err(err) => return Err(classify_write_error(err, path)),
            }
        }
        Ok(())
    }

    /// Metadata of the file holding a document; containers and missing entries are `NotFound`.
    fn document_metadata(&self, path: &DocPath) -> Result<fs::Metadata, Error> {
        let attr = fs::metadata(self.file_path(path.iter()))
            .map_err(|err| classify_read_error(err, path))?;
        if attr.is_dir() {
            return Err(Error::not_found(path));
        }
        Ok(attr)
    }

    fn read_entries(&self, path: &ContainerPath) -> Result<Vec<walkdir::DirEntry>, Error> {
        let dir = self.file_path(path.iter());
        let attr = fs::metadata(&dir).map_err(|err| classify_read_error(err, path))?;
        if !attr.is_dir() {
            return Err(Error::not_found(path));
        }

        walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map_err(|err| Error::Io(err.into())))
            .collect()
    }

    /// True if anything other than a directory lives below `dir`.
    fn holds_documents(dir: &path::Path) -> bool {
        walkdir::WalkDir::new(dir)
            .min_depth(1)
            .into_iter()
            .any(|entry| entry.map_or(true, |entry| !entry.file_type().is_dir()))
    }

    fn prune_empty_parents(&self, mut dir: Option<&path::Path>) -> Result<(), Error> {
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            match fs::remove_dir(current) {
                Ok(()) => tracing::debug!("Pruned empty directory {}", current.display()),
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::DirectoryNotEmpty | io::ErrorKind::NotFound
                    ) =>
                {
                    break
                }
                Err(err) => return Err(Error::Io(err)),
            }
            dir = current.parent();
        }
        Ok(())
    }
}

/// The entry's name, or `None` (logged) when it is not valid UTF-8 and so cannot be addressed.
fn entry_name(entry: walkdir::DirEntry) -> Option<String> {
    match entry.file_name().to_str() {
        Some(name) => Some(name.to_owned()),
        None => {
            tracing::debug!("Skipping non UTF-8 entry {}", entry.path().display());
            None
        }
    }
}

fn classify_read_error(err: io::Error, path: &impl fmt::Display) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Error::not_found(path),
        _ => Error::Io(err),
    }
}

fn classify_write_error(err: io::Error, path: &impl fmt::Display) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::not_found(path),
        io::ErrorKind::NotADirectory => Error::NotAContainer {
            path: path.to_string(),
        },
        io::ErrorKind::IsADirectory => Error::IsContainer {
            path: path.to_string(),
        },
        _ => Error::Io(err),
    }
}

impl Backend for FilesystemBackend {
    fn exists(&self, path: &DocPath) -> Result<bool, Error> {
        match fs::metadata(self.file_path(path.iter())) {
            Ok(attr) => Ok(attr.is_file()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
        self.document_metadata(path)?;

        let file_path = self.file_path(path.iter());
        tracing::debug!("Reading {}...", file_path.display());
        fs::read(&file_path)
            .map(Bytes::from)
            .map_err(|err| classify_read_error(err, path))
    }

    fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
        self.prepare_parent(path)?;

        let file_path = self.file_path(path.iter());
        let previous = match fs::metadata(&file_path) {
            Ok(attr) if attr.is_dir() => {
                return Err(Error::IsContainer {
                    path: path.to_string(),
                })
            }
            Ok(attr) => Some(attr.modified()?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(classify_write_error(err, path)),
        };

        tracing::debug!("Writing {}...", file_path.display());
        let mut f =
            fs::File::create(&file_path).map_err(|err| classify_write_error(err, path))?;
        f.write_all(&data)?;

        // Filesystem clocks can be coarser than the rate of rewrites.
        if let Some(previous) = previous {
            if f.metadata()?.modified()? <= previous {
                f.set_modified(previous + MTIME_STEP)?;
            }
        }

        Ok(())
    }

    fn delete(&self, path: &DocPath) -> Result<(), Error> {
        let file_path = self.file_path(path.iter());
        let attr = fs::metadata(&file_path).map_err(|err| classify_read_error(err, path))?;

        if attr.is_dir() {
            if !self.options.prune_empty_dirs {
                return Err(Error::CannotDeleteDirectory {
                    path: path.to_string(),
                });
            }
            if Self::holds_documents(&file_path) {
                return Err(Error::IsContainer {
                    path: path.to_string(),
                });
            }
            tracing::debug!("Removing empty directory tree {}...", file_path.display());
            fs::remove_dir_all(&file_path).map_err(|err| classify_read_error(err, path))?;
        } else {
            tracing::debug!("Deleting {}...", file_path.display());
            fs::remove_file(&file_path).map_err(|err| classify_read_error(err, path))?;
        }

        if self.options.prune_empty_dirs {
            self.prune_empty_parents(file_path.parent())?;
        }

        Ok(())
    }

    fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
        Ok(self
            .read_entries(path)?
            .into_iter()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(entry_name)
            // Only names a `DocPath` can address again, so `.json` alone is skipped.
            .filter(|name| path.join_document(name).is_ok())
            .collect())
    }

    fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
        Ok(self.document_metadata(path)?.modified()?)
    }
}

impl FileBackend for FilesystemBackend {
    fn list_types(&self, path: &ContainerPath, kind: EntryKind) -> Result<Vec<String>, Error> {
        Ok(self
            .read_entries(path)?
            .into_iter()
            .filter(|entry| match kind {
                EntryKind::Document => entry.file_type().is_file(),
                EntryKind::Container => entry.file_type().is_dir(),
            })
            .filter_map(entry_name)
            .collect())
    }
}
