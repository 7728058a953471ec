//! The error taxonomy shared by every backend.

use std::io;
use std::path::PathBuf;

use crate::path::Error as PathError;

/// Errors returned by backends, the merge engine and the aggregate reader.
///
/// Nothing in the storage layer logs or recovers from these; callers translate them with
/// [`Error::kind`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Path(#[from] PathError),

    #[error("Nothing found at {path:?}")]
    NotFound { path: String },

    #[error("Cannot delete directory {path:?}")]
    CannotDeleteDirectory { path: String },

    #[error("The path {path:?} resolves to a container")]
    IsContainer { path: String },

    #[error("A document sits where a container is expected on the way to {path:?}")]
    NotAContainer { path: String },

    #[error("Unable to merge {patch} into {existing}")]
    UnmergeableTypes {
        existing: &'static str,
        patch: &'static str,
    },

    #[error("The document at {path:?} could not be decoded: {message}")]
    Decode { path: String, message: String },

    #[error("Encryption failure: {message}")]
    Encryption { message: String },

    #[error("An error occurred trying to use the root path {path}: {error}")]
    RootPathInvalid {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`], used to pick a boundary response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something malformed.
    Client,
    NotFound,
    /// The path names a container where a document operation was requested.
    NotAllowed,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Path(_) | Error::NotAContainer { .. } | Error::UnmergeableTypes { .. } => {
                ErrorKind::Client
            }
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::CannotDeleteDirectory { .. } | Error::IsContainer { .. } => {
                ErrorKind::NotAllowed
            }
            Error::Decode { .. }
            | Error::Encryption { .. }
            | Error::RootPathInvalid { .. }
            | Error::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn not_found(path: impl ToString) -> Self {
        Error::NotFound {
            path: path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn path_error_display() {
        let e = Error::from(PathError::MissingExtension {
            path: "foo/bar".to_string(),
        });
        assert!(format!("{}", e).contains("foo/bar"));
        assert!(format!("{}", e).contains(".json"));
    }

    #[test]
    fn unmergeable_display_names_both_kinds() {
        let e = Error::UnmergeableTypes {
            existing: "object",
            patch: "array",
        };
        assert_eq!(format!("{}", e), "Unable to merge array into object");
    }

    #[test]
    fn kinds() {
        let invalid = Error::from(PathError::InvalidPath {
            path: "a".to_string(),
            message: "too short".to_string(),
        });
        assert_eq!(invalid.kind(), ErrorKind::Client);
        assert!(invalid.is_client_error());

        assert_eq!(Error::not_found("a.json").kind(), ErrorKind::NotFound);
        assert!(Error::not_found("a.json").is_not_found());
        assert_eq!(
            Error::CannotDeleteDirectory {
                path: "a".to_string()
            }
            .kind(),
            ErrorKind::NotAllowed
        );
        assert_eq!(
            Error::IsContainer {
                path: "a".to_string()
            }
            .kind(),
            ErrorKind::NotAllowed
        );
        assert_eq!(
            Error::UnmergeableTypes {
                existing: "number",
                patch: "object"
            }
            .kind(),
            ErrorKind::Client
        );
        assert_eq!(
            Error::from(io::Error::other("disk on fire")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn root_path_invalid_has_source() {
        let e = Error::RootPathInvalid {
            path: PathBuf::from("/nope"),
            error: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(StdError::source(&e).is_some());
        assert!(format!("{}", e).contains("/nope"));
    }

    #[test]
    fn not_found_source_is_none() {
        assert!(StdError::source(&Error::not_found("x.json")).is_none());
    }
}
