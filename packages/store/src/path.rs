use std::fmt;

/// Every document name ends with this suffix.
pub const DOCUMENT_SUFFIX: &str = ".json";

/// Shortest acceptable document path (after trimming), suffix included.
pub const MIN_DOCUMENT_PATH_BYTES: usize = 6;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("The path is invalid {path:?}: {message}")]
    InvalidPath { path: String, message: String },
    #[error("The path {path:?} does not end with \".json\"")]
    MissingExtension { path: String },
}

/// A validated path to a document.
///
/// A `DocPath` is built from a slash-delimited string.  Leading and trailing slashes are trimmed,
/// the remainder must be at least `MIN_DOCUMENT_PATH_BYTES` long and end with `DOCUMENT_SUFFIX`.
/// All components but the last name containers; the last one names the document itself.
///
/// ```rust
/// use docfs_store::DocPath;
///
/// let path = DocPath::parse("/users/alice.json").unwrap();
/// assert_eq!(path.file_name(), "alice.json");
/// assert_eq!(path.parent().to_string(), "users");
/// assert!(DocPath::parse("users/alice").is_err());
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocPath {
    components: Vec<String>,
}

impl DocPath {
    pub fn parse(path: &str) -> Result<Self, Error> {
        let trimmed = path.trim_matches('/');
        if trimmed.len() < MIN_DOCUMENT_PATH_BYTES {
            return Err(Error::InvalidPath {
                path: path.to_string(),
                message: format!(
                    "Path must be at least {} bytes long once surrounding slashes are trimmed",
                    MIN_DOCUMENT_PATH_BYTES
                ),
            });
        }
        if !trimmed.ends_with(DOCUMENT_SUFFIX) {
            return Err(Error::MissingExtension {
                path: path.to_string(),
            });
        }

        Ok(DocPath {
            components: split_components(path, trimmed)?,
        })
    }

    /// The document name, i.e. the last component.
    pub fn file_name(&self) -> &str {
        // Parsing guarantees at least one component.
        self.components.last().map(String::as_str).unwrap_or_default()
    }

    /// The container holding this document.  For a top-level document this is the root.
    pub fn parent(&self) -> ContainerPath {
        ContainerPath {
            components: self.components[..self.components.len() - 1].to_vec(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.components.iter()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// A validated path to a container.  The empty path is the backend root.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContainerPath {
    components: Vec<String>,
}

impl ContainerPath {
    pub fn parse(path: &str) -> Result<Self, Error> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        Ok(ContainerPath {
            components: split_components(path, trimmed)?,
        })
    }

    pub fn root() -> Self {
        ContainerPath { components: vec![] }
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Builds the path of the document `name` directly inside this container.
    pub fn join_document(&self, name: &str) -> Result<DocPath, Error> {
        if self.is_root() {
            DocPath::parse(name)
        } else {
            DocPath::parse(&format!("{}/{}", self, name))
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.components.iter()
    }
}

impl fmt::Display for ContainerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

fn split_components(original: &str, trimmed: &str) -> Result<Vec<String>, Error> {
    trimmed
        .split('/')
        .enumerate()
        .map(|(i, component)| match component {
            "" | "." | ".." => Err(Error::InvalidPath {
                path: original.to_string(),
                message: format!(
                    "Path component at position #{} ({:?}) is not a valid name",
                    i, component
                ),
            }),
            _ if component.contains('\0') => Err(Error::InvalidPath {
                path: original.to_string(),
                message: format!("Path component at position #{} contains a NUL byte", i),
            }),
            _ => Ok(component.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_surrounding_slashes() {
        let path = DocPath::parse("/a/b/c.json/").unwrap();
        assert_eq!(path.components(), ["a", "b", "c.json"]);
        assert_eq!(path.to_string(), "a/b/c.json");
        assert_eq!(path.file_name(), "c.json");
        assert_eq!(path.parent(), ContainerPath::parse("a/b").unwrap());
    }

    #[test]
    fn short_paths_are_invalid() {
        for raw in ["", "/", "//", ".json", "/.json/", "a.jso"] {
            assert!(
                matches!(DocPath::parse(raw), Err(Error::InvalidPath { .. })),
                "{:?} should be rejected as too short",
                raw
            );
        }
    }

    #[test]
    fn minimum_length_is_accepted() {
        assert!(DocPath::parse("a.json").is_ok());
        assert!(DocPath::parse("/a.json").is_ok());
    }

    #[test]
    fn missing_extension_is_reported() {
        assert_eq!(
            DocPath::parse("users/alice"),
            Err(Error::MissingExtension {
                path: "users/alice".to_string()
            })
        );
        assert!(matches!(
            DocPath::parse("alice.JSON"),
            Err(Error::MissingExtension { .. })
        ));
    }

    #[test]
    fn relative_and_empty_components_are_rejected() {
        for raw in ["a//b.json", "../b.json", "a/./b.json", "a/../../b.json"] {
            assert!(
                matches!(DocPath::parse(raw), Err(Error::InvalidPath { .. })),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn nul_bytes_are_rejected() {
        for raw in ["a\0b.json", "dir\0/a.json", "a/b.json\0.json"] {
            assert!(
                matches!(DocPath::parse(raw), Err(Error::InvalidPath { .. })),
                "{:?} should be rejected",
                raw
            );
        }
        assert!(matches!(
            ContainerPath::parse("a/\0"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(ContainerPath::root().join_document("a\0.json").is_err());
    }

    #[test]
    fn paths_are_case_sensitive() {
        assert_ne!(
            DocPath::parse("Users/a.json").unwrap(),
            DocPath::parse("users/a.json").unwrap()
        );
    }

    #[test]
    fn top_level_document_has_root_parent() {
        assert!(DocPath::parse("a.json").unwrap().parent().is_root());
    }

    #[test]
    fn container_paths() {
        assert!(ContainerPath::parse("").unwrap().is_root());
        assert!(ContainerPath::parse("///").unwrap().is_root());
        let path = ContainerPath::parse("/a/b/").unwrap();
        assert_eq!(path.components(), ["a", "b"]);
        assert!(ContainerPath::parse("a/../b").is_err());
    }

    #[test]
    fn join_document_validates_name() {
        let root = ContainerPath::root();
        assert_eq!(
            root.join_document("a.json").unwrap(),
            DocPath::parse("a.json").unwrap()
        );

        let dir = ContainerPath::parse("a/b").unwrap();
        assert_eq!(
            dir.join_document("c.json").unwrap(),
            DocPath::parse("a/b/c.json").unwrap()
        );
        assert!(matches!(
            dir.join_document("c.txt"),
            Err(Error::MissingExtension { .. })
        ));
    }
}
