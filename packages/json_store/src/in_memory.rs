//! A backend keeping every document in a process-local tree.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use parking_lot::RwLock;
use serde::Deserialize;

use docfs_store::{Backend, ContainerPath, DocPath, Error};

const TIMESTAMP_STEP: Duration = Duration::from_micros(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryOptions {
    /// Remove containers left without documents by a delete, walking up toward the root.
    pub prune_empty_containers: bool,
}

impl MemoryOptions {
    #[must_use]
    pub fn with_prune_empty_containers(mut self) -> Self {
        self.prune_empty_containers = true;
        self
    }
}

#[derive(Debug)]
struct Blob {
    content: Bytes,
    modified: SystemTime,
}

#[derive(Debug)]
enum Node {
    Document(Blob),
    Container(BTreeMap<String, Node>),
}

impl Node {
    fn holds_documents(&self) -> bool {
        match self {
            Node::Document(_) => true,
            Node::Container(children) => children.values().any(Node::holds_documents),
        }
    }
}

/// An in-memory [`Backend`].
///
/// Intermediate containers are always created on write.  Every operation takes the tree lock
/// once, so each call is atomic with respect to the others.
///
/// # Example
///
/// ```rust
/// use docfs_json_store::MemoryBackend;
/// use docfs_store::{Backend, Bytes, ContainerPath, DocPath};
///
/// let backend = MemoryBackend::default();
/// let path = DocPath::parse("users/alice.json").unwrap();
///
/// backend.write(&path, Bytes::from_static(b"{\"name\":\"Alice\"}")).unwrap();
///
/// assert!(backend.exists(&path).unwrap());
/// assert_eq!(
///     backend.list(&ContainerPath::parse("users").unwrap()).unwrap(),
///     ["alice.json"]
/// );
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    root: RwLock<BTreeMap<String, Node>>,
    options: MemoryOptions,
}

impl MemoryBackend {
    pub fn new(options: MemoryOptions) -> Self {
        MemoryBackend {
            root: RwLock::new(BTreeMap::new()),
            options,
        }
    }

    pub fn options(&self) -> MemoryOptions {
        self.options
    }
}

fn find<'a>(map: &'a BTreeMap<String, Node>, components: &[String]) -> Option<&'a Node> {
    let (last, leading) = components.split_last()?;
    let mut map = map;
    for component in leading {
        match map.get(component)? {
            Node::Container(children) => map = children,
            Node::Document(_) => return None,
        }
    }
    map.get(last)
}

fn find_container_mut<'a>(
    mut map: &'a mut BTreeMap<String, Node>,
    components: &[String],
) -> Option<&'a mut BTreeMap<String, Node>> {
    for component in components {
        map = match map.get_mut(component)? {
            Node::Container(children) => children,
            Node::Document(_) => return None,
        };
    }
    Some(map)
}

fn create_containers<'a>(
    mut map: &'a mut BTreeMap<String, Node>,
    path: &DocPath,
) -> Result<&'a mut BTreeMap<String, Node>, Error> {
    for component in path.parent().iter() {
        let node = map
            .entry(component.clone())
            .or_insert_with(|| Node::Container(BTreeMap::new()));
        map = match node {
            Node::Container(children) => children,
            Node::Document(_) => {
                return Err(Error::NotAContainer {
                    path: path.to_string(),
                })
            }
        };
    }
    Ok(map)
}

/// Removes the containers along `components` that no longer hold anything, deepest first.
fn prune_empty(map: &mut BTreeMap<String, Node>, components: &[String]) {
    for depth in (1..=components.len()).rev() {
        let Some(parent) = find_container_mut(map, &components[..depth - 1]) else {
            return;
        };
        let name = &components[depth - 1];
        if !matches!(parent.get(name), Some(Node::Container(children)) if children.is_empty()) {
            return;
        }
        parent.remove(name);
        tracing::debug!("Pruned empty container {}", components[..depth].join("/"));
    }
}

impl Backend for MemoryBackend {
    fn exists(&self, path: &DocPath) -> Result<bool, Error> {
        let root = self.root.read();
        Ok(matches!(
            find(&root, path.components()),
            Some(Node::Document(_))
        ))
    }

    fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
        let root = self.root.read();
        match find(&root, path.components()) {
            Some(Node::Document(blob)) => Ok(blob.content.clone()),
            _ => Err(Error::not_found(path)),
        }
    }

    fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
        let now = SystemTime::now();
        let mut root = self.root.write();
        let parent = create_containers(&mut root, path)?;

        match parent.get_mut(path.file_name()) {
            Some(Node::Container(_)) => Err(Error::IsContainer {
                path: path.to_string(),
            }),
            Some(Node::Document(blob)) => {
                blob.modified = now.max(blob.modified + TIMESTAMP_STEP);
                blob.content = data;
                Ok(())
            }
            None => {
                parent.insert(
                    path.file_name().to_string(),
                    Node::Document(Blob {
                        content: data,
                        modified: now,
                    }),
                );
                Ok(())
            }
        }
    }

    fn delete(&self, path: &DocPath) -> Result<(), Error> {
        let parent_path = path.parent();
        let mut root = self.root.write();
        let parent = find_container_mut(&mut root, parent_path.components())
            .ok_or_else(|| Error::not_found(path))?;

        match parent.get(path.file_name()) {
            None => return Err(Error::not_found(path)),
            Some(Node::Document(_)) => {}
            Some(node @ Node::Container(_)) => {
                if !self.options.prune_empty_containers || node.holds_documents() {
                    return Err(Error::IsContainer {
                        path: path.to_string(),
                    });
                }
            }
        }
        parent.remove(path.file_name());

        if self.options.prune_empty_containers {
            prune_empty(&mut root, parent_path.components());
        }

        Ok(())
    }

    fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
        let root = self.root.read();
        let children = if path.is_root() {
            &*root
        } else {
            match find(&root, path.components()) {
                Some(Node::Container(children)) => children,
                _ => return Err(Error::not_found(path)),
            }
        };

        Ok(children
            .iter()
            .filter(|(_, node)| matches!(node, Node::Document(_)))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
        let root = self.root.read();
        match find(&root, path.components()) {
            Some(Node::Document(blob)) => Ok(blob.modified),
            _ => Err(Error::not_found(path)),
        }
    }
}
