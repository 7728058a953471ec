//! Concurrent reads of every document in a container.

use std::io;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value as JsonValue;
use tokio::task::{self, JoinError};

use docfs_store::{Backend, ContainerPath, DocPath, Error};

use crate::json_utils;

fn join_error(err: JoinError) -> Error {
    Error::Io(io::Error::other(err))
}

fn fetch<B: Backend + ?Sized>(backend: &B, path: &DocPath) -> Result<JsonValue, Error> {
    let data = backend.get(path)?;
    json_utils::decode(path, &data)
}

/// Decode every document directly inside `container`.
///
/// The container is listed first, then each child is fetched on its own blocking task.  Results
/// come back in list order whatever order the fetches finish in.  The first failure fails the
/// whole read; fetches already running are left to finish and their results are dropped.
pub async fn get_all<B>(backend: Arc<B>, container: &ContainerPath) -> Result<Vec<JsonValue>, Error>
where
    B: Backend + ?Sized + 'static,
{
    let names = {
        let backend = Arc::clone(&backend);
        let container = container.clone();
        task::spawn_blocking(move || backend.list(&container))
            .await
            .map_err(join_error)??
    };

    let mut fetches = Vec::with_capacity(names.len());
    for name in names {
        let path = container.join_document(&name)?;
        let backend = Arc::clone(&backend);
        fetches.push(task::spawn_blocking(move || fetch(&*backend, &path)));
    }

    tracing::debug!("Fetching {} documents from /{}", fetches.len(), container);
    try_join_all(
        fetches
            .into_iter()
            .map(|handle| async move { handle.await.map_err(join_error)? }),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, SystemTime};

    use bytes::Bytes;
    use serde_json::json;

    use crate::MemoryBackend;

    fn doc(raw: &str) -> DocPath {
        DocPath::parse(raw).unwrap()
    }

    /// Delays reads so that earlier names finish last.
    struct SlowBackend {
        inner: MemoryBackend,
    }

    impl Backend for SlowBackend {
        fn exists(&self, path: &DocPath) -> Result<bool, Error> {
            self.inner.exists(path)
        }

        fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
            let delay = match path.file_name() {
                "a.json" => 60,
                "b.json" => 30,
                _ => 0,
            };
            thread::sleep(Duration::from_millis(delay));
            self.inner.get(path)
        }

        fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
            self.inner.write(path, data)
        }

        fn delete(&self, path: &DocPath) -> Result<(), Error> {
            self.inner.delete(path)
        }

        fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
            self.inner.list(path)
        }

        fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
            self.inner.last_modified(path)
        }
    }

    /// Deletes `b.json` right after listing, as a concurrent writer would.
    struct VanishingBackend {
        inner: MemoryBackend,
    }

    impl Backend for VanishingBackend {
        fn exists(&self, path: &DocPath) -> Result<bool, Error> {
            self.inner.exists(path)
        }

        fn get(&self, path: &DocPath) -> Result<Bytes, Error> {
            self.inner.get(path)
        }

        fn write(&self, path: &DocPath, data: Bytes) -> Result<(), Error> {
            self.inner.write(path, data)
        }

        fn delete(&self, path: &DocPath) -> Result<(), Error> {
            self.inner.delete(path)
        }

        fn list(&self, path: &ContainerPath) -> Result<Vec<String>, Error> {
            let names = self.inner.list(path)?;
            self.inner.delete(&path.join_document("b.json")?)?;
            Ok(names)
        }

        fn last_modified(&self, path: &DocPath) -> Result<SystemTime, Error> {
            self.inner.last_modified(path)
        }
    }

    fn populate(backend: &impl Backend) {
        for (raw, content) in [
            ("dir/a.json", &br#"{"n":"a"}"#[..]),
            ("dir/b.json", &br#"{"n":"b"}"#[..]),
            ("dir/c.json", &br#"{"n":"c"}"#[..]),
        ] {
            backend
                .write(&doc(raw), Bytes::copy_from_slice(content))
                .unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn results_follow_list_order() {
        let backend = Arc::new(SlowBackend {
            inner: MemoryBackend::default(),
        });
        populate(&*backend);

        let all = get_all(backend, &ContainerPath::parse("dir").unwrap())
            .await
            .unwrap();

        assert_eq!(all, [json!({"n": "a"}), json!({"n": "b"}), json!({"n": "c"})]);
    }

    #[tokio::test]
    async fn vanished_child_fails_everything() {
        let backend = Arc::new(VanishingBackend {
            inner: MemoryBackend::default(),
        });
        populate(&*backend);

        let err = get_all(backend, &ContainerPath::parse("dir").unwrap())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_and_missing_containers() {
        let backend = Arc::new(MemoryBackend::default());
        backend
            .write(&doc("dir/sub/deep.json"), Bytes::from_static(b"1"))
            .unwrap();

        let dir = ContainerPath::parse("dir").unwrap();
        assert!(get_all(Arc::clone(&backend), &dir).await.unwrap().is_empty());

        let missing = ContainerPath::parse("missing").unwrap();
        assert!(get_all(backend, &missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn bare_suffix_file_is_not_a_child() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".json"), b"{}").unwrap();
        std::fs::write(dir.path().join("a.json"), br#"{"a":1}"#).unwrap();
        let backend = Arc::new(
            crate::FilesystemBackend::new(dir.path().to_path_buf(), Default::default()).unwrap(),
        );

        let all = get_all(backend, &ContainerPath::root()).await.unwrap();
        assert_eq!(all, vec![json!({"a": 1})]);
    }

    #[tokio::test]
    async fn undecodable_child_fails_everything() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::default());
        backend
            .write(&doc("good.json"), Bytes::from_static(b"{}"))
            .unwrap();
        backend
            .write(&doc("junk.json"), Bytes::from_static(b"not json"))
            .unwrap();

        let err = get_all(backend, &ContainerPath::root()).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
