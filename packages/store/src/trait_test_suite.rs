//! Contract tests every [`Backend`] implementation is expected to pass.
//!
//! Each function takes a factory producing a fresh, empty backend.  Factories must produce
//! backends that create missing intermediate containers on write.  The `*_pruning` tests expect
//! a backend configured to prune containers left empty by a delete; all others expect pruning
//! to be disabled.

use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::{Backend, ContainerPath, DocPath, ErrorKind};

fn doc(raw: &str) -> DocPath {
    DocPath::parse(raw).unwrap()
}

fn container(raw: &str) -> ContainerPath {
    ContainerPath::parse(raw).unwrap()
}

pub fn write_then_get_works<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();

    for (raw, content) in [
        ("a.json", &b"{\"x\":1}"[..]),
        ("nested/deeper/b.json", &b"[1,2,3]"[..]),
        ("/slashes/c.json/", &b"\"scalar\""[..]),
    ] {
        let path = doc(raw);
        assert!(!backend.exists(&path).unwrap());

        backend
            .write(&path, Bytes::copy_from_slice(content))
            .unwrap();

        assert!(backend.exists(&path).unwrap());
        assert_eq!(backend.get(&path).unwrap(), Bytes::copy_from_slice(content));
    }
}

pub fn overwrite_replaces_content<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    let path = doc("value.json");

    backend.write(&path, Bytes::from_static(b"1")).unwrap();
    backend.write(&path, Bytes::from_static(b"2")).unwrap();

    assert_eq!(backend.get(&path).unwrap(), Bytes::from_static(b"2"));
}

pub fn missing_documents_are_not_found<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("present/a.json"), Bytes::from_static(b"{}"))
        .unwrap();

    for raw in ["absent.json", "present/b.json", "absent/a.json"] {
        let path = doc(raw);
        assert!(!backend.exists(&path).unwrap());
        assert_eq!(backend.get(&path).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            backend.last_modified(&path).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            backend.delete(&path).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}

pub fn containers_are_not_documents<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("box.json/inner.json"), Bytes::from_static(b"{}"))
        .unwrap();

    let container_path = doc("box.json");
    assert!(!backend.exists(&container_path).unwrap());
    assert_eq!(
        backend.get(&container_path).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        backend.last_modified(&container_path).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

pub fn list_returns_sorted_documents_only<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    for raw in ["dir/b.json", "dir/a.json", "dir/sub/c.json", "top.json"] {
        backend.write(&doc(raw), Bytes::from_static(b"{}")).unwrap();
    }

    assert_eq!(backend.list(&container("dir")).unwrap(), ["a.json", "b.json"]);
    assert_eq!(backend.list(&container("/dir/sub/")).unwrap(), ["c.json"]);
    assert_eq!(backend.list(&ContainerPath::root()).unwrap(), ["top.json"]);
}

pub fn list_requires_an_existing_container<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("dir/a.json"), Bytes::from_static(b"{}"))
        .unwrap();

    assert_eq!(
        backend.list(&container("missing")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    // A document is not a container, even though its path parses as one.
    assert_eq!(
        backend.list(&container("dir/a.json")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        backend.list(&container("dir/a.json/x")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

pub fn delete_removes_document<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    let path = doc("dir/a.json");
    backend.write(&path, Bytes::from_static(b"{}")).unwrap();

    backend.delete(&path).unwrap();

    assert!(!backend.exists(&path).unwrap());
    assert_eq!(backend.get(&path).unwrap_err().kind(), ErrorKind::NotFound);
}

pub fn delete_keeps_empty_containers_without_pruning<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("a/b/c.json"), Bytes::from_static(b"{}"))
        .unwrap();

    backend.delete(&doc("a/b/c.json")).unwrap();

    assert!(backend.list(&container("a/b")).unwrap().is_empty());
}

pub fn delete_of_container_is_refused_without_pruning<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("box.json/inner.json"), Bytes::from_static(b"{}"))
        .unwrap();

    let err = backend.delete(&doc("box.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAllowed);
    assert!(backend.exists(&doc("box.json/inner.json")).unwrap());
}

pub fn delete_prunes_empty_containers_pruning<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("keep.json"), Bytes::from_static(b"{}"))
        .unwrap();
    backend
        .write(&doc("a/b/c.json"), Bytes::from_static(b"{}"))
        .unwrap();

    backend.delete(&doc("a/b/c.json")).unwrap();

    assert_eq!(
        backend.list(&container("a/b")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        backend.list(&container("a")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    // The root is never pruned.
    assert_eq!(backend.list(&ContainerPath::root()).unwrap(), ["keep.json"]);
}

pub fn delete_keeps_non_empty_containers_pruning<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("a/b/one.json"), Bytes::from_static(b"1"))
        .unwrap();
    backend
        .write(&doc("a/b/two.json"), Bytes::from_static(b"2"))
        .unwrap();

    backend.delete(&doc("a/b/one.json")).unwrap();

    assert_eq!(backend.list(&container("a/b")).unwrap(), ["two.json"]);
    assert_eq!(
        backend.get(&doc("a/b/two.json")).unwrap(),
        Bytes::from_static(b"2")
    );
}

pub fn delete_of_populated_container_is_refused_pruning<B: Backend>(
    backend_factory: fn() -> B,
) {
    let backend = backend_factory();
    backend
        .write(&doc("box.json/inner.json"), Bytes::from_static(b"{}"))
        .unwrap();

    let err = backend.delete(&doc("box.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAllowed);
    assert!(backend.exists(&doc("box.json/inner.json")).unwrap());

    // Removing the last document takes the container with it.
    backend.delete(&doc("box.json/inner.json")).unwrap();
    assert_eq!(
        backend.list(&container("box.json")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

pub fn write_onto_container_is_refused<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("box.json/inner.json"), Bytes::from_static(b"{}"))
        .unwrap();

    let err = backend
        .write(&doc("box.json"), Bytes::from_static(b"{}"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAllowed);
    assert!(backend.exists(&doc("box.json/inner.json")).unwrap());
}

pub fn write_through_document_is_refused<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    backend
        .write(&doc("leaf.json"), Bytes::from_static(b"\"kept\""))
        .unwrap();

    let err = backend
        .write(&doc("leaf.json/child.json"), Bytes::from_static(b"{}"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Client);
    assert_eq!(
        backend.get(&doc("leaf.json")).unwrap(),
        Bytes::from_static(b"\"kept\"")
    );
}

pub fn rewrite_advances_last_modified<B: Backend>(backend_factory: fn() -> B) {
    let backend = backend_factory();
    let path = doc("clock.json");
    let content = Bytes::from_static(b"{\"same\":true}");

    backend.write(&path, content.clone()).unwrap();
    let first = backend.last_modified(&path).unwrap();

    backend.write(&path, content.clone()).unwrap();
    let second = backend.last_modified(&path).unwrap();
    assert_eq!(backend.get(&path).unwrap(), content);
    assert!(second > first);

    // And again after a pause, against the wall clock rather than a bump.
    thread::sleep(Duration::from_millis(5));
    backend.write(&path, content.clone()).unwrap();
    assert!(backend.last_modified(&path).unwrap() > second);
    assert_eq!(backend.get(&path).unwrap(), content);
}

/// Runs every test that expects pruning to be disabled.
pub fn run_all<B: Backend>(backend_factory: fn() -> B) {
    write_then_get_works(backend_factory);
    overwrite_replaces_content(backend_factory);
    missing_documents_are_not_found(backend_factory);
    containers_are_not_documents(backend_factory);
    list_returns_sorted_documents_only(backend_factory);
    list_requires_an_existing_container(backend_factory);
    delete_removes_document(backend_factory);
    delete_keeps_empty_containers_without_pruning(backend_factory);
    delete_of_container_is_refused_without_pruning(backend_factory);
    write_onto_container_is_refused(backend_factory);
    write_through_document_is_refused(backend_factory);
    rewrite_advances_last_modified(backend_factory);
}

/// Runs every test that expects pruning to be enabled.
pub fn run_all_pruning<B: Backend>(backend_factory: fn() -> B) {
    delete_prunes_empty_containers_pruning(backend_factory);
    delete_keeps_non_empty_containers_pruning(backend_factory);
    delete_of_populated_container_is_refused_pruning(backend_factory);
}
