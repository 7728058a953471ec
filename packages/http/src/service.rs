use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use http::header::{HeaderValue, ALLOW, LAST_MODIFIED};
use http::{Method, StatusCode};
use serde_json::Value as JsonValue;
use tokio::task;

use docfs_json_store::{aggregate, json_utils};
use docfs_store::{
    Backend, ContainerPath, DocPath, EntryKind, Error as StoreError, FileBackend, DOCUMENT_SUFFIX,
};

use crate::error::Error;
use crate::types::{DocRequest, DocResponse};

/// GET `<dir>/__all.json` returns every document in `<dir>`.
pub const GET_ALL_SUFFIX: &str = "/__all.json";
/// GET `<dir>__list.json` returns the document names in `<dir>`.
pub const LIST_ALL_SUFFIX: &str = "__list.json";
/// GET `<dir>__dir.json` returns the sub-container names in `<dir>`.
pub const LIST_DIR_SUFFIX: &str = "__dir.json";
/// Query flag on `__list.json` that strips `.json` from the returned names.
pub const WITHOUT_EXTENSION_PARAM: &str = "withoutExtension";

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS";

type ListDirFn<B> = fn(&B, &ContainerPath) -> Result<Vec<String>, StoreError>;

/// Maps document requests onto a shared backend.
///
/// Backend calls block, so each one runs on tokio's blocking pool.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use docfs_http::{DocRequest, DocumentService};
/// use docfs_json_store::MemoryBackend;
/// use http::StatusCode;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = DocumentService::new(Arc::new(MemoryBackend::default())).with_get_all();
///
/// let response = service.handle(DocRequest::put("/users/alice.json", r#"{"age":30}"#)).await;
/// assert_eq!(response.status, StatusCode::CREATED);
///
/// let response = service.handle(DocRequest::get("/users/__all.json")).await;
/// assert_eq!(response.body, Some(serde_json::json!([{"age": 30}])));
/// # });
/// ```
pub struct DocumentService<B: ?Sized> {
    backend: Arc<B>,
    get_all: bool,
    list_all: bool,
    list_dir: Option<ListDirFn<B>>,
}

impl<B: Backend + ?Sized + 'static> DocumentService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            get_all: false,
            list_all: false,
            list_dir: None,
        }
    }

    /// Enable the `/__all.json` route.
    #[must_use]
    pub fn with_get_all(mut self) -> Self {
        self.get_all = true;
        self
    }

    /// Enable the `__list.json` route.
    #[must_use]
    pub fn with_list_all(mut self) -> Self {
        self.list_all = true;
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Handle one request.  Failures become error responses; this never returns an `Err`.
    pub async fn handle(&self, request: DocRequest) -> DocResponse {
        let method = request.method.clone();
        let path = request.path.clone();

        match self.dispatch(request).await {
            Ok(response) => response,
            Err(error) => {
                let status = error.status();
                if status.is_server_error() {
                    tracing::warn!("{} {} failed: {}", method, path, error);
                } else {
                    tracing::debug!("{} {} rejected with {}: {}", method, path, status, error);
                }
                DocResponse::error(status, error.to_string())
            }
        }
    }

    async fn dispatch(&self, request: DocRequest) -> Result<DocResponse, Error> {
        tracing::debug!("{} {}", request.method, request.path);

        if request.method == Method::GET {
            if let Some(response) = self.route_suffix(&request).await? {
                return Ok(response);
            }
        }

        let DocRequest {
            method, path, body, ..
        } = request;
        match method {
            Method::GET => self.get(DocPath::parse(&path)?, true).await,
            Method::HEAD => self.get(DocPath::parse(&path)?, false).await,
            Method::PUT | Method::POST => {
                let path = DocPath::parse(&path)?;
                let value: JsonValue = serde_json::from_slice(&body)?;
                self.blocking(move |backend| backend.write(&path, json_utils::encode(&value)?))
                    .await?;
                Ok(DocResponse::new(StatusCode::CREATED))
            }
            Method::DELETE => {
                let path = DocPath::parse(&path)?;
                self.blocking(move |backend| backend.delete(&path)).await?;
                Ok(DocResponse::new(StatusCode::NO_CONTENT))
            }
            Method::PATCH => {
                let path = DocPath::parse(&path)?;
                let patch: JsonValue = serde_json::from_slice(&body)?;
                let merged = self
                    .blocking(move |backend| json_utils::patch_document(backend, &path, &patch))
                    .await?;
                Ok(DocResponse::new(StatusCode::OK).with_body(merged))
            }
            Method::OPTIONS => {
                let path = DocPath::parse(&path)?;
                let exists = {
                    let path = path.clone();
                    self.blocking(move |backend| backend.exists(&path)).await?
                };
                if !exists {
                    return Err(StoreError::not_found(path).into());
                }
                Ok(DocResponse::new(StatusCode::OK)
                    .with_header(ALLOW, HeaderValue::from_static(ALLOWED_METHODS)))
            }
            method => Err(Error::MethodNotAllowed { method }),
        }
    }

    async fn route_suffix(&self, request: &DocRequest) -> Result<Option<DocResponse>, Error> {
        let path = request.path.as_str();

        if self.get_all {
            if let Some(dir) = path.strip_suffix(GET_ALL_SUFFIX) {
                let container = ContainerPath::parse(dir)?;
                let documents = aggregate::get_all(Arc::clone(&self.backend), &container).await?;
                return Ok(Some(
                    DocResponse::new(StatusCode::OK).with_body(JsonValue::Array(documents)),
                ));
            }
        }

        if self.list_all {
            if let Some(dir) = path.strip_suffix(LIST_ALL_SUFFIX) {
                let container = ContainerPath::parse(dir)?;
                let mut names = self
                    .blocking(move |backend| backend.list(&container))
                    .await?;
                if request.has_query_param(WITHOUT_EXTENSION_PARAM) {
                    for name in names.iter_mut() {
                        if name.ends_with(DOCUMENT_SUFFIX) {
                            name.truncate(name.len() - DOCUMENT_SUFFIX.len());
                        }
                    }
                }
                return Ok(Some(DocResponse::new(StatusCode::OK).with_body(names.into())));
            }
        }

        if let Some(list_dir) = self.list_dir {
            if let Some(dir) = path.strip_suffix(LIST_DIR_SUFFIX) {
                let container = ContainerPath::parse(dir)?;
                let names = self
                    .blocking(move |backend| list_dir(backend, &container))
                    .await?;
                return Ok(Some(DocResponse::new(StatusCode::OK).with_body(names.into())));
            }
        }

        Ok(None)
    }

    async fn get(&self, path: DocPath, with_body: bool) -> Result<DocResponse, Error> {
        let (value, modified) = self
            .blocking(move |backend| {
                let data = backend.get(&path)?;
                let value = json_utils::decode(&path, &data)?;
                Ok((value, backend.last_modified(&path)?))
            })
            .await?;

        let response = DocResponse::new(StatusCode::OK)
            .with_header(LAST_MODIFIED, HeaderValue::from_str(&http_date(modified))?);
        Ok(if with_body {
            response.with_body(value)
        } else {
            response
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&B) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        Ok(task::spawn_blocking(move || op(&*backend)).await??)
    }
}

impl<B: FileBackend + ?Sized + 'static> DocumentService<B> {
    /// Enable the `__dir.json` route.  Only backends that can tell containers apart offer it.
    #[must_use]
    pub fn with_list_dir(mut self) -> Self {
        let list_dir: ListDirFn<B> = |backend, path| backend.list_types(path, EntryKind::Container);
        self.list_dir = Some(list_dir);
        self
    }
}

/// Format a timestamp as an HTTP date (IMF-fixdate).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
