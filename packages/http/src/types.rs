use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde_json::Value as JsonValue;

/// A request against a [`DocumentService`](crate::DocumentService).
///
/// `path` is the raw document or container address, e.g. `/users/alice.json`.  A query string
/// given with the path (`/users/__list.json?withoutExtension`) is split off into `query`.
#[derive(Debug, Clone)]
pub struct DocRequest {
    pub method: Method,
    pub path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
    /// Raw request body; only PUT, POST and PATCH look at it.
    pub body: Bytes,
}

impl DocRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        let query = path.split_once('?').map(|(_, query)| query.to_string());
        if let Some(start) = path.find('?') {
            path.truncate(start);
        }
        Self {
            method,
            path,
            query,
            body: Bytes::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn put(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn post(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn options(path: impl Into<String>) -> Self {
        Self::new(Method::OPTIONS, path)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// True if the query string names `key`, with or without a value.
    pub fn has_query_param(&self, key: &str) -> bool {
        self.query.as_deref().is_some_and(|query| {
            query
                .split('&')
                .any(|pair| pair.split('=').next() == Some(key))
        })
    }
}

/// The outcome of a [`DocRequest`].
#[derive(Debug, Clone)]
pub struct DocResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Decoded JSON body, if the response carries one.
    pub body: Option<JsonValue>,
}

impl DocResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// An error response with a `{"error": message}` body.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status).with_body(serde_json::json!({ "error": message.into() }))
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// The message of an error response, if there is one.
    pub fn error_message(&self) -> Option<&str> {
        self.body.as_ref()?.get("error")?.as_str()
    }
}
