//! # docfs-http
//!
//! A request/response document service over any docfs backend.
//!
//! Requests carry an [`http::Method`], a document path and a raw body; responses carry an
//! [`http::StatusCode`], headers and a decoded JSON body.  Transport, routing and
//! authentication are left to whatever embeds the service.
//!
//! | Method        | Success                          |
//! |---------------|----------------------------------|
//! | GET           | 200, document + `Last-Modified`  |
//! | HEAD          | 200, `Last-Modified` only        |
//! | PUT / POST    | 201                              |
//! | PATCH         | 200, merged document             |
//! | DELETE        | 204                              |
//! | OPTIONS       | 200, `Allow`                     |
//!
//! Errors come back as `{"error": "..."}` with 400, 404, 405 or 500 depending on
//! [`docfs_store::ErrorKind`].

pub mod error;
pub mod service;
pub mod types;

pub use error::Error;
pub use service::{
    DocumentService, GET_ALL_SUFFIX, LIST_ALL_SUFFIX, LIST_DIR_SUFFIX, WITHOUT_EXTENSION_PARAM,
};
pub use types::{DocRequest, DocResponse};
