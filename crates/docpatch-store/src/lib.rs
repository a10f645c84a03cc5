//! docpatch-store - versioned documents addressed by URI
//!
//! This crate provides an in-memory store of map-rooted documents with a
//! linear revision history, and a gateway that reads, writes and watches
//! sub-values through document URIs.
//!
//! # Quick Start
//!
//! ```rust
//! use docpatch_core::Value;
//! use docpatch_store::{DocumentGateway, DocumentStore, StoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(DocumentStore::new(StoreConfig::default()));
//! let gateway = DocumentGateway::new(store);
//!
//! let uri = gateway.create_document_uri();
//! gateway
//!     .set_document_uri(&format!("{}/items", uri), Value::from(json!([1, 2, 3])))
//!     .unwrap();
//!
//! let items = gateway.open_document_uri(&format!("{}/items", uri)).unwrap();
//! assert_eq!(items, Value::from(json!([1, 2, 3])));
//!
//! let first = gateway
//!     .open_document_uri(&format!("{}/title?history=0", uri))
//!     .unwrap();
//! assert_eq!(first, Value::from("New Document"));
//! ```
//!
//! # Architecture
//!
//! - [`uri`] - document URI parsing, rendering and link scanning
//! - [`store`] - documents, history, change closures and broadcasts
//! - [`gateway`] - URI-level open/watch/set/change
//! - [`content`] - byte rendering of sub-values
//! - [`config`] - store configuration
//! - [`error`] - error types

pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod store;
pub mod uri;

pub use config::{StoreConfig, StoreConfigBuilder};
pub use content::ContentKind;
pub use error::{Result, StoreError, UriError};
pub use gateway::{DocumentGateway, DocumentWatch, NEW_DOCUMENT_TITLE};
pub use store::{DocEvent, DocHandle, DocumentId, DocumentStore};
pub use uri::{DocumentLink, DocumentUriDetails, UriResolver};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::error::StoreError;
    pub use crate::gateway::DocumentGateway;
    pub use crate::store::{DocumentId, DocumentStore};
    pub use crate::uri::UriResolver;
    pub use docpatch_core::Value;
}
