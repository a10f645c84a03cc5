//! # docpatch-core
//!
//! Value model shared by the docpatch crates.
//!
//! This crate provides:
//! - `Value`, a closed tree of null/bool/number/string/text/map/array
//! - `TextSequence`, an RGA text leaf edited one character at a time
//! - `KeyPath` and key path resolution over value trees
//! - `ChangeGateway`, the mutation scope a document store offers
//!
//! ## Example
//!
//! ```rust
//! use docpatch_core::{resolve_sub_value, Value};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"notes": {"title": "Groceries"}}));
//! let path = vec!["notes".to_string(), "title".to_string()];
//! assert_eq!(resolve_sub_value(&doc, &path).unwrap(), &Value::from("Groceries"));
//! ```

pub mod error;
pub mod gateway;
pub mod path;
pub mod text;
pub mod value;

pub use error::{DocError, Result};
pub use gateway::ChangeGateway;
pub use path::{resolve_sub_value, resolve_sub_value_mut, KeyPath, PathSegment};
pub use text::{CharId, TextSequence};
pub use value::{Map, Value, ValueKind};
