//! # docpatch-diff
//!
//! Turns "here is the new value" into the smallest set of edits against a
//! live document.
//!
//! - [`diff`] compares two value trees and emits [`ChangeRecord`]s
//! - [`apply`] replays change records against a live root
//! - [`assign_at`] writes a value at a key path, patching containers in place
//! - [`text::reconcile`] and [`text::apply`] edit a text leaf one character
//!   at a time so untouched characters keep their identity
//!
//! ## Example
//!
//! ```rust
//! use docpatch_core::Value;
//! use docpatch_diff::{apply, diff};
//! use serde_json::json;
//!
//! let old = Value::from(json!({"xs": [1, 2, 3]}));
//! let new = Value::from(json!({"xs": [1, 3, 4]}));
//!
//! let mut live = old.clone();
//! apply(&mut live, &diff(&old, &new)).unwrap();
//! assert_eq!(live, new);
//! ```

pub mod change;
pub mod patch;
pub mod structural;
pub mod text;

pub use change::ChangeRecord;
pub use patch::{apply, apply_one, assign_at, patch_value};
pub use structural::diff;
pub use text::{reconcile, reconcile_text, CharSequence, EditOp, ReconcileSummary};
