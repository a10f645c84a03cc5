//! Change records produced by the structural differ.

use docpatch_core::{KeyPath, Value};
use serde::{Deserialize, Serialize};

/// One step of a structural diff.
///
/// For `Insert` and `Remove` the path names the array itself; for `Set` and
/// `Unset` the last segment is the key being written inside its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeRecord {
    /// Replace or create the value at `path`. An empty path merges into the root.
    Set { path: KeyPath, value: Value },
    /// Delete the key named by the last segment.
    Unset { path: KeyPath },
    /// Splice `values` into the array at `path`, starting at `index`.
    Insert {
        path: KeyPath,
        index: usize,
        values: Vec<Value>,
    },
    /// Remove `count` elements from the array at `path`, starting at `index`.
    Remove {
        path: KeyPath,
        index: usize,
        count: usize,
    },
}

impl ChangeRecord {
    pub fn path(&self) -> &KeyPath {
        match self {
            ChangeRecord::Set { path, .. }
            | ChangeRecord::Unset { path }
            | ChangeRecord::Insert { path, .. }
            | ChangeRecord::Remove { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeRecord::Set { .. } => "set",
            ChangeRecord::Unset { .. } => "unset",
            ChangeRecord::Insert { .. } => "insert",
            ChangeRecord::Remove { .. } => "remove",
        }
    }
}

impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeRecord::Set { path, value } => write!(f, "set {} = {}", path, value),
            ChangeRecord::Unset { path } => write!(f, "unset {}", path),
            ChangeRecord::Insert {
                path,
                index,
                values,
            } => write!(f, "insert {}[{}] +{}", path, index, values.len()),
            ChangeRecord::Remove { path, index, count } => {
                write!(f, "remove {}[{}] -{}", path, index, count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let change = ChangeRecord::Remove {
            path: KeyPath::root().child("items"),
            index: 1,
            count: 2,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "remove", "path": ["items"], "index": 1, "count": 2})
        );
        let back: ChangeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn test_display() {
        let change = ChangeRecord::Set {
            path: KeyPath::root().child("a"),
            value: Value::from(1i64),
        };
        assert_eq!(change.to_string(), "set /a = 1");
        assert_eq!(change.kind(), "set");
    }
}
