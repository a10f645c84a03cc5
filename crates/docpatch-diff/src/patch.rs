//! Replaying change records against a live value tree.
//!
//! Every record walks from the root to its parent container and fails fast
//! when a segment is missing or has the wrong kind. A string written onto an
//! existing text leaf is reconciled character by character instead of
//! replacing the leaf.

use crate::change::ChangeRecord;
use crate::structural::diff;
use crate::text::reconcile_text;
use docpatch_core::path::child;
use docpatch_core::{resolve_sub_value_mut, DocError, KeyPath, PathSegment, Result, Value};
use tracing::trace;

/// Apply `changes` in order.
///
/// Stops at the first record that does not fit the tree. Records before it
/// stay applied; callers that need all-or-nothing run this on a working copy.
pub fn apply(root: &mut Value, changes: &[ChangeRecord]) -> Result<()> {
    for change in changes {
        apply_one(root, change)?;
    }
    Ok(())
}

/// Apply a single change record.
pub fn apply_one(root: &mut Value, change: &ChangeRecord) -> Result<()> {
    trace!(change = %change, "applying change");

    let path = change.path();
    let (parent, key) = path.split_last();

    match change {
        ChangeRecord::Set { value, .. } => match key {
            None => merge_into(root, value),
            Some(key) => {
                let container = walk_mut(root, parent, path)?;
                set_child(container, key, value, path)
            }
        },
        ChangeRecord::Unset { .. } => match key {
            None => Ok(()),
            Some(key) => {
                let container = walk_mut(root, parent, path)?;
                unset_child(container, key, path)
            }
        },
        ChangeRecord::Insert { index, values, .. } => {
            let items = array_at(root, path)?;
            if *index > items.len() {
                return Err(DocError::inconsistency(
                    path,
                    format!("insert at {} past length {}", index, items.len()),
                ));
            }
            items.splice(*index..*index, values.iter().cloned());
            Ok(())
        }
        ChangeRecord::Remove { index, count, .. } => {
            let items = array_at(root, path)?;
            let end = index.saturating_add(*count);
            if end > items.len() {
                return Err(DocError::inconsistency(
                    path,
                    format!("remove {}..{} past length {}", index, end, items.len()),
                ));
            }
            items.drain(*index..end);
            Ok(())
        }
    }
}

/// Write `new_value` at `key_path` below `root`.
///
/// A leaf target, a missing key, or a non-container `new_value` is assigned
/// in place. When both sides are containers the existing subtree is patched
/// through a structural diff, so untouched descendants keep their identity.
pub fn assign_at(root: &mut Value, key_path: &[String], new_value: Value) -> Result<()> {
    let Some((last, parent)) = key_path.split_last() else {
        return patch_value(root, &new_value);
    };

    let container = resolve_sub_value_mut(root, parent)?;
    let existing_is_container = child(container, last).is_some_and(Value::is_container);
    let full_path: KeyPath = key_path.iter().map(String::as_str).collect();
    let key = PathSegment::Key(last.clone());

    if !existing_is_container || !new_value.is_container() {
        return set_child(container, &key, &new_value, &full_path);
    }

    let content = child_mut(container, &key, &full_path)?;
    patch_value(content, &new_value)
}

/// Patch `content` in place until it equals `target`.
pub fn patch_value(content: &mut Value, target: &Value) -> Result<()> {
    let changes = diff(content, target);
    trace!(changes = changes.len(), "patching subtree");
    apply(content, &changes)
}

fn segment_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Key(k) => k.parse().ok(),
    }
}

fn segment_key(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(k) => k.clone(),
        PathSegment::Index(i) => i.to_string(),
    }
}

fn child_mut<'a>(
    container: &'a mut Value,
    segment: &PathSegment,
    path: &KeyPath,
) -> Result<&'a mut Value> {
    let found = match container {
        Value::Map(map) => map.get_mut(&segment_key(segment)),
        Value::Array(items) => segment_index(segment).and_then(move |i| items.get_mut(i)),
        _ => None,
    };
    found.ok_or_else(|| DocError::inconsistency(path, format!("no child `{}`", segment)))
}

fn walk_mut<'a>(
    root: &'a mut Value,
    segments: &[PathSegment],
    path: &KeyPath,
) -> Result<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = child_mut(current, segment, path)?;
    }
    Ok(current)
}

fn array_at<'a>(root: &'a mut Value, path: &KeyPath) -> Result<&'a mut Vec<Value>> {
    let target = walk_mut(root, path.segments(), path)?;
    let found = target.kind();
    target.as_array_mut().ok_or_else(|| DocError::TypeMismatch {
        expected: "array".to_string(),
        found: found.to_string(),
    })
}

/// Write `value` over `slot`, reconciling text when possible.
fn overwrite(slot: &mut Value, value: &Value) -> Result<()> {
    if let (Value::Text(text), Some(content)) = (&mut *slot, value.to_text_content()) {
        reconcile_text(text, &content)?;
        return Ok(());
    }
    *slot = value.clone();
    Ok(())
}

fn set_child(
    container: &mut Value,
    segment: &PathSegment,
    value: &Value,
    path: &KeyPath,
) -> Result<()> {
    match container {
        Value::Map(map) => {
            let key = segment_key(segment);
            match map.get_mut(&key) {
                Some(slot) => overwrite(slot, value),
                None => {
                    map.insert(key, value.clone());
                    Ok(())
                }
            }
        }
        Value::Array(items) => {
            let index = segment_index(segment).ok_or_else(|| {
                DocError::inconsistency(path, format!("`{}` is not an array index", segment))
            })?;
            let len = items.len();
            if index == len {
                items.push(value.clone());
                Ok(())
            } else if let Some(slot) = items.get_mut(index) {
                overwrite(slot, value)
            } else {
                Err(DocError::inconsistency(
                    path,
                    format!("set at {} past length {}", index, len),
                ))
            }
        }
        other => Err(DocError::inconsistency(
            path,
            format!("cannot set a child on a {}", other.kind()),
        )),
    }
}

fn unset_child(container: &mut Value, segment: &PathSegment, path: &KeyPath) -> Result<()> {
    match container {
        Value::Map(map) => map
            .remove(&segment_key(segment))
            .map(|_| ())
            .ok_or_else(|| DocError::inconsistency(path, "key not present")),
        other => Err(DocError::inconsistency(
            path,
            format!("cannot unset a child on a {}", other.kind()),
        )),
    }
}

/// Set with an empty path: text reconciles, maps merge shallowly, anything
/// else is replaced.
fn merge_into(root: &mut Value, value: &Value) -> Result<()> {
    match value {
        Value::Map(entries) if root.as_map().is_some() => {
            for (key, entry) in entries {
                let path = KeyPath::root().child(key.as_str());
                set_child(root, &PathSegment::Key(key.clone()), entry, &path)?;
            }
            Ok(())
        }
        _ => overwrite(root, value),
    }
}
