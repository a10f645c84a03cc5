//! Structural diff between two value trees.

use crate::change::ChangeRecord;
use docpatch_core::{KeyPath, Map, Value};
use similar::algorithms::{myers, Capture, Replace};
use similar::DiffOp;

/// Compute the change records that turn `old` into `new`.
///
/// Maps are compared key by key and arrays element by element; containers
/// of the same kind are recursed into rather than replaced. Replaying the
/// result in order with [`crate::apply`] on a copy of `old` yields a tree
/// equal to `new`.
pub fn diff(old: &Value, new: &Value) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    diff_at(&KeyPath::root(), old, new, &mut changes);
    changes
}

fn diff_at(path: &KeyPath, old: &Value, new: &Value, out: &mut Vec<ChangeRecord>) {
    match (old, new) {
        (Value::Map(a), Value::Map(b)) => diff_maps(path, a, b, out),
        (Value::Array(a), Value::Array(b)) => diff_arrays(path, a, b, out),
        _ if old == new => {}
        _ => out.push(ChangeRecord::Set {
            path: path.clone(),
            value: new.clone(),
        }),
    }
}

fn diff_maps(path: &KeyPath, old: &Map, new: &Map, out: &mut Vec<ChangeRecord>) {
    for key in old.keys() {
        if !new.contains_key(key) {
            out.push(ChangeRecord::Unset {
                path: path.child(key.as_str()),
            });
        }
    }

    for (key, new_value) in new {
        let child = path.child(key.as_str());
        match old.get(key) {
            Some(old_value) => diff_at(&child, old_value, new_value, out),
            None => out.push(ChangeRecord::Set {
                path: child,
                value: new_value.clone(),
            }),
        }
    }
}

fn diff_arrays(path: &KeyPath, old: &[Value], new: &[Value], out: &mut Vec<ChangeRecord>) {
    let mut hook = Replace::new(Capture::new());
    if let Err(never) = myers::diff(&mut hook, old, 0..old.len(), new, 0..new.len()) {
        match never {}
    }

    // Every op's new_index is where the array cursor sits once the ops
    // before it have been replayed.
    for op in hook.into_inner().into_ops() {
        match op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_len, new_index, ..
            } => out.push(ChangeRecord::Remove {
                path: path.clone(),
                index: new_index,
                count: old_len,
            }),
            DiffOp::Insert {
                new_index, new_len, ..
            } => out.push(ChangeRecord::Insert {
                path: path.clone(),
                index: new_index,
                values: new[new_index..new_index + new_len].to_vec(),
            }),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);
                for offset in 0..paired {
                    diff_at(
                        &path.child(new_index + offset),
                        &old[old_index + offset],
                        &new[new_index + offset],
                        out,
                    );
                }
                let tail = new_index + paired;
                if old_len > paired {
                    out.push(ChangeRecord::Remove {
                        path: path.clone(),
                        index: tail,
                        count: old_len - paired,
                    });
                } else if new_len > paired {
                    out.push(ChangeRecord::Insert {
                        path: path.clone(),
                        index: tail,
                        values: new[tail..new_index + new_len].to_vec(),
                    });
                }
            }
        }
    }
}
