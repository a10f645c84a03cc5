//! Character-level text reconciliation.
//!
//! `reconcile` computes Equal/Insert/Delete runs between two strings using
//! the `similar` crate; `apply` replays them against a live character
//! sequence as single-character inserts and deletes, so a collaborative text
//! keeps the identity of every character it did not touch.

use docpatch_core::{DocError, Result, TextSequence};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// One run of a text edit script. Lengths are in `char`s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "lowercase")]
pub enum EditOp {
    Equal(usize),
    Insert(String),
    Delete(String),
}

impl EditOp {
    /// Number of characters this run covers.
    pub fn len(&self) -> usize {
        match self {
            EditOp::Equal(n) => *n,
            EditOp::Insert(s) | EditOp::Delete(s) => s.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary statistics for an applied edit script
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub chars_inserted: usize,
    pub chars_deleted: usize,
    pub unchanged_chars: usize,
}

impl ReconcileSummary {
    /// Atomic operations issued against the sequence.
    pub fn operation_count(&self) -> usize {
        self.chars_inserted + self.chars_deleted
    }
}

/// A text container that only mutates one position at a time.
pub trait CharSequence {
    fn char_len(&self) -> usize;

    fn content(&self) -> String;

    fn insert_char(&mut self, position: usize, ch: char) -> Result<()>;

    fn delete_char(&mut self, position: usize) -> Result<char>;
}

impl CharSequence for TextSequence {
    fn char_len(&self) -> usize {
        self.len()
    }

    fn content(&self) -> String {
        self.to_string()
    }

    fn insert_char(&mut self, position: usize, ch: char) -> Result<()> {
        TextSequence::insert_char(self, position, ch)
    }

    fn delete_char(&mut self, position: usize) -> Result<char> {
        TextSequence::delete_char(self, position)
    }
}

impl CharSequence for Vec<char> {
    fn char_len(&self) -> usize {
        self.len()
    }

    fn content(&self) -> String {
        self.iter().collect()
    }

    fn insert_char(&mut self, position: usize, ch: char) -> Result<()> {
        if position > self.len() {
            return Err(DocError::TextOutOfBounds {
                index: position,
                length: self.len(),
            });
        }
        self.insert(position, ch);
        Ok(())
    }

    fn delete_char(&mut self, position: usize) -> Result<char> {
        if position >= self.len() {
            return Err(DocError::TextOutOfBounds {
                index: position,
                length: self.len(),
            });
        }
        Ok(self.remove(position))
    }
}

/// Compute the edit script turning `old` into `new`.
///
/// Adjacent changes with the same tag are merged into one run.
pub fn reconcile(old: &str, new: &str) -> Vec<EditOp> {
    let diff = TextDiff::from_chars(old, new);
    let mut ops: Vec<EditOp> = Vec::new();

    for change in diff.iter_all_changes() {
        let value = change.value();
        match (change.tag(), ops.last_mut()) {
            (ChangeTag::Equal, Some(EditOp::Equal(n))) => *n += value.chars().count(),
            (ChangeTag::Insert, Some(EditOp::Insert(s))) => s.push_str(value),
            (ChangeTag::Delete, Some(EditOp::Delete(s))) => s.push_str(value),
            (ChangeTag::Equal, _) => ops.push(EditOp::Equal(value.chars().count())),
            (ChangeTag::Insert, _) => ops.push(EditOp::Insert(value.to_string())),
            (ChangeTag::Delete, _) => ops.push(EditOp::Delete(value.to_string())),
        }
    }

    ops
}

/// Replay `ops` against `text`.
///
/// The cursor advances over equal and inserted runs; deletes stay at the
/// cursor because each one shifts the rest of the text left.
pub fn apply<S: CharSequence + ?Sized>(text: &mut S, ops: &[EditOp]) -> Result<ReconcileSummary> {
    let mut idx = 0usize;
    let mut summary = ReconcileSummary::default();

    for op in ops {
        match op {
            EditOp::Equal(len) => {
                idx += len;
                if idx > text.char_len() {
                    return Err(DocError::TextOutOfBounds {
                        index: idx,
                        length: text.char_len(),
                    });
                }
                summary.unchanged_chars += len;
            }
            EditOp::Insert(s) => {
                for ch in s.chars() {
                    text.insert_char(idx, ch)?;
                    idx += 1;
                    summary.chars_inserted += 1;
                }
            }
            EditOp::Delete(s) => {
                for _ in s.chars() {
                    text.delete_char(idx)?;
                    summary.chars_deleted += 1;
                }
            }
        }
    }

    Ok(summary)
}

/// Bring `text` to `new` through the minimal edit script.
pub fn reconcile_text<S: CharSequence + ?Sized>(text: &mut S, new: &str) -> Result<ReconcileSummary> {
    let old = text.content();
    let ops = reconcile(&old, new);
    apply(text, &ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(old: &str, new: &str) -> String {
        let mut chars: Vec<char> = old.chars().collect();
        apply(&mut chars, &reconcile(old, new)).unwrap();
        chars.into_iter().collect()
    }

    #[test]
    fn test_single_char_change_is_two_ops() {
        let ops = reconcile("abc", "abd");
        let edits: Vec<_> = ops
            .iter()
            .filter(|op| !matches!(op, EditOp::Equal(_)))
            .collect();
        assert_eq!(edits.len(), 2);
        assert!(edits.contains(&&EditOp::Delete("c".to_string())));
        assert!(edits.contains(&&EditOp::Insert("d".to_string())));
        assert_eq!(ops.first(), Some(&EditOp::Equal(2)));
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(reconcile("same", "same"), vec![EditOp::Equal(4)]);
        assert!(reconcile("", "").is_empty());
    }

    #[test]
    fn test_replay_reaches_target() {
        assert_eq!(replay("Hello World", "Hello Rust"), "Hello Rust");
        assert_eq!(replay("", "fresh"), "fresh");
        assert_eq!(replay("gone", ""), "");
        assert_eq!(replay("the cat sat", "a cat stood"), "a cat stood");
    }

    #[test]
    fn test_multibyte_positions_are_chars() {
        assert_eq!(replay("a😀c", "a😀d"), "a😀d");
        assert_eq!(replay("naïve", "naive"), "naive");
        let ops = reconcile("😀x", "😀y");
        assert_eq!(ops[0], EditOp::Equal(1));
    }

    #[test]
    fn test_consecutive_deletes_stay_at_cursor() {
        let mut chars: Vec<char> = "abcdef".chars().collect();
        let ops = vec![
            EditOp::Equal(1),
            EditOp::Delete("bcd".to_string()),
            EditOp::Equal(2),
        ];
        let summary = apply(&mut chars, &ops).unwrap();
        assert_eq!(chars.into_iter().collect::<String>(), "aef");
        assert_eq!(summary.chars_deleted, 3);
        assert_eq!(summary.unchanged_chars, 3);
    }

    #[test]
    fn test_script_longer_than_text_fails() {
        let mut chars: Vec<char> = "ab".chars().collect();
        let err = apply(&mut chars, &[EditOp::Equal(3)]).unwrap_err();
        assert_eq!(err, DocError::TextOutOfBounds { index: 3, length: 2 });
    }

    #[test]
    fn test_text_sequence_keeps_untouched_ids() {
        let mut text = TextSequence::from_text("r1", "Hello World");
        let original: Vec<_> = (0..text.len())
            .filter_map(|i| text.position_to_id(i))
            .collect();

        let summary = reconcile_text(&mut text, "Hello Rust").unwrap();

        assert_eq!(text.to_string(), "Hello Rust");
        assert_eq!(text.id_to_position(&original[0]), Some(0));
        let surviving = original
            .iter()
            .filter(|id| text.id_to_position(id).is_some())
            .count();
        assert_eq!(surviving, summary.unchanged_chars);
        assert_eq!(
            summary.operation_count(),
            summary.chars_inserted + summary.chars_deleted
        );
    }

    #[test]
    fn test_edit_op_wire_shape() {
        let json = serde_json::to_value(EditOp::Insert("x".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"op": "insert", "arg": "x"}));
    }
}
