//! TextSequence - collaborative text leaf based on a Replicated Growable Array.
//!
//! Every character carries a stable identity, so a document that edits text
//! through `insert_char`/`delete_char` keeps the identity of every character
//! it did not touch. Replacing the whole leaf would throw that away; the
//! reconciler in `docpatch-diff` exists to avoid it.
//!
//! Deleted characters stay behind as tombstones only while a later character
//! hangs off them.
//!
//! Positions are counted in Unicode scalar values (`char`), never in bytes or
//! UTF-16 code units.

use crate::error::{DocError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Unique identifier for a character in the text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharId {
    /// The replica that created this character.
    pub replica: String,
    /// Sequence number within that replica.
    pub seq: u64,
}

impl CharId {
    pub fn new(replica: impl Into<String>, seq: u64) -> Self {
        Self {
            replica: replica.into(),
            seq,
        }
    }

    /// The virtual start of the text.
    pub fn genesis() -> Self {
        Self {
            replica: String::new(),
            seq: 0,
        }
    }
}

impl PartialOrd for CharId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher sequence = later in causal order
        // Tie-break on replica ID for determinism
        self.seq
            .cmp(&other.seq)
            .then_with(|| self.replica.cmp(&other.replica))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct CharNode {
    id: CharId,
    /// None once deleted.
    ch: Option<char>,
    /// The character this one was inserted after.
    origin: CharId,
    deleted: bool,
}

impl CharNode {
    fn new(id: CharId, ch: char, origin: CharId) -> Self {
        Self {
            id,
            ch: Some(ch),
            origin,
            deleted: false,
        }
    }
}

/// Collaborative text sequence.
///
/// Only single-position insert and delete are exposed as mutations; bulk
/// helpers are loops over them.
#[derive(Clone, Debug)]
pub struct TextSequence {
    nodes: HashMap<CharId, CharNode>,
    /// origin -> children, sorted descending by id (RGA order).
    children: HashMap<CharId, Vec<CharId>>,
    replica_id: String,
    /// Lamport-style counter; advanced past every id integrated.
    seq: u64,
}

impl TextSequence {
    /// Create a new empty text.
    pub fn new(replica_id: impl Into<String>) -> Self {
        let mut text = Self {
            nodes: HashMap::new(),
            children: HashMap::new(),
            replica_id: replica_id.into(),
            seq: 0,
        };
        text.children.insert(CharId::genesis(), Vec::new());
        text
    }

    /// Create a text holding `content`.
    pub fn from_text(replica_id: impl Into<String>, content: &str) -> Self {
        let mut text = Self::new(replica_id);
        text.push_str(content);
        text
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    fn next_id(&mut self) -> CharId {
        self.seq += 1;
        CharId::new(&self.replica_id, self.seq)
    }

    /// Insert one character so that it ends up at `position`.
    pub fn insert_char(&mut self, position: usize, ch: char) -> Result<()> {
        let origin = if position == 0 {
            CharId::genesis()
        } else {
            self.id_at_index(position - 1)
                .ok_or(DocError::TextOutOfBounds {
                    index: position,
                    length: self.len(),
                })?
        };

        let id = self.next_id();
        self.integrate_node(CharNode::new(id, ch, origin));
        Ok(())
    }

    /// Delete the character at `position`, returning it.
    pub fn delete_char(&mut self, position: usize) -> Result<char> {
        let id = self
            .id_at_index(position)
            .ok_or(DocError::TextOutOfBounds {
                index: position,
                length: self.len(),
            })?;
        self.delete_by_id(&id).ok_or(DocError::TextOutOfBounds {
            index: position,
            length: self.len(),
        })
    }

    /// Insert a string at `position`, one character at a time.
    pub fn insert(&mut self, position: usize, text: &str) -> Result<()> {
        for (offset, ch) in text.chars().enumerate() {
            self.insert_char(position + offset, ch)?;
        }
        Ok(())
    }

    /// Append a string at the end.
    pub fn push_str(&mut self, text: &str) {
        // The end position always exists, so inserts there cannot fail.
        let mut origin = self.visible_ids().last().cloned().unwrap_or_else(CharId::genesis);
        for ch in text.chars() {
            let id = self.next_id();
            self.integrate_node(CharNode::new(id.clone(), ch, origin));
            origin = id;
        }
    }

    /// Delete `length` characters starting at `start`.
    pub fn delete(&mut self, start: usize, length: usize) -> Result<()> {
        for _ in 0..length {
            self.delete_char(start)?;
        }
        Ok(())
    }

    fn delete_by_id(&mut self, id: &CharId) -> Option<char> {
        let node = self.nodes.get_mut(id)?;
        if node.deleted {
            return None;
        }
        node.deleted = true;
        let ch = node.ch.take();
        self.prune(id.clone());
        ch
    }

    /// Drop tombstones that no character is anchored to, walking up the
    /// origin chain while that keeps freeing nodes.
    fn prune(&mut self, mut id: CharId) {
        loop {
            let removable = self.nodes.get(&id).is_some_and(|node| node.deleted)
                && self.children.get(&id).map_or(true, Vec::is_empty);
            if !removable {
                return;
            }

            let Some(node) = self.nodes.remove(&id) else {
                return;
            };
            self.children.remove(&id);
            if let Some(siblings) = self.children.get_mut(&node.origin) {
                siblings.retain(|sibling| sibling != &id);
            }
            id = node.origin;
        }
    }

    /// Number of visible characters.
    pub fn len(&self) -> usize {
        self.nodes.values().filter(|n| !n.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Characters held in storage, tombstones included.
    pub fn stored_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn char_at(&self, position: usize) -> Option<char> {
        self.iter().nth(position)
    }

    /// Iterate over visible characters.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.iter_nodes()
            .filter(|n| !n.deleted)
            .filter_map(|n| n.ch)
    }

    /// Compare visible content against a plain string.
    pub fn eq_str(&self, other: &str) -> bool {
        self.iter().eq(other.chars())
    }

    fn id_at_index(&self, index: usize) -> Option<CharId> {
        self.visible_ids().nth(index).cloned()
    }

    fn visible_ids(&self) -> impl Iterator<Item = &CharId> + '_ {
        self.iter_nodes().filter(|n| !n.deleted).map(|n| &n.id)
    }

    /// Visible position of a character id, if it is still visible.
    pub fn id_to_position(&self, id: &CharId) -> Option<usize> {
        self.visible_ids().position(|i| i == id)
    }

    pub fn position_to_id(&self, position: usize) -> Option<CharId> {
        self.id_at_index(position)
    }

    fn iter_nodes(&self) -> impl Iterator<Item = &CharNode> + '_ {
        NodeIter {
            text: self,
            stack: vec![CharId::genesis()],
            visited: HashSet::new(),
        }
    }

    fn integrate_node(&mut self, node: CharNode) {
        let id = node.id.clone();
        let origin = node.origin.clone();
        self.seq = self.seq.max(id.seq);

        self.nodes.insert(id.clone(), node);

        let children = self.children.entry(origin).or_default();
        let pos = children
            .iter()
            .position(|c| c < &id)
            .unwrap_or(children.len());
        children.insert(pos, id.clone());

        self.children.entry(id).or_default();
    }
}

struct NodeIter<'a> {
    text: &'a TextSequence,
    stack: Vec<CharId>,
    visited: HashSet<CharId>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a CharNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id.clone()) {
                continue;
            }

            if let Some(children) = self.text.children.get(&id) {
                for child in children.iter().rev() {
                    if !self.visited.contains(child) {
                        self.stack.push(child.clone());
                    }
                }
            }

            if id != CharId::genesis() {
                if let Some(node) = self.text.nodes.get(&id) {
                    return Some(node);
                }
            }
        }
        None
    }
}

impl std::fmt::Display for TextSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.iter() {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

impl PartialEq for TextSequence {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Default for TextSequence {
    fn default() -> Self {
        Self::new("")
    }
}
