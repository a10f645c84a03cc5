//! Versioned in-memory document store.
//!
//! Every document is a map-rooted [`Value`] with a linear history of
//! snapshots. Mutations run as closures under a per-document lock against a
//! working copy of the root; a closure that returns `Ok` commits one revision
//! and one [`DocEvent`], a closure that fails leaves the document untouched.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use docpatch_core::{ChangeGateway, Map, Value};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use ulid::Ulid;

/// Unique identifier for a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Events emitted on a document's broadcast channel.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocEvent {
    /// A change committed; `snapshot` is the full document after it.
    Changed {
        doc_id: DocumentId,
        revision: usize,
        snapshot: Value,
    },
    /// The document was destroyed. No further events follow.
    Destroyed { doc_id: DocumentId },
}

struct DocumentState {
    /// Retained snapshots, oldest first. The back is the live root.
    snapshots: VecDeque<Value>,
    /// Revisions dropped from the front by the history limit.
    dropped: usize,
    destroyed: bool,
}

impl DocumentState {
    fn new(root: Value) -> Self {
        Self {
            snapshots: VecDeque::from([root]),
            dropped: 0,
            destroyed: false,
        }
    }

    fn current(&self) -> &Value {
        // Never empty: created with one snapshot and trimmed down to one at most.
        &self.snapshots[self.snapshots.len() - 1]
    }

    fn revision(&self) -> usize {
        self.dropped + self.snapshots.len() - 1
    }

    fn commit(&mut self, root: Value, history_limit: Option<usize>) {
        self.snapshots.push_back(root);
        if let Some(limit) = history_limit {
            while self.snapshots.len() > limit.max(1) {
                self.snapshots.pop_front();
                self.dropped += 1;
            }
        }
    }

    fn at(&self, doc_id: &DocumentId, history: usize) -> Result<&Value> {
        history
            .checked_sub(self.dropped)
            .and_then(|offset| self.snapshots.get(offset))
            .ok_or_else(|| StoreError::HistoryOutOfRange {
                doc_id: doc_id.to_string(),
                requested: history,
                oldest: self.dropped,
                latest: self.revision(),
            })
    }
}

struct DocumentEntry {
    id: DocumentId,
    state: Mutex<DocumentState>,
    event_tx: broadcast::Sender<DocEvent>,
    history_limit: Option<usize>,
}

impl DocumentEntry {
    fn new(id: DocumentId, root: Value, config: &StoreConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            id,
            state: Mutex::new(DocumentState::new(root)),
            event_tx,
            history_limit: config.history_limit,
        }
    }

    fn change<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Value) -> Result<T>,
    {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(StoreError::DocumentNotFound(self.id.to_string()));
        }

        let mut working = state.current().clone();
        let output = match f(&mut working) {
            Ok(output) => output,
            Err(err) => {
                warn!(doc_id = %self.id, error = %err, "change aborted");
                return Err(err);
            }
        };

        if !matches!(working, Value::Map(_)) {
            warn!(doc_id = %self.id, kind = %working.kind(), "change left a non-object root");
            return Err(StoreError::RootNotObject(self.id.to_string()));
        }

        if &working == state.current() {
            trace!(doc_id = %self.id, "change produced no difference");
            return Ok(output);
        }

        state.commit(working.clone(), self.history_limit);
        let revision = state.revision();
        debug!(doc_id = %self.id, revision, "committed change");

        // No receivers is fine.
        let _ = self.event_tx.send(DocEvent::Changed {
            doc_id: self.id.clone(),
            revision,
            snapshot: working,
        });

        Ok(output)
    }

    fn snapshot(&self) -> Result<Value> {
        let state = self.state.lock();
        if state.destroyed {
            return Err(StoreError::DocumentNotFound(self.id.to_string()));
        }
        Ok(state.current().clone())
    }
}

/// A subscribable handle on one document.
#[derive(Clone)]
pub struct DocHandle {
    entry: Arc<DocumentEntry>,
}

impl DocHandle {
    pub fn id(&self) -> &DocumentId {
        &self.entry.id
    }

    /// Receive a [`DocEvent`] for every commit made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DocEvent> {
        self.entry.event_tx.subscribe()
    }

    /// Current root of the document.
    pub fn snapshot(&self) -> Result<Value> {
        self.entry.snapshot()
    }

    /// Number of committed changes.
    pub fn revision(&self) -> usize {
        self.entry.state.lock().revision()
    }

    /// Subscribe and take the current root under one lock, so no commit can
    /// fall between the two.
    pub fn subscribe_with_snapshot(&self) -> Result<(Value, broadcast::Receiver<DocEvent>)> {
        let state = self.entry.state.lock();
        if state.destroyed {
            return Err(StoreError::DocumentNotFound(self.entry.id.to_string()));
        }
        Ok((state.current().clone(), self.entry.event_tx.subscribe()))
    }

    /// Run `f` against the document; see [`DocumentStore::change`].
    pub fn change<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Value) -> Result<T>,
    {
        self.entry.change(f)
    }
}

/// In-memory store of versioned, map-rooted documents.
pub struct DocumentStore {
    config: StoreConfig,
    documents: RwLock<HashMap<DocumentId, Arc<DocumentEntry>>>,
}

impl DocumentStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn replica_id(&self) -> &str {
        &self.config.replica_id
    }

    fn entry(&self, id: &DocumentId) -> Result<Arc<DocumentEntry>> {
        self.documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))
    }

    /// Create a document whose root is `initial`.
    pub fn create(&self, initial: Map) -> DocumentId {
        let id = DocumentId::new();
        let entry = DocumentEntry::new(id.clone(), Value::Map(initial), &self.config);
        self.documents.write().insert(id.clone(), Arc::new(entry));
        debug!(doc_id = %id, "created document");
        id
    }

    /// Remove a document. Open handles receive [`DocEvent::Destroyed`].
    pub fn destroy(&self, id: &DocumentId) -> Result<()> {
        let entry = self
            .documents
            .write()
            .remove(id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        entry.state.lock().destroyed = true;
        let _ = entry
            .event_tx
            .send(DocEvent::Destroyed { doc_id: id.clone() });
        debug!(doc_id = %id, "destroyed document");
        Ok(())
    }

    pub fn exists(&self, id: &DocumentId) -> bool {
        self.documents.read().contains_key(id)
    }

    /// Ids of every live document, sorted.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.documents.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn open(&self, id: &DocumentId) -> Result<DocHandle> {
        Ok(DocHandle {
            entry: self.entry(id)?,
        })
    }

    /// Current root of a document.
    pub fn doc(&self, id: &DocumentId) -> Result<Value> {
        self.entry(id)?.snapshot()
    }

    /// Root of a document after `history` committed changes; 0 is the
    /// initial root.
    pub fn materialize(&self, id: &DocumentId, history: usize) -> Result<Value> {
        let entry = self.entry(id)?;
        let state = entry.state.lock();
        let root = state.at(id, history)?.clone();
        Ok(root)
    }

    /// Number of committed changes.
    pub fn history_len(&self, id: &DocumentId) -> Result<usize> {
        Ok(self.entry(id)?.state.lock().revision())
    }

    /// Copy the current root into a new document with a fresh history.
    pub fn fork(&self, id: &DocumentId) -> Result<DocumentId> {
        let root = self.doc(id)?;
        let fork_id = DocumentId::new();
        let entry = DocumentEntry::new(fork_id.clone(), root, &self.config);
        self.documents.write().insert(fork_id.clone(), Arc::new(entry));
        debug!(doc_id = %id, fork = %fork_id, "forked document");
        Ok(fork_id)
    }

    /// Run `f` with exclusive access to a working copy of the document root.
    ///
    /// Closures on the same document run one at a time. The copy becomes the
    /// new root only if `f` returns `Ok` and leaves an object root behind.
    /// `f` must not call back into the same document.
    pub fn change<T, F>(&self, id: &DocumentId, f: F) -> Result<T>
    where
        F: FnOnce(&mut Value) -> Result<T>,
    {
        self.entry(id)?.change(f)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl ChangeGateway for DocumentStore {
    type Error = StoreError;

    fn change<T, F>(&self, doc_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Value) -> Result<T>,
    {
        DocumentStore::change(self, &DocumentId::from(doc_id), f)
    }
}
