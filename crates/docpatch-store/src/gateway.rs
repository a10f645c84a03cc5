//! URI-level access to a [`DocumentStore`].

use crate::content::{self, ContentKind};
use crate::error::{Result, StoreError};
use crate::store::{DocEvent, DocumentId, DocumentStore};
use crate::uri::{DocumentUriDetails, UriResolver};
use docpatch_core::{resolve_sub_value, resolve_sub_value_mut, Map, Value};
use docpatch_diff::assign_at;
use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Title given to documents created through the gateway.
pub const NEW_DOCUMENT_TITLE: &str = "New Document";

/// Reads, writes and watches documents addressed by URI.
#[derive(Clone)]
pub struct DocumentGateway {
    store: Arc<DocumentStore>,
    resolver: UriResolver,
}

impl DocumentGateway {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        let resolver = UriResolver::from_config(store.config());
        Self { store, resolver }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn resolver(&self) -> &UriResolver {
        &self.resolver
    }

    fn details(&self, uri: &str) -> Result<DocumentUriDetails> {
        self.resolver
            .interpret(uri)
            .ok_or_else(|| StoreError::NotADocumentUri(uri.to_string()))
    }

    fn writable(&self, uri: &str) -> Result<DocumentUriDetails> {
        let details = self.details(uri)?;
        if details.is_historical() {
            return Err(StoreError::ReadOnlySnapshot(uri.to_string()));
        }
        Ok(details)
    }

    fn root_for(&self, details: &DocumentUriDetails) -> Result<Value> {
        let id = DocumentId::from(details.doc_id.as_str());
        match details.history {
            Some(history) => self.store.materialize(&id, history),
            None => self.store.doc(&id),
        }
    }

    /// The sub-value a URI addresses, live or at its `history` revision.
    pub fn open_document_uri(&self, uri: &str) -> Result<Value> {
        let details = self.details(uri)?;
        let root = self.root_for(&details)?;
        Ok(resolve_sub_value(&root, &details.key_path)?.clone())
    }

    /// Follow the sub-value a URI addresses.
    ///
    /// Live URIs yield the current value first and then once per commit.
    /// Historical URIs yield the materialized value once.
    pub fn watch_document_uri(&self, uri: &str) -> Result<DocumentWatch> {
        let details = self.details(uri)?;
        let id = DocumentId::from(details.doc_id.as_str());

        let source = match details.history {
            Some(history) => WatchSource::Historical(Some(self.store.materialize(&id, history)?)),
            None => {
                let (root, events) = self.store.open(&id)?.subscribe_with_snapshot()?;
                WatchSource::Live {
                    initial: Some(root),
                    events,
                }
            }
        };

        Ok(DocumentWatch {
            key_path: details.key_path,
            source,
        })
    }

    /// Write `value` at the location a URI addresses, as one change.
    pub fn set_document_uri(&self, uri: &str, value: Value) -> Result<()> {
        let details = self.writable(uri)?;
        let id = DocumentId::from(details.doc_id.as_str());
        self.store
            .change(&id, |root| Ok(assign_at(root, &details.key_path, value)?))?;
        debug!(uri, "wrote document uri");
        Ok(())
    }

    /// Run `f` on the deepest container along the URI's key path.
    ///
    /// Trailing segments that name leaves or missing keys are dropped; the
    /// returned URI addresses the container `f` actually received.
    pub fn change_document_uri<F>(&self, uri: &str, f: F) -> Result<String>
    where
        F: FnOnce(&mut Value) -> Result<()>,
    {
        let details = self.writable(uri)?;
        let id = DocumentId::from(details.doc_id.as_str());

        self.store.change(&id, |root| {
            let mut key_path = details.key_path.clone();
            while !key_path.is_empty() {
                match resolve_sub_value(root, &key_path) {
                    Ok(value) if value.is_container() => break,
                    _ => {
                        key_path.pop();
                    }
                }
            }

            f(resolve_sub_value_mut(root, &key_path)?)?;
            Ok(details.with_key_path(key_path).to_uri())
        })
    }

    /// Create an empty titled document and return its URI.
    pub fn create_document_uri(&self) -> String {
        let mut initial = Map::new();
        initial.insert("title".to_string(), Value::from(NEW_DOCUMENT_TITLE));
        let id = self.store.create(initial);
        self.resolver.document_url(id.as_str())
    }

    pub fn remove_document_uri(&self, uri: &str) -> Result<()> {
        let details = self.details(uri)?;
        self.store.destroy(&DocumentId::from(details.doc_id.as_str()))
    }

    pub fn exists(&self, uri: &str) -> bool {
        self.resolver
            .interpret(uri)
            .is_some_and(|details| self.store.exists(&DocumentId::from(details.doc_id.as_str())))
    }

    /// Fork the addressed document and return the new document's URI.
    pub fn fork_document_uri(&self, uri: &str) -> Result<String> {
        let details = self.details(uri)?;
        let fork = self.store.fork(&DocumentId::from(details.doc_id.as_str()))?;
        Ok(self.resolver.document_url(fork.as_str()))
    }

    /// Render the addressed sub-value as bytes.
    pub fn read_content(&self, uri: &str) -> Result<(ContentKind, Vec<u8>)> {
        content::render(&self.open_document_uri(uri)?)
    }

    /// Parse `bytes` as `kind` and write the result at the addressed location.
    pub fn write_content(&self, uri: &str, bytes: &[u8], kind: ContentKind) -> Result<()> {
        let value = content::parse(kind, bytes)?;
        self.set_document_uri(uri, value)
    }
}

enum WatchSource {
    Live {
        initial: Option<Value>,
        events: broadcast::Receiver<DocEvent>,
    },
    Historical(Option<Value>),
}

/// Sub-values of a watched document URI.
pub struct DocumentWatch {
    key_path: Vec<String>,
    source: WatchSource,
}

impl DocumentWatch {
    /// Wait for the next value. `None` once the document is gone or the
    /// historical value has been delivered.
    pub async fn next(&mut self) -> Option<Result<Value>> {
        let root = match &mut self.source {
            WatchSource::Historical(value) => value.take()?,
            WatchSource::Live { initial, events } => match initial.take() {
                Some(root) => root,
                None => loop {
                    match events.recv().await {
                        Ok(DocEvent::Changed { snapshot, .. }) => break snapshot,
                        Ok(DocEvent::Destroyed { .. }) | Err(RecvError::Closed) => return None,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "document watch lagged");
                        }
                    }
                },
            },
        };

        Some(
            resolve_sub_value(&root, &self.key_path)
                .map(Value::clone)
                .map_err(StoreError::from),
        )
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> {
        stream::unfold(self, |mut watch| async move {
            let item = watch.next().await?;
            Some((item, watch))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> DocumentGateway {
        DocumentGateway::new(Arc::new(DocumentStore::default()))
    }

    #[test]
    fn test_create_and_open() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        assert!(uri.starts_with("doc:/"));
        assert!(gateway.exists(&uri));
        assert_eq!(
            gateway.open_document_uri(&format!("{}/title", uri)).unwrap(),
            Value::from(NEW_DOCUMENT_TITLE)
        );
    }

    #[test]
    fn test_not_a_document_uri() {
        let gateway = gateway();
        assert!(matches!(
            gateway.open_document_uri("https://example.com"),
            Err(StoreError::NotADocumentUri(_))
        ));
        assert!(!gateway.exists("https://example.com"));
    }

    #[test]
    fn test_historical_uri_is_read_only() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        let err = gateway
            .set_document_uri(&format!("{}/title?history=0", uri), Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::ReadOnlySnapshot(_)));
    }

    #[test]
    fn test_change_document_uri_trims_to_container() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        gateway
            .set_document_uri(&format!("{}/meta", uri), Value::from(json!({"n": 1})))
            .unwrap();

        let rewritten = gateway
            .change_document_uri(&format!("{}/meta/n/deeper", uri), |meta| {
                if let Some(map) = meta.as_map_mut() {
                    map.insert("n".to_string(), Value::from(2i64));
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(rewritten, format!("{}/meta", uri));
        assert_eq!(
            gateway.open_document_uri(&rewritten).unwrap(),
            Value::from(json!({"n": 2}))
        );
    }

    #[test]
    fn test_fork_and_remove() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        let fork = gateway.fork_document_uri(&uri).unwrap();
        assert_ne!(fork, uri);
        gateway.remove_document_uri(&uri).unwrap();
        assert!(!gateway.exists(&uri));
        assert!(gateway.exists(&fork));
    }

    #[test]
    fn test_historical_watch_blocking() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        let mut watch = gateway
            .watch_document_uri(&format!("{}/title?history=0", uri))
            .unwrap();
        let first = tokio_test::block_on(watch.next());
        assert_eq!(first.unwrap().unwrap(), Value::from(NEW_DOCUMENT_TITLE));
        assert!(tokio_test::block_on(watch.next()).is_none());
    }

    #[test]
    fn test_content_round_trip() {
        let gateway = gateway();
        let uri = gateway.create_document_uri();
        let title = format!("{}/title", uri);

        gateway
            .write_content(&title, b"Shopping", ContentKind::Text)
            .unwrap();
        assert_eq!(
            gateway.read_content(&title).unwrap(),
            (ContentKind::Text, b"Shopping".to_vec())
        );

        let err = gateway
            .write_content(&uri, b"[1]", ContentKind::Object)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject(_)));
    }
}
