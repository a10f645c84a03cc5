//! Store configuration.

use ulid::Ulid;

/// Configuration for a [`crate::DocumentStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Replica id stamped on text created by this store.
    pub replica_id: String,
    /// Scheme of addressable document URIs.
    pub document_scheme: String,
    /// Scheme of snapshot aliases; these carry a document id only.
    pub snapshot_scheme: String,
    /// Maximum number of revisions retained per document, current included.
    pub history_limit: Option<usize>,
    /// Capacity of each document's change broadcast.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            replica_id: format!("replica-{}", Ulid::new()),
            document_scheme: "doc".to_string(),
            snapshot_scheme: "snapshot".to_string(),
            history_limit: None,
            event_capacity: 100,
        }
    }
}

/// Builder for store configuration.
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    pub fn replica_id(mut self, id: impl Into<String>) -> Self {
        self.config.replica_id = id.into();
        self
    }

    pub fn document_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.document_scheme = scheme.into();
        self
    }

    pub fn snapshot_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.snapshot_scheme = scheme.into();
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = Some(limit.max(1));
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
