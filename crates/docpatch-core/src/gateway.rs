//! Mutation scope contract between the patch engine and a document store.

use crate::error::DocError;
use crate::value::Value;

/// Runs closures with exclusive write access to a document's live root.
///
/// Implementations serialize closures per document and commit whatever the
/// closure did as one atomic change when it returns `Ok`. When it returns
/// `Err` nothing it did may become visible.
pub trait ChangeGateway {
    type Error: From<DocError>;

    fn change<T, F>(&self, doc_id: &str, f: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut Value) -> Result<T, Self::Error>;
}
