use crate::error::Result;
use crate::types::{Document, IndexKind};

/// A domain object that can be projected into an index document.
pub trait IndexedEntity: Send + Sync {
    fn kind(&self) -> IndexKind;

    /// Stable unique key; never changes across updates of the same entity.
    fn uuid(&self) -> &str;

    /// Map the entity onto its kind's schema. Pure and infallible: absent
    /// values become absent fields.
    fn to_document(&self) -> Document;
}

/// Keeps one kind's index in step with domain mutations.
///
/// Each call is a complete transaction: open writer, mutate, commit, close.
pub trait ObjectIndexer: Send + Sync {
    fn kind(&self) -> IndexKind;
    fn search_fields(&self) -> &'static [&'static str];
    fn add(&self, entity: &dyn IndexedEntity) -> Result<()>;
    fn update(&self, entity: &dyn IndexedEntity) -> Result<()>;
    fn remove(&self, entity: &dyn IndexedEntity) -> Result<()>;
}
