use std::sync::Arc;

use tracing::{debug, warn};

use indexsync_core::error::{Error, Result};
use indexsync_core::traits::{IndexedEntity, ObjectIndexer};
use indexsync_core::types::IndexKind;

use crate::store::KindIndex;

/// Add/update/remove for one kind, each a full open-mutate-commit-close cycle.
///
/// All three go through the kind's writer lock, so an update's lookup and its
/// replace never interleave with another mutation of the same kind.
pub struct EntityIndexer {
	index: Arc<KindIndex>,
}

impl EntityIndexer {
	pub fn new(index: Arc<KindIndex>) -> Self { Self { index } }

	/// Reject entities that would touch the wrong index or an unkeyed document.
	fn check<'e>(&self, entity: &'e dyn IndexedEntity) -> Result<&'e str> {
		let kind = self.index.kind();
		if entity.kind() != kind {
			return Err(Error::KindMismatch { expected: kind, found: entity.kind() });
		}
		let key = entity.uuid();
		if key.trim().is_empty() { return Err(Error::MissingKey(kind)); }
		Ok(key)
	}
}

impl ObjectIndexer for EntityIndexer {
	fn kind(&self) -> IndexKind { self.index.kind() }

	fn search_fields(&self) -> &'static [&'static str] { self.index.kind().search_fields() }

	fn add(&self, entity: &dyn IndexedEntity) -> Result<()> {
		let key = self.check(entity)?;
		let doc = entity.to_document();
		let mut session = self.index.open_writer()?;
		session.add_document(&doc)?;
		session.commit()?;
		session.close()?;
		debug!(kind = %self.kind(), uuid = key, "added");
		Ok(())
	}

	fn update(&self, entity: &dyn IndexedEntity) -> Result<()> {
		let key = self.check(entity)?;
		let doc = entity.to_document();
		let mut session = self.index.open_writer()?;
		if session.get_by_key(key)?.is_none() {
			warn!(kind = %self.kind(), uuid = key, "could not find object in index, adding");
			session.add_document(&doc)?;
		} else {
			session.update_document(key, &doc)?;
		}
		session.commit()?;
		session.close()?;
		debug!(kind = %self.kind(), uuid = key, "updated");
		Ok(())
	}

	fn remove(&self, entity: &dyn IndexedEntity) -> Result<()> {
		let key = self.check(entity)?;
		let mut session = self.index.open_writer()?;
		session.delete_by_key(key)?;
		session.commit()?;
		session.close()?;
		debug!(kind = %self.kind(), uuid = key, "removed");
		Ok(())
	}
}
