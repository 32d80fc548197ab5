use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::error;

use indexsync_core::error::{Error, Result};
use indexsync_core::traits::{IndexedEntity, ObjectIndexer};
use indexsync_core::types::{FailurePolicy, IndexKind};

use crate::indexer::EntityIndexer;
use crate::store::IndexStore;

#[derive(Debug, Clone, Copy)]
enum Operation {
	Add,
	Update,
	Remove,
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Operation::Add => "adding",
			Operation::Update => "updating",
			Operation::Remove => "removing",
		})
	}
}

/// Routes an entity to its kind's indexer and applies the failure policy.
pub struct IndexerRegistry {
	indexers: BTreeMap<IndexKind, Arc<dyn ObjectIndexer>>,
	policy: FailurePolicy,
}

impl IndexerRegistry {
	/// One [`EntityIndexer`] per kind, all backed by `store`.
	pub fn new(store: &IndexStore, policy: FailurePolicy) -> Result<Self> {
		let mut indexers: BTreeMap<IndexKind, Arc<dyn ObjectIndexer>> = BTreeMap::new();
		for kind in IndexKind::ALL {
			indexers.insert(kind, Arc::new(EntityIndexer::new(store.handle(kind)?)));
		}
		Ok(Self { indexers, policy })
	}

	/// Replace the indexer registered for `indexer.kind()`.
	pub fn with_indexer(mut self, indexer: Arc<dyn ObjectIndexer>) -> Self {
		self.indexers.insert(indexer.kind(), indexer);
		self
	}

	pub fn policy(&self) -> FailurePolicy { self.policy }

	pub fn get(&self, kind: IndexKind) -> Option<Arc<dyn ObjectIndexer>> {
		self.indexers.get(&kind).cloned()
	}

	pub fn add(&self, entity: &dyn IndexedEntity) -> Result<()> { self.dispatch(Operation::Add, entity) }

	pub fn update(&self, entity: &dyn IndexedEntity) -> Result<()> { self.dispatch(Operation::Update, entity) }

	pub fn remove(&self, entity: &dyn IndexedEntity) -> Result<()> { self.dispatch(Operation::Remove, entity) }

	fn dispatch(&self, op: Operation, entity: &dyn IndexedEntity) -> Result<()> {
		let result = match self.indexers.get(&entity.kind()) {
			Some(indexer) => match op {
				Operation::Add => indexer.add(entity),
				Operation::Update => indexer.update(entity),
				Operation::Remove => indexer.remove(entity),
			},
			None => Err(Error::NotFound(format!("no indexer registered for {}", entity.kind()))),
		};
		match (result, self.policy) {
			(Ok(()), _) => Ok(()),
			(Err(e), FailurePolicy::Propagate) => Err(e),
			(Err(e), FailurePolicy::Suppress) => {
				error!(kind = %entity.kind(), uuid = entity.uuid(), resource = e.is_resource(), error = %e, "error {} object in index", op);
				Ok(())
			}
		}
	}
}
