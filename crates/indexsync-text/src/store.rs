//! Physical index handles and per-mutation writer sessions.
//!
//! One tantivy index per [`IndexKind`]. Writers are not kept open: every
//! mutation takes the kind's lock, opens a writer, commits and closes it.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::TermQuery;
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, info, warn};

use indexsync_core::config::IndexSettings;
use indexsync_core::error::{Error, Result};
use indexsync_core::types::{Document, FieldDef, IndexKind};

use crate::tantivy_utils::{build_schema, register_tokenizer};

enum Location {
	Directory(PathBuf),
	Memory,
}

/// Root of every kind's index. Handles are opened lazily, once per kind.
pub struct IndexStore {
	location: Location,
	heap_bytes: usize,
	kinds: Mutex<HashMap<IndexKind, Arc<KindIndex>>>,
}

impl IndexStore {
	pub fn open(root: impl Into<PathBuf>, heap_bytes: usize) -> Result<Self> {
		let root = root.into();
		std::fs::create_dir_all(&root)?;
		Ok(Self { location: Location::Directory(root), heap_bytes, kinds: Mutex::new(HashMap::new()) })
	}

	/// Open the store described by `settings`, resolving a relative root against `base`.
	pub fn from_settings(settings: &IndexSettings, base: &Path) -> Result<Self> {
		settings.validate()?;
		Self::open(settings.root_path(base), settings.writer_heap_bytes)
	}

	/// Volatile store; nothing survives the process.
	pub fn in_memory(heap_bytes: usize) -> Self {
		Self { location: Location::Memory, heap_bytes, kinds: Mutex::new(HashMap::new()) }
	}

	/// The index for `kind`, created on first use.
	///
	/// The map lock is held across the open, so first opens of different kinds
	/// run one after another.
	pub fn handle(&self, kind: IndexKind) -> Result<Arc<KindIndex>> {
		let mut kinds = self.kinds.lock().map_err(|_| Error::Operation("index map lock poisoned".into()))?;
		if let Some(handle) = kinds.get(&kind) { return Ok(Arc::clone(handle)); }
		let handle = Arc::new(self.open_kind(kind)?);
		kinds.insert(kind, Arc::clone(&handle));
		Ok(handle)
	}

	fn open_kind(&self, kind: IndexKind) -> Result<KindIndex> {
		let schema = build_schema(kind);
		let index = match &self.location {
			Location::Memory => Index::create_in_ram(schema),
			Location::Directory(root) => {
				let dir = root.join(kind.dir_name());
				std::fs::create_dir_all(&dir)?;
				let directory = MmapDirectory::open(&dir).map_err(Error::store)?;
				let index = Index::open_or_create(directory, schema).map_err(Error::store)?;
				info!(kind = %kind, path = %dir.display(), "opened index");
				index
			}
		};
		KindIndex::new(kind, index, self.heap_bytes)
	}
}

/// One kind's physical index plus the lock that serializes its writers.
pub struct KindIndex {
	kind: IndexKind,
	index: Index,
	reader: IndexReader,
	fields: Vec<(FieldDef, Field)>,
	key_field: Field,
	heap_bytes: usize,
	write_lock: Mutex<()>,
	// Set when a commit landed but the reader could not be reloaded.
	stale: AtomicBool,
}

impl KindIndex {
	fn new(kind: IndexKind, index: Index, heap_bytes: usize) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let mut fields = Vec::with_capacity(kind.schema().len());
		for def in kind.schema() {
			fields.push((*def, schema.get_field(def.name).map_err(Error::store)?));
		}
		let key_field = fields
			.iter()
			.find(|(def, _)| def.is_key())
			.map(|(_, field)| *field)
			.ok_or_else(|| Error::InvalidConfig(format!("{} schema has no key field", kind)))?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(Error::store)?;
		Ok(Self { kind, index, reader, fields, key_field, heap_bytes, write_lock: Mutex::new(()), stale: AtomicBool::new(false) })
	}

	pub fn kind(&self) -> IndexKind { self.kind }

	pub(crate) fn index(&self) -> &Index { &self.index }

	/// Searcher over the last committed state, retrying a reload a failed commit left pending.
	pub(crate) fn searcher(&self) -> Searcher {
		if self.stale.load(Ordering::Acquire) {
			let result = self.reader.reload();
			self.note_reload(result);
		}
		self.reader.searcher()
	}

	fn note_reload(&self, result: tantivy::Result<()>) {
		match result {
			Ok(()) => self.stale.store(false, Ordering::Release),
			Err(e) => {
				self.stale.store(true, Ordering::Release);
				warn!(kind = %self.kind, error = %e, "reader reload failed, committed writes not yet visible");
			}
		}
	}

	pub(crate) fn key_field(&self) -> Field { self.key_field }

	pub(crate) fn field(&self, name: &str) -> Option<Field> {
		self.fields.iter().find(|(def, _)| def.name == name).map(|(_, field)| *field)
	}

	/// Acquire the kind's writer. Blocks while another session is open.
	pub fn open_writer(&self) -> Result<WriterSession<'_>> {
		let guard = self.write_lock.lock().map_err(|_| Error::Operation(format!("{} writer lock poisoned", self.kind)))?;
		let writer: IndexWriter = self.index.writer_with_num_threads(1, self.heap_bytes).map_err(Error::store)?;
		Ok(WriterSession { index: self, writer: Some(writer), dirty: false, _guard: guard })
	}

	/// Exact-match lookup on the key field against the last committed state.
	pub fn get_by_key(&self, key: &str) -> Result<Option<Document>> {
		let searcher = self.searcher();
		let top_docs = searcher.search(&self.key_query(key), &TopDocs::with_limit(1)).map_err(Error::store)?;
		let Some((_, addr)) = top_docs.first() else { return Ok(None) };
		let doc: TantivyDocument = searcher.doc(*addr).map_err(Error::store)?;
		Ok(Some(self.decode(&doc)))
	}

	/// Number of live documents stored under `key`.
	pub fn count_by_key(&self, key: &str) -> Result<usize> {
		self.searcher().search(&self.key_query(key), &Count).map_err(Error::store)
	}

	pub fn num_docs(&self) -> u64 {
		self.searcher().num_docs()
	}

	fn key_query(&self, key: &str) -> TermQuery {
		TermQuery::new(Term::from_field_text(self.key_field, key), IndexRecordOption::Basic)
	}

	fn encode(&self, doc: &Document) -> TantivyDocument {
		let mut out = TantivyDocument::default();
		for spec in doc.fields() {
			let Some(value) = spec.value.as_deref() else { continue };
			match self.field(spec.name) {
				Some(field) => out.add_text(field, value),
				None => warn!(kind = %self.kind, field = spec.name, "field not in schema, skipped"),
			}
		}
		out
	}

	pub(crate) fn decode(&self, doc: &TantivyDocument) -> Document {
		let mut out = Document::new();
		for (def, field) in &self.fields {
			let value = doc.get_first(*field).and_then(|v| v.as_str()).map(str::to_string);
			out.push(*def, value);
		}
		out
	}
}

/// A writer held for the span of one mutation.
///
/// Dropping a session without [`close`](WriterSession::close) discards
/// uncommitted operations and still releases the writer and the kind's lock.
pub struct WriterSession<'a> {
	index: &'a KindIndex,
	// Declared before the guard: the writer is released before the lock.
	writer: Option<IndexWriter>,
	dirty: bool,
	_guard: MutexGuard<'a, ()>,
}

impl WriterSession<'_> {
	fn writer(&mut self) -> Result<&mut IndexWriter> {
		self.writer.as_mut().ok_or_else(|| Error::Operation("writer session already closed".into()))
	}

	pub fn add_document(&mut self, doc: &Document) -> Result<()> {
		let doc = self.index.encode(doc);
		self.writer()?.add_document(doc).map_err(Error::store)?;
		self.dirty = true;
		Ok(())
	}

	/// Delete every document under `key`, then insert `doc`. Both land in the same commit.
	pub fn update_document(&mut self, key: &str, doc: &Document) -> Result<()> {
		self.delete_by_key(key)?;
		self.add_document(doc)
	}

	pub fn delete_by_key(&mut self, key: &str) -> Result<()> {
		let term = Term::from_field_text(self.index.key_field, key);
		self.writer()?.delete_term(term);
		self.dirty = true;
		Ok(())
	}

	/// Lookup while holding the writer; sees every commit made before this session.
	pub fn get_by_key(&self, key: &str) -> Result<Option<Document>> {
		self.index.get_by_key(key)
	}

	/// Make pending operations durable. Once the writer commit succeeds this
	/// returns `Ok`: a failed reader reload is logged and retried on the next read,
	/// so a caller never retries a mutation that already landed.
	pub fn commit(&mut self) -> Result<()> {
		let opstamp = self.writer()?.commit().map_err(Error::store)?;
		self.dirty = false;
		let reloaded = self.index.reader.reload();
		self.index.note_reload(reloaded);
		debug!(kind = %self.index.kind, opstamp, "committed");
		Ok(())
	}

	pub fn close(mut self) -> Result<()> {
		if self.dirty { self.rollback(); }
		match self.writer.take() {
			Some(writer) => writer.wait_merging_threads().map_err(Error::store),
			None => Ok(()),
		}
	}

	fn rollback(&mut self) {
		if let Some(writer) = self.writer.as_mut() {
			if let Err(e) = writer.rollback() { warn!(kind = %self.index.kind, error = %e, "rollback failed"); }
		}
		self.dirty = false;
	}
}

impl Drop for WriterSession<'_> {
	fn drop(&mut self) {
		if self.dirty {
			debug!(kind = %self.index.kind, "discarding uncommitted operations");
			self.rollback();
		}
		drop(self.writer.take());
	}
}
