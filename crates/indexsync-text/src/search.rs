use std::sync::Arc;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::TantivyDocument;

use indexsync_core::error::{Error, Result};
use indexsync_core::types::{Document, SearchHit};

use crate::store::KindIndex;

/// Read-only free-text search over one kind's search fields.
pub struct TextSearcher {
	index: Arc<KindIndex>,
	parser: QueryParser,
}

impl TextSearcher {
	pub fn new(index: Arc<KindIndex>) -> Self {
		let fields = index.kind().search_fields().iter().filter_map(|name| index.field(name)).collect();
		let parser = QueryParser::for_index(index.index(), fields);
		Self { index, parser }
	}

	pub fn search(&self, query_text: &str, limit: usize) -> Result<Vec<SearchHit>> {
		Ok(self.search_documents(query_text, limit)?.into_iter().map(|(hit, _)| hit).collect())
	}

	/// Like [`search`](Self::search) but also returns each hit's stored fields.
	pub fn search_documents(&self, query_text: &str, limit: usize) -> Result<Vec<(SearchHit, Document)>> {
		if limit == 0 { return Ok(Vec::new()); }
		let query = self.parser.parse_query(query_text).map_err(|e| Error::Operation(format!("invalid query '{}': {}", query_text, e)))?;
		let searcher = self.index.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit)).map_err(Error::store)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(Error::store)?;
			let id = doc.get_first(self.index.key_field()).and_then(|v| v.as_str()).unwrap_or("").to_string();
			hits.push((SearchHit { id, score }, self.index.decode(&doc)));
		}
		Ok(hits)
	}
}
