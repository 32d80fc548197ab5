use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use indexsync_core::types::{FieldDef, IndexKind};

pub const TOKENIZER: &str = "text_with_stopwords";

/// Tantivy schema for one kind, derived from its field definitions.
///
/// The key field is indexed with the raw tokenizer so that delete-by-term and
/// point lookup match exactly one stored value.
pub fn build_schema(kind: IndexKind) -> Schema {
	let mut schema_builder = Schema::builder();
	for def in kind.schema() {
		schema_builder.add_text_field(def.name, text_options(def));
	}
	schema_builder.build()
}

fn text_options(def: &FieldDef) -> TextOptions {
	if def.is_key() { return STRING | STORED; }
	let options = if def.analyzed {
		let indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
		TextOptions::default().set_indexing_options(indexing)
	} else {
		STRING
	};
	if def.stored { options.set_stored() } else { options }
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}
