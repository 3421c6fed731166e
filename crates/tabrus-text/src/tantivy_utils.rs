use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "rus_stem";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _entry_id_field = schema_builder.add_u64_field("entry_id", INDEXED | STORED | FAST);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _translation_field = schema_builder.add_text_field("translation", text_options);
	schema_builder.build()
}

/// Lowercase + Russian snowball stemming, so "дома" and "дом" meet.
pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(Stemmer::new(Language::Russian))
		.build();
	index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}
