use anyhow::Result;
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::debug;

use tabrus_core::types::{DictionaryEntry, EntryId};

use crate::tantivy_utils::{build_schema, register_tokenizer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationHit {
	pub entry_id: EntryId,
	pub score: f32,
}

/// In-memory index of every translation string, one tantivy document per sense.
///
/// Built once per dictionary snapshot and never written to afterwards.
pub struct TranslationIndex {
	index: Index,
	reader: IndexReader,
	entry_id_field: tantivy::schema::Field,
	translation_field: tantivy::schema::Field,
	senses: usize,
}

impl TranslationIndex {
	pub fn build(entries: &[DictionaryEntry]) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let entry_id_field = schema.get_field("entry_id")?;
		let translation_field = schema.get_field("translation")?;

		let mut writer: IndexWriter = index.writer_with_num_threads(1, 50_000_000)?;
		let mut senses = 0usize;
		for entry in entries {
			for translation in &entry.translations {
				writer.add_document(doc!(entry_id_field => entry.id, translation_field => translation.clone()))?;
				senses += 1;
			}
		}
		writer.commit()?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		debug!(entries = entries.len(), senses, "translation index built");
		Ok(Self { index, reader, entry_id_field, translation_field, senses })
	}

	/// Number of indexed translation strings.
	pub fn senses(&self) -> usize { self.senses }

	/// Entries whose translations match `query`, best first, one hit per entry.
	///
	/// Query syntax errors are tolerated: whatever parses is searched.
	pub fn search(&self, query: &str, limit: usize) -> Result<Vec<TranslationHit>> {
		if query.trim().is_empty() || limit == 0 || self.senses == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.translation_field]);
		let (q, errors) = qp.parse_query_lenient(query);
		if !errors.is_empty() { debug!(query, errors = errors.len(), "lenient query parse"); }
		// several senses of one entry may match; over-fetch before collapsing
		let fetch = limit.saturating_mul(4).min(self.senses);
		let top_docs = searcher.search(&q, &TopDocs::with_limit(fetch))?;
		let mut best: HashMap<EntryId, f32> = HashMap::new();
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let Some(entry_id) = doc.get_first(self.entry_id_field).and_then(|v| v.as_u64()) else { continue };
			best.entry(entry_id).and_modify(|s| { if score > *s { *s = score; } }).or_insert(score);
		}
		let mut hits: Vec<TranslationHit> = best.into_iter().map(|(entry_id, score)| TranslationHit { entry_id, score }).collect();
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.entry_id.cmp(&b.entry_id)));
		hits.truncate(limit);
		Ok(hits)
	}
}
