//! Embedded full-text engine backing the in-memory document index.

use std::sync::Mutex;

use anyhow::{Context, anyhow};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{FAST, Field, IndexRecordOption, STORED, STRING, Schema, TEXT, Value};
use tantivy::tokenizer::{Token, TokenStream};
use tantivy::{
    DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, SegmentReader, TantivyDocument,
    Term, doc,
};
use uuid::Uuid;

use crate::domain::documents::document::{DocumentQuery, QueryType};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// RAM-only tantivy index keyed by link id. Hits are ordered by PageRank
/// first and BM25 relevance second.
pub struct TantivyEngine {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    link_id: Field,
    title: Field,
    content: Field,
    page_rank: Field,
}

impl TantivyEngine {
    pub fn new() -> anyhow::Result<Self> {
        let mut schema = Schema::builder();
        let link_id = schema.add_text_field("link_id", STRING | STORED);
        let title = schema.add_text_field("title", TEXT);
        let content = schema.add_text_field("content", TEXT);
        let page_rank = schema.add_f64_field("page_rank", FAST);

        let index = Index::create_in_ram(schema.build());
        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .context("create index writer")?;
        // Reloaded after every commit so writes are visible immediately
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("create index reader")?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            link_id,
            title,
            content,
            page_rank,
        })
    }

    /// Replaces whatever is indexed under `key`.
    pub fn upsert(&self, key: Uuid, title: &str, content: &str, page_rank: f64) -> anyhow::Result<()> {
        let key = key.to_string();
        self.apply(|writer| {
            writer.delete_term(Term::from_field_text(self.link_id, &key));
            writer.add_document(doc!(
                self.link_id => key.clone(),
                self.title => title,
                self.content => content,
                self.page_rank => page_rank
            ))?;
            Ok(())
        })
    }

    /// Stages operations and commits them together. On failure the writer is
    /// rolled back so nothing staged leaks into a later commit.
    fn apply(
        &self,
        stage: impl FnOnce(&mut IndexWriter) -> tantivy::Result<()>,
    ) -> anyhow::Result<()> {
        {
            let mut writer = self
                .writer
                .lock()
                .map_err(|_| anyhow!("index writer lock poisoned"))?;
            let staged = stage(&mut *writer).and_then(|_| writer.commit().map(|_| ()));
            if let Err(e) = staged {
                if let Err(rollback) = writer.rollback() {
                    tracing::warn!(error = ?rollback, "index_rollback_failed");
                }
                return Err(e).context("commit index update");
            }
        }
        self.reader.reload()?;
        Ok(())
    }

    /// Returns the total number of hits and the keys of up to `size` of them,
    /// skipping the first `from`.
    pub fn search_page(
        &self,
        query: &DocumentQuery,
        from: u64,
        size: usize,
    ) -> anyhow::Result<(u64, Vec<Uuid>)> {
        let Some(query) = self.build_query(query)? else {
            return Ok((0, Vec::new()));
        };

        let searcher = self.reader.searcher();
        if from >= searcher.num_docs() {
            let total = searcher.search(query.as_ref(), &Count)?;
            return Ok((total as u64, Vec::new()));
        }

        let top = TopDocs::with_limit(size.max(1))
            .and_offset(from as usize)
            .tweak_score(|segment: &SegmentReader| {
                let ranks = segment.fast_fields().f64("page_rank").ok();
                move |doc: DocId, score: Score| {
                    let rank = ranks.as_ref().and_then(|c| c.first(doc)).unwrap_or(0.0);
                    (rank, score)
                }
            });
        let (total, hits) = searcher.search(query.as_ref(), &(Count, top))?;

        let mut keys = Vec::with_capacity(hits.len());
        for (_, address) in hits {
            let stored: TantivyDocument = searcher.doc(address)?;
            let key = stored
                .get_first(self.link_id)
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow!("indexed document without link id"))?;
            keys.push(Uuid::parse_str(key).context("parse indexed link id")?);
        }
        Ok((total as u64, keys))
    }

    fn build_query(&self, query: &DocumentQuery) -> anyhow::Result<Option<Box<dyn Query>>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for field in [self.title, self.content] {
            let mut terms = self.tokenize(field, &query.expression)?;
            match query.query_type {
                QueryType::Match => {
                    for term in terms {
                        clauses.push((Occur::Should, term_query(term)));
                    }
                }
                QueryType::Phrase => match terms.len() {
                    0 => {}
                    1 => clauses.push((Occur::Should, term_query(terms.remove(0)))),
                    _ => clauses.push((Occur::Should, Box::new(PhraseQuery::new(terms)))),
                },
            }
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    fn tokenize(&self, field: Field, text: &str) -> anyhow::Result<Vec<Term>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        stream.process(&mut |token: &Token| terms.push(Term::from_field_text(field, &token.text)));
        Ok(terms)
    }
}

fn term_query(term: Term) -> Box<dyn Query> {
    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
}
