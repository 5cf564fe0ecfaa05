mod tantivy_engine;
mod text_indexer_memory;

pub use tantivy_engine::TantivyEngine;
pub use text_indexer_memory::InMemoryTextIndexer;
