pub mod linkgraph_repository;
pub mod text_indexer;
