pub mod graph_iterators_sqlx;
pub mod linkgraph_repository_sqlx;
pub mod text_indexer_sqlx;
