pub mod documents;
pub mod graph;
