mod graph_iterators;
mod linkgraph_repository_memory;

pub use graph_iterators::SnapshotIterator;
pub use linkgraph_repository_memory::InMemoryLinkGraphRepository;
