pub mod edge;
pub mod link;
pub mod partition;

pub use edge::Edge;
pub use link::Link;
pub use partition::{MAX_ID, MIN_ID, PartitionError, Partitioner, partition_range};
