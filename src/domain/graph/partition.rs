use uuid::Uuid;

pub const MIN_ID: Uuid = Uuid::nil();
pub const MAX_ID: Uuid = Uuid::from_u128(u128::MAX);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    #[error("invalid partition {partition} of {num_partitions}")]
    InvalidPartition { partition: u32, num_partitions: u32 },
}

/// Returns the half-open `[from, to)` slice of the 128-bit identifier space
/// owned by `partition`.
///
/// Every partition spans `u128::MAX / num_partitions` identifiers except the
/// last one, whose upper bound is pinned to the all-ones UUID so that the
/// remainder of a non-exact division is never dropped.
pub fn partition_range(partition: u32, num_partitions: u32) -> Result<(Uuid, Uuid), PartitionError> {
    if num_partitions == 0 || partition >= num_partitions {
        return Err(PartitionError::InvalidPartition {
            partition,
            num_partitions,
        });
    }

    let size = u128::MAX / u128::from(num_partitions);
    let from = if partition == 0 {
        MIN_ID
    } else {
        Uuid::from_u128(size * u128::from(partition))
    };
    let to = if partition == num_partitions - 1 {
        MAX_ID
    } else {
        Uuid::from_u128(size * u128::from(partition + 1))
    };
    Ok((from, to))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    num_partitions: u32,
}

impl Partitioner {
    pub fn new(num_partitions: u32) -> Result<Self, PartitionError> {
        if num_partitions == 0 {
            return Err(PartitionError::InvalidPartition {
                partition: 0,
                num_partitions,
            });
        }
        Ok(Self { num_partitions })
    }

    pub fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    pub fn range(&self, partition: u32) -> Result<(Uuid, Uuid), PartitionError> {
        partition_range(partition, self.num_partitions)
    }

    pub fn ranges(&self) -> impl Iterator<Item = (Uuid, Uuid)> + '_ {
        (0..self.num_partitions).filter_map(|p| self.range(p).ok())
    }
}
