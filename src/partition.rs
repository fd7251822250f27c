//! Block partition of a particle sequence and its distribution across ranks.

use std::ops::Range;

use itertools::Itertools;
use mpi::{
    datatype::Partition,
    traits::{CommunicatorCollectives, Root},
};

use crate::{
    error::{Error, Result},
    geometry::Point,
    tools::displacements,
};

/// Split of `total` items into contiguous, ordered blocks.
///
/// Block `r` holds `total / parts` items, plus one if `r < total % parts`.
/// Concatenating the blocks in order gives back the original sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockPartition {
    counts: Vec<usize>,
    offsets: Vec<usize>,
}

impl BlockPartition {
    /// Partition `total` items into `parts` blocks.
    pub fn new(total: usize, parts: usize) -> Self {
        assert!(parts > 0, "a partition needs at least one block");

        let base = total / parts;
        let rem = total % parts;

        let counts = (0..parts)
            .map(|part| base + usize::from(part < rem))
            .collect_vec();

        let offsets = displacements(&counts);

        Self { counts, offsets }
    }

    /// Number of blocks.
    pub fn parts(&self) -> usize {
        self.counts.len()
    }

    /// Number of items in all blocks.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of items in block `part`.
    pub fn count(&self, part: usize) -> usize {
        self.counts[part]
    }

    /// Offset of the first item of block `part`.
    pub fn offset(&self, part: usize) -> usize {
        self.offsets[part]
    }

    /// Range of block `part` in the original sequence.
    pub fn range(&self, part: usize) -> Range<usize> {
        self.offsets[part]..self.offsets[part] + self.counts[part]
    }

    /// The block sizes.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Iterate over the blocks of `items`.
    pub fn blocks<'a, T>(&'a self, items: &'a [T]) -> impl Iterator<Item = &'a [T]> + 'a {
        assert_eq!(items.len(), self.total());
        (0..self.parts()).map(move |part| &items[self.range(part)])
    }
}

/// Check that `partition` has one block for each of `ranks` ranks.
pub fn check_partition_size(partition: &BlockPartition, ranks: usize) -> Result<()> {
    if partition.parts() != ranks {
        return Err(Error::PartitionSize {
            parts: partition.parts(),
            ranks,
        });
    }
    Ok(())
}

/// Distribute the blocks of a particle sequence from `root` to all ranks.
///
/// On `root` the full sequence must be passed in `all_points`. It is ignored on
/// every other rank. Each rank receives the block of `partition` matching its rank.
///
/// # Note
/// Every rank checks that the partition has one block per rank before the
/// collective, so a mismatch fails on all ranks alike. The length check on root
/// also happens before the collective. If it fails the other ranks are left
/// waiting in the scatter, so the caller needs to abort the job.
pub fn scatter_points<C: CommunicatorCollectives>(
    all_points: Option<&[Point]>,
    partition: &BlockPartition,
    root: i32,
    comm: &C,
) -> Result<Vec<Point>> {
    check_partition_size(partition, comm.size() as usize)?;

    let rank = comm.rank();
    let root_process = comm.process_at_rank(root);

    let mut shard = vec![Point::default(); partition.count(rank as usize)];

    if rank == root {
        let all_points = all_points.unwrap_or_default();
        if all_points.len() != partition.total() {
            return Err(Error::ShardMismatch {
                expected: partition.total(),
                actual: all_points.len(),
            });
        }

        let counts = partition
            .counts()
            .iter()
            .map(|&count| count as i32)
            .collect_vec();
        let displs = displacements(&counts);

        let send_partition = Partition::new(all_points, &counts[..], &displs[..]);
        root_process.scatter_varcount_into_root(&send_partition, &mut shard[..]);
    } else {
        root_process.scatter_varcount_into(&mut shard[..]);
    }

    tracing::debug!(rank, points = shard.len(), "received particle shard");

    Ok(shard)
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    use super::{check_partition_size, BlockPartition};
    use crate::error::Error;

    #[test]
    fn test_remainder_goes_to_first_blocks() {
        let partition = BlockPartition::new(10, 3);

        assert_eq!(partition.counts(), &[4, 3, 3]);
        assert_eq!(partition.offset(1), 4);
        assert_eq!(partition.range(2), 7..10);
    }

    #[test]
    fn test_more_parts_than_items() {
        let partition = BlockPartition::new(2, 4);

        assert_eq!(partition.counts(), &[1, 1, 0, 0]);
        assert_eq!(partition.range(3), 2..2);
    }

    #[test]
    fn test_empty_sequence() {
        let partition = BlockPartition::new(0, 3);

        assert_eq!(partition.total(), 0);
        assert!(partition.blocks::<u8>(&[]).all(|block| block.is_empty()));
    }

    #[test]
    fn test_partition_must_match_rank_count() {
        let partition = BlockPartition::new(12, 3);

        assert!(check_partition_size(&partition, 3).is_ok());
        assert!(matches!(
            check_partition_size(&partition, 4),
            Err(Error::PartitionSize { parts: 3, ranks: 4 })
        ));
    }

    proptest! {
        #[test]
        fn test_partition_is_fair_and_ordered(total in 0usize..5000, parts in 1usize..64) {
            let partition = BlockPartition::new(total, parts);

            prop_assert_eq!(partition.parts(), parts);
            prop_assert_eq!(partition.total(), total);

            let (min, max) = partition.counts().iter().minmax().into_option().unwrap();
            prop_assert!(max - min <= 1);

            let items = (0..total).collect_vec();
            let joined = partition.blocks(&items).flatten().copied().collect_vec();
            prop_assert_eq!(joined, items);
        }
    }
}
