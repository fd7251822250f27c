//! Test the block distribution of a particle sequence across MPI ranks.

use cic_deposit::{
    partition::{scatter_points, BlockPartition},
    source::{PointSource, SyntheticSource},
    tools::{gather_to_root, global_size},
};
use mpi::traits::Communicator;

const ROOT: i32 = 0;

pub fn main() {
    // Initialise MPI
    let universe = mpi::initialize().unwrap();

    // Get the world communicator
    let comm = universe.world();
    let rank = comm.rank();
    let size = comm.size() as usize;

    // Choose a count that does not divide evenly.
    let npoints = 10 * size + size / 2 + 1;
    let partition = BlockPartition::new(npoints, size);

    let all_points = if rank == ROOT {
        Some(SyntheticSource::new(3).next_round(npoints).unwrap())
    } else {
        None
    };

    let shard = scatter_points(all_points.as_deref(), &partition, ROOT, &comm).unwrap();

    assert_eq!(shard.len(), partition.count(rank as usize));
    assert_eq!(global_size(&shard, &comm), npoints);

    // Concatenating the shards in rank order gives back the original sequence.
    if let Some(gathered) = gather_to_root(&shard, ROOT, &comm) {
        assert_eq!(Some(gathered), all_points);
        println!("Scattered {} points across {} ranks.", npoints, size);
    }
}
