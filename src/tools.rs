//! Utility routines.

use mpi::{
    collective::SystemOperation,
    datatype::PartitionMut,
    traits::{CommunicatorCollectives, Equivalence, Root},
};
use num::traits::Zero;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Gather distributed array to the root rank.
///
/// The result is a `Vec<T>` on root and `None` on all other ranks.
pub fn gather_to_root<T: Equivalence + Default + Clone, C: CommunicatorCollectives>(
    arr: &[T],
    root: i32,
    comm: &C,
) -> Option<Vec<T>> {
    let n = arr.len() as i32;
    let root_process = comm.process_at_rank(root);

    if comm.rank() == root {
        let mut counts = vec![0_i32; comm.size() as usize];
        root_process.gather_into_root(&n, &mut counts[..]);

        let nelements = counts.iter().sum::<i32>() as usize;
        let mut new_arr = vec![T::default(); nelements];
        let displs = displacements(&counts);

        let mut partition = PartitionMut::new(&mut new_arr[..], &counts[..], &displs[..]);
        root_process.gather_varcount_into_root(arr, &mut partition);

        Some(new_arr)
    } else {
        root_process.gather_into(&n);
        root_process.gather_varcount_into(arr);
        None
    }
}

/// Get global size of a distributed array.
///
/// Computes the size and broadcasts it to all ranks.
pub fn global_size<T, C: CommunicatorCollectives>(arr: &[T], comm: &C) -> usize {
    let local_size = arr.len();
    let mut global_size = 0;

    comm.all_reduce_into(&local_size, &mut global_size, SystemOperation::sum());

    global_size
}

/// Get a seeded rng
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Compute displacements from a vector of counts.
///
/// This is useful for global MPI varcount operations. Let
/// count [ 3, 4, 5]. Then the corresponding displacements are
/// [0, 3, 7]. Note that the last element `5` is ignored.
pub fn displacements<T: Zero + Copy>(counts: &[T]) -> Vec<T> {
    counts
        .iter()
        .scan(T::zero(), |acc, &x| {
            let tmp = *acc;
            *acc = *acc + x;
            Some(tmp)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use rand::Rng;

    use super::{displacements, seeded_rng};

    #[test]
    fn test_displacements() {
        assert_eq!(displacements(&[3_i32, 4, 5]), vec![0, 3, 7]);
        assert_eq!(displacements(&[2_usize, 0, 1]), vec![0, 2, 2]);
        assert!(displacements::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let first: Vec<f64> = (0..8).map(|_| seeded_rng(7).gen()).collect();
        let mut rng = seeded_rng(7);
        let value: f64 = rng.gen();

        assert!(first.iter().all(|&v| v == value));
    }
}
