//! Test the reduction of local meshes across MPI ranks.

use cic_deposit::{
    config::BoundaryPolicy,
    deposit::Accumulator,
    geometry::{GridConfig, Point},
    mesh::Mesh,
    reduce::{all_reduce, reduce_to_root},
};
use mpi::traits::Communicator;

const ROOT: i32 = 0;

pub fn main() {
    let universe = mpi::initialize().unwrap();
    let comm = universe.world();
    let rank = comm.rank();
    let size = comm.size();

    let grid = GridConfig::new(2, 2).unwrap();

    // Every rank deposits one particle onto the centre node.
    let mut accumulator = Accumulator::new(grid, 2, BoundaryPolicy::Reject).unwrap();
    let mut mesh = Mesh::new(&grid);
    accumulator
        .accumulate(&[Point::new(0.5, 0.5)], &mut mesh)
        .unwrap();

    let everywhere = all_reduce(&mesh, &comm);
    assert_eq!(everywhere.get(1, 1), size as f64 * grid.cell_area());

    match reduce_to_root(&mesh, ROOT, &comm) {
        Some(global) => {
            assert_eq!(rank, ROOT);
            assert_eq!(global, everywhere);
            assert_eq!(global.total(), size as f64 * grid.cell_area());
            println!("Reduced meshes of {} ranks.", size);
        }
        None => assert_ne!(rank, ROOT),
    }
}
