//! Summation of the local meshes of all ranks.

use mpi::{
    collective::SystemOperation,
    traits::{CommunicatorCollectives, Root},
};

use crate::mesh::Mesh;

/// Sum the local meshes of all ranks node by node into a global mesh on `root`.
///
/// Returns the global mesh on `root` and `None` on every other rank. Only
/// `root` allocates storage for the result.
pub fn reduce_to_root<C: CommunicatorCollectives>(
    mesh: &Mesh,
    root: i32,
    comm: &C,
) -> Option<Mesh> {
    let root_process = comm.process_at_rank(root);

    if comm.rank() == root {
        let mut global = Mesh::zeros_like(mesh);
        root_process.reduce_into_root(mesh.values(), global.values_mut(), SystemOperation::sum());
        Some(global)
    } else {
        root_process.reduce_into(mesh.values(), SystemOperation::sum());
        None
    }
}

/// Sum the local meshes of all ranks and return the result on every rank.
pub fn all_reduce<C: CommunicatorCollectives>(mesh: &Mesh, comm: &C) -> Mesh {
    let mut global = Mesh::zeros_like(mesh);
    comm.all_reduce_into(mesh.values(), global.values_mut(), SystemOperation::sum());
    global
}

/// Sum a scalar over all ranks.
pub fn global_sum<C: CommunicatorCollectives>(value: f64, comm: &C) -> f64 {
    let mut sum = 0.0;
    comm.all_reduce_into(&value, &mut sum, SystemOperation::sum());
    sum
}
