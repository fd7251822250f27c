//! Cloud-in-cell deposition of particles onto a mesh.
//!
//! Every particle spreads its weight over the four nodes of the cell that
//! contains it. The share of a node is the area of the sub-rectangle opposite
//! to it, so the four shares of a particle add up to the cell area.
//!
//! The parallel [Accumulator] works in two passes. In the first pass the
//! particles are split into one contiguous block per worker and every block
//! is deposited into its own mesh-sized scratch buffer, so workers never
//! write to the same memory. In the second pass every node of the output
//! mesh sums the corresponding entries of all scratch buffers. Both passes
//! run on a dedicated thread pool and need no locks.

use num::ToPrimitive;
use rayon::prelude::*;

use crate::{
    config::BoundaryPolicy,
    error::{Error, Result},
    geometry::{GridConfig, Point},
    mesh::Mesh,
    partition::BlockPartition,
};

/// Node indices and deposited masses of a particle.
///
/// The order is bottom-left, bottom-right, top-left, top-right.
pub type NodeWeights = [(usize, f64); 4];

/// Compute the nodes a particle deposits onto and the mass each receives.
///
/// The particle must lie in the closed extent of the grid. Points on the
/// upper boundaries are assigned to the last cell, so their mass ends up on
/// the boundary nodes.
pub fn cic_weights(grid: &GridConfig, point: &Point) -> NodeWeights {
    let (step_x, step_y) = (grid.step_x(), grid.step_y());

    let grid_x = cell_index(point.x / step_x, grid.num_x());
    let grid_y = cell_index(point.y / step_y, grid.num_y());

    let local_x = (point.x - grid_x as f64 * step_x).clamp(0.0, step_x);
    let local_y = (point.y - grid_y as f64 * step_y).clamp(0.0, step_y);

    let area1 = (step_x - local_x) * (step_y - local_y);
    let area2 = local_x * (step_y - local_y);
    let area3 = (step_x - local_x) * local_y;
    let area4 = local_x * local_y;

    let weight = point.weight;

    [
        (grid.node_index(grid_y, grid_x), area1 * weight),
        (grid.node_index(grid_y, grid_x + 1), area2 * weight),
        (grid.node_index(grid_y + 1, grid_x), area3 * weight),
        (grid.node_index(grid_y + 1, grid_x + 1), area4 * weight),
    ]
}

// Rounding can push `x / step` onto the number of cells for points just below
// the upper boundary.
fn cell_index(scaled: f64, ncells: usize) -> usize {
    scaled
        .floor()
        .to_usize()
        .map_or(0, |index| index.min(ncells - 1))
}

fn accepts(policy: BoundaryPolicy, grid: &GridConfig, point: &Point) -> bool {
    match policy {
        BoundaryPolicy::Reject => point.weight.is_finite() && grid.contains(point),
        BoundaryPolicy::Clamp => point.is_finite(),
    }
}

fn prepare(policy: BoundaryPolicy, grid: &GridConfig, point: &Point) -> Point {
    match policy {
        BoundaryPolicy::Reject => *point,
        BoundaryPolicy::Clamp => grid.clamp(point),
    }
}

/// Check every particle against the boundary policy.
///
/// Fails with the first particle the policy refuses.
pub fn check_points(policy: BoundaryPolicy, grid: &GridConfig, points: &[Point]) -> Result<()> {
    match points
        .par_iter()
        .position_first(|point| !accepts(policy, grid, point))
    {
        Some(index) => Err(Error::OutOfGrid {
            index,
            point: points[index],
        }),
        None => Ok(()),
    }
}

fn deposit_into(policy: BoundaryPolicy, grid: &GridConfig, points: &[Point], buffer: &mut [f64]) {
    for point in points {
        for (node, mass) in cic_weights(grid, &prepare(policy, grid, point)) {
            buffer[node] += mass;
        }
    }
}

/// Deposit particles onto `mesh` on the calling thread.
///
/// The mesh is zeroed first. Nothing is deposited if a particle is refused by `policy`.
pub fn deposit_serial(
    grid: &GridConfig,
    policy: BoundaryPolicy,
    points: &[Point],
    mesh: &mut Mesh,
) -> Result<()> {
    mesh.check_layout(grid)?;
    if let Some((index, point)) = points
        .iter()
        .enumerate()
        .find(|(_, point)| !accepts(policy, grid, point))
    {
        return Err(Error::OutOfGrid {
            index,
            point: *point,
        });
    }

    mesh.clear();
    deposit_into(policy, grid, points, mesh.values_mut());
    Ok(())
}

/// Multi-threaded deposition engine of a single process.
///
/// The accumulator owns its thread pool and one scratch buffer per worker.
/// Buffers are kept between calls and zeroed at the start of every call.
pub struct Accumulator {
    grid: GridConfig,
    policy: BoundaryPolicy,
    threads: usize,
    pool: rayon::ThreadPool,
    scratch: Vec<f64>,
}

impl Accumulator {
    /// Create an accumulator with `threads` workers.
    pub fn new(grid: GridConfig, threads: usize, policy: BoundaryPolicy) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|index| format!("cic-deposit-{index}"))
            .build()?;

        let threads = pool.current_num_threads();

        Ok(Self {
            grid,
            policy,
            threads,
            pool,
            scratch: vec![0.0; threads * grid.node_count()],
        })
    }

    /// The grid particles are deposited onto.
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Deposit `points` onto `mesh`.
    ///
    /// The previous contents of `mesh` are discarded. If a particle is refused
    /// by the boundary policy the call fails before anything is deposited.
    pub fn accumulate(&mut self, points: &[Point], mesh: &mut Mesh) -> Result<()> {
        mesh.check_layout(&self.grid)?;

        let Self {
            grid,
            policy,
            threads,
            pool,
            scratch,
        } = self;
        let (grid, policy, threads) = (&*grid, *policy, *threads);
        let nodes = grid.node_count();
        let blocks = BlockPartition::new(points.len(), threads);

        pool.install(|| {
            check_points(policy, grid, points)?;

            scratch
                .par_chunks_mut(nodes)
                .enumerate()
                .for_each(|(thread, buffer)| {
                    buffer.fill(0.0);
                    deposit_into(policy, grid, &points[blocks.range(thread)], buffer);
                });

            let scratch: &[f64] = scratch;
            mesh.values_mut()
                .par_iter_mut()
                .enumerate()
                .for_each(|(node, value)| {
                    *value = (0..threads).map(|thread| scratch[thread * nodes + node]).sum();
                });

            Ok(())
        })
    }
}
