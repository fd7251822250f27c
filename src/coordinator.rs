//! Driver of the accumulation rounds.

use std::time::{Duration, Instant};

use mpi::traits::CommunicatorCollectives;

use crate::{
    config::{InputHeader, RoundMode, RunConfig},
    deposit::Accumulator,
    error::Result,
    geometry::{GridConfig, Point},
    mesh::Mesh,
    partition::{scatter_points, BlockPartition},
    reduce::{global_sum, reduce_to_root},
    source::PointSource,
};

/// Result of a run, available on the root rank.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Sum of the local meshes of all ranks.
    pub mesh: Mesh,
    /// Accumulation time of root summed over all rounds.
    pub elapsed: Duration,
    /// Number of rounds performed.
    pub rounds: usize,
    /// Particles distributed in each round.
    pub points_per_round: usize,
    /// Number of ranks that took part.
    pub ranks: usize,
}

/// Per-process state carried from round to round.
pub struct LocalRounds {
    accumulator: Accumulator,
    mode: RoundMode,
    mesh: Mesh,
    running: Option<Mesh>,
    elapsed: Duration,
    rounds: usize,
}

impl LocalRounds {
    /// Set up the local state for `grid`.
    pub fn new(grid: GridConfig, config: &RunConfig) -> Result<Self> {
        let accumulator = Accumulator::new(grid, config.threads, config.policy)?;
        let mesh = Mesh::new(&grid);
        let running = match config.round_mode {
            RoundMode::Overwrite => None,
            RoundMode::Accumulate => Some(Mesh::new(&grid)),
        };

        Ok(Self {
            accumulator,
            mode: config.round_mode,
            mesh,
            running,
            elapsed: Duration::ZERO,
            rounds: 0,
        })
    }

    /// Deposit the shard of one round and return the time it took.
    ///
    /// The local mesh is overwritten. In [RoundMode::Accumulate] the result is
    /// also added to a running sum.
    pub fn deposit(&mut self, shard: &[Point]) -> Result<Duration> {
        let start = Instant::now();
        self.accumulator.accumulate(shard, &mut self.mesh)?;
        let duration = start.elapsed();

        if let Some(running) = self.running.as_mut() {
            running.add_assign(&self.mesh)?;
        }

        self.elapsed += duration;
        self.rounds += 1;
        Ok(duration)
    }

    /// The mesh that enters the global reduction.
    pub fn mesh(&self) -> &Mesh {
        match (self.mode, &self.running) {
            (RoundMode::Accumulate, Some(running)) => running,
            _ => &self.mesh,
        }
    }

    /// Accumulation time summed over all rounds.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of rounds deposited so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.accumulator.threads()
    }
}

/// Run all accumulation rounds described by `header` and reduce the result onto `root`.
///
/// Each round `source` supplies the full particle sequence on `root`, the
/// sequence is scattered in blocks to all ranks, the ranks meet in a barrier
/// and then deposit their block. The time spent depositing is summed over the
/// rounds. After the last round the local meshes are summed onto `root`.
///
/// `source` is only used on `root`. On error the other ranks may be left
/// blocked in a collective; the caller is expected to abort the job.
pub fn run<C: CommunicatorCollectives>(
    mut source: Option<&mut dyn PointSource>,
    header: &InputHeader,
    config: &RunConfig,
    root: i32,
    comm: &C,
) -> Result<Option<RunReport>> {
    let rank = comm.rank();
    let grid = header.grid()?;
    let points_per_round = header.points_per_round();
    let partition = BlockPartition::new(points_per_round, comm.size() as usize);

    let mut local = LocalRounds::new(grid, config)?;

    if rank == root {
        tracing::info!(
            %grid,
            ranks = comm.size(),
            threads = local.threads(),
            points_per_round,
            rounds = header.rounds(),
            "starting deposition"
        );
    }

    for round in 0..header.rounds() {
        let all_points = match source.as_deref_mut() {
            Some(source) if rank == root => Some(source.next_round(points_per_round)?),
            _ => None,
        };

        let shard = scatter_points(all_points.as_deref(), &partition, root, comm)?;
        drop(all_points);

        comm.barrier();
        let duration = local.deposit(&shard)?;

        tracing::debug!(
            rank,
            round,
            points = shard.len(),
            seconds = duration.as_secs_f64(),
            "round deposited"
        );
    }

    let mass = global_sum(local.mesh().total(), comm);
    let global = reduce_to_root(local.mesh(), root, comm);

    Ok(global.map(|mesh| {
        tracing::info!(
            mass,
            seconds = local.elapsed().as_secs_f64(),
            "deposition finished"
        );
        RunReport {
            mesh,
            elapsed: local.elapsed(),
            rounds: local.rounds(),
            points_per_round,
            ranks: comm.size() as usize,
        }
    }))
}
