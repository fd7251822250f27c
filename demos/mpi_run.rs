//! Compare a full distributed run with a single-process deposition on root.

use cic_deposit::{
    config::{broadcast_header, InputHeader, RoundMode, RunConfig, ROOT_RANK},
    coordinator::run,
    deposit::deposit_serial,
    geometry::Point,
    mesh::Mesh,
    source::{PointSource, SyntheticSource},
};
use mpi::traits::Communicator;

const SEED: u64 = 17;

pub fn main() {
    let universe = mpi::initialize().unwrap();
    let comm = universe.world();
    let rank = comm.rank();

    let header = (rank == ROOT_RANK).then_some(InputHeader {
        num_x: 20,
        num_y: 12,
        total_points: 1001,
        max_iterations: 3,
    });
    let header = broadcast_header(header, ROOT_RANK, &comm);
    assert_eq!(header.num_x, 20);

    for mode in [RoundMode::Overwrite, RoundMode::Accumulate] {
        let config = RunConfig {
            round_mode: mode,
            ..RunConfig::new(3)
        };

        let mut source = SyntheticSource::new(SEED);
        let source = (rank == ROOT_RANK).then_some(&mut source as &mut dyn PointSource);

        let report = run(source, &header, &config, ROOT_RANK, &comm).unwrap();

        if let Some(report) = report {
            let grid = header.grid().unwrap();
            let mut replay = SyntheticSource::new(SEED);
            let rounds: Vec<Vec<Point>> = (0..header.rounds())
                .map(|_| replay.next_round(header.points_per_round()).unwrap())
                .collect();

            let mut expected = Mesh::new(&grid);
            let mut round_mesh = Mesh::new(&grid);
            match mode {
                RoundMode::Overwrite => {
                    deposit_serial(&grid, config.policy, &rounds[2], &mut expected).unwrap()
                }
                RoundMode::Accumulate => {
                    for points in &rounds {
                        deposit_serial(&grid, config.policy, points, &mut round_mesh).unwrap();
                        expected.add_assign(&round_mesh).unwrap();
                    }
                }
            }

            assert_eq!(report.rounds, 3);
            assert!(report.mesh.max_abs_diff(&expected).unwrap() <= 1e-12);
            println!(
                "{:?}: {} ranks agree with a single process (mass {:.6}, {:.6} s).",
                mode,
                report.ranks,
                report.mesh.total(),
                report.elapsed.as_secs_f64()
            );
        }
    }
}
