//! Time the deposition of a fixed particle set for different thread counts.

use std::time::Instant;

use cic_deposit::{
    config::BoundaryPolicy,
    deposit::{deposit_serial, Accumulator},
    geometry::GridConfig,
    mesh::Mesh,
    source::{PointSource, SyntheticSource},
};

pub fn main() {
    let grid = GridConfig::new(256, 256).unwrap();
    let points = SyntheticSource::new(0).next_round(2_000_000).unwrap();

    let mut reference = Mesh::new(&grid);
    let start = Instant::now();
    deposit_serial(&grid, BoundaryPolicy::Reject, &points, &mut reference).unwrap();
    println!("serial: {} ms", start.elapsed().as_millis());

    for threads in [1, 2, 4, 8] {
        let mut accumulator = Accumulator::new(grid, threads, BoundaryPolicy::Reject).unwrap();
        let mut mesh = Mesh::new(&grid);

        let start = Instant::now();
        accumulator.accumulate(&points, &mut mesh).unwrap();
        let duration = start.elapsed();

        assert!(mesh.max_abs_diff(&reference).unwrap() <= 1e-9);
        println!("{} threads: {} ms", threads, duration.as_millis());
    }
}
