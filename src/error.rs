//! Error type shared by all deposition components.

use std::io;

use thiserror::Error as ThisError;

use crate::geometry::Point;

/// Errors raised while reading input, depositing particles or distributing work.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Reading the particle stream or writing the mesh failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The binary input header holds values that do not describe a run.
    #[error("invalid input header: {0}")]
    InvalidHeader(String),
    /// A grid needs at least one cell in each direction.
    #[error("invalid grid of {num_x} x {num_y} cells")]
    InvalidGrid {
        /// Requested cells along x.
        num_x: i64,
        /// Requested cells along y.
        num_y: i64,
    },
    /// A particle lies outside the region covered by the grid.
    #[error("particle {index} {point} lies outside the grid")]
    OutOfGrid {
        /// Position of the particle in the shard.
        index: usize,
        /// The refused particle.
        point: Point,
    },
    /// The particle sequence handed to the scatter does not match the partition.
    #[error("partition describes {expected} particles but {actual} were supplied")]
    ShardMismatch {
        /// Total count of the partition.
        expected: usize,
        /// Number of particles actually supplied.
        actual: usize,
    },
    /// A partition does not have one block per rank of the communicator.
    #[error("partition has {parts} blocks for {ranks} ranks")]
    PartitionSize {
        /// Number of blocks.
        parts: usize,
        /// Number of ranks.
        ranks: usize,
    },
    /// A mesh does not have the node layout of the grid it is used with.
    #[error("mesh has {actual} nodes, grid needs {expected}")]
    MeshShape {
        /// Node count of the grid.
        expected: usize,
        /// Node count of the mesh.
        actual: usize,
    },
    /// The worker thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::Error;
    use crate::geometry::Point;

    #[test]
    fn test_out_of_grid_message_names_the_particle() {
        let err = Error::OutOfGrid {
            index: 3,
            point: Point::new(1.5, 0.25),
        };

        assert_eq!(
            err.to_string(),
            "particle 3 (x: 1.5, y: 0.25, weight: 1) lies outside the grid"
        );
    }
}
