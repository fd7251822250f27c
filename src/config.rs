//! Run configuration and the binary input header.

use std::io::Read;
use std::path::PathBuf;

use mpi::traits::{CommunicatorCollectives, Equivalence, Root};

use crate::{
    error::{Error, Result},
    geometry::GridConfig,
    mesh::MESH_FILE,
};

/// Rank that reads input, owns the full particle sequence and receives the global mesh.
pub const ROOT_RANK: i32 = 0;

/// The four native-endian `i32` values that open an input stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Equivalence)]
pub struct InputHeader {
    /// Cells along x.
    pub num_x: i32,
    /// Cells along y.
    pub num_y: i32,
    /// Particles per round.
    pub total_points: i32,
    /// Number of rounds.
    pub max_iterations: i32,
}

impl InputHeader {
    /// Read a header from the start of a stream and validate it.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0_i32; 4];
        reader.read_exact(bytemuck::cast_slice_mut(&mut raw[..]))?;

        let [num_x, num_y, total_points, max_iterations] = raw;
        let header = Self {
            num_x,
            num_y,
            total_points,
            max_iterations,
        };
        header.validate()?;
        Ok(header)
    }

    /// Encode the header the way [InputHeader::read] expects it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let raw = [self.num_x, self.num_y, self.total_points, self.max_iterations];
        bytemuck::cast_slice(&raw[..]).to_vec()
    }

    /// Check that the header describes a run.
    pub fn validate(&self) -> Result<()> {
        if self.num_x < 1 || self.num_y < 1 {
            return Err(Error::InvalidHeader(format!(
                "grid needs at least one cell per direction, got {} x {}",
                self.num_x, self.num_y
            )));
        }
        if self.total_points < 0 {
            return Err(Error::InvalidHeader(format!(
                "negative particle count {}",
                self.total_points
            )));
        }
        if self.max_iterations < 0 {
            return Err(Error::InvalidHeader(format!(
                "negative iteration count {}",
                self.max_iterations
            )));
        }
        Ok(())
    }

    /// The grid described by the header.
    pub fn grid(&self) -> Result<GridConfig> {
        self.validate()?;
        GridConfig::new(self.num_x as usize, self.num_y as usize)
    }

    /// Particles per round.
    pub fn points_per_round(&self) -> usize {
        self.total_points.max(0) as usize
    }

    /// Number of rounds.
    pub fn rounds(&self) -> usize {
        self.max_iterations.max(0) as usize
    }
}

/// Broadcast the header read on `root` to all ranks.
///
/// `header` is only read on `root`.
pub fn broadcast_header<C: CommunicatorCollectives>(
    header: Option<InputHeader>,
    root: i32,
    comm: &C,
) -> InputHeader {
    let mut header = header.unwrap_or_default();
    comm.process_at_rank(root).broadcast_into(&mut header);
    header
}

/// How particles outside the grid are handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Fail the accumulation.
    #[default]
    Reject,
    /// Move the particle onto the nearest point of the grid.
    Clamp,
}

/// What survives from one round to the next on each process.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RoundMode {
    /// Each round replaces the local mesh; only the last round is reduced.
    #[default]
    Overwrite,
    /// Local meshes of all rounds are summed before the reduction.
    Accumulate,
}

/// Settings of a deposition run that do not come from the input stream.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Worker threads per process.
    pub threads: usize,
    /// Handling of particles outside the grid.
    pub policy: BoundaryPolicy,
    /// Round semantics.
    pub round_mode: RoundMode,
    /// Where root writes the global mesh.
    pub output: PathBuf,
}

impl RunConfig {
    /// A configuration with `threads` workers and default settings otherwise.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            ..Default::default()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            policy: BoundaryPolicy::default(),
            round_mode: RoundMode::default(),
            output: PathBuf::from(MESH_FILE),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::{BoundaryPolicy, InputHeader, RoundMode, RunConfig};
    use crate::error::Error;

    #[test]
    fn test_read_header() {
        let header = InputHeader {
            num_x: 8,
            num_y: 4,
            total_points: 100,
            max_iterations: 3,
        };
        let mut cursor = Cursor::new(header.to_bytes());

        let read = InputHeader::read(&mut cursor).unwrap();

        assert_eq!(read, header);
        assert_eq!(cursor.position(), 16);

        let grid = read.grid().unwrap();
        assert_eq!(grid.width(), 9);
        assert_eq!(grid.height(), 5);
    }

    #[test]
    fn test_truncated_header() {
        let mut cursor = Cursor::new(vec![0_u8; 10]);

        assert!(matches!(InputHeader::read(&mut cursor), Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_header() {
        let header = InputHeader {
            num_x: 0,
            num_y: 4,
            total_points: 1,
            max_iterations: 1,
        };
        let mut cursor = Cursor::new(header.to_bytes());

        assert!(matches!(
            InputHeader::read(&mut cursor),
            Err(Error::InvalidHeader(_))
        ));

        let header = InputHeader {
            num_x: 2,
            num_y: 2,
            total_points: -5,
            max_iterations: 1,
        };
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::new(4);

        assert_eq!(config.threads, 4);
        assert_eq!(config.policy, BoundaryPolicy::Reject);
        assert_eq!(config.round_mode, RoundMode::Overwrite);
        assert_eq!(config.output.to_str(), Some("Mesh.out"));
    }
}
