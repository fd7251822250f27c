//! Dense node storage of a grid.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::geometry::GridConfig;

/// Default file name of the text output.
pub const MESH_FILE: &str = "Mesh.out";

/// Accumulated mass on every node of a grid, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    values: Vec<f64>,
    width: usize,
    height: usize,
}

impl Mesh {
    /// Create a zeroed mesh for the nodes of `grid`.
    pub fn new(grid: &GridConfig) -> Self {
        Self {
            values: vec![0.0; grid.node_count()],
            width: grid.width(),
            height: grid.height(),
        }
    }

    /// Create a zeroed mesh with the same layout as `other`.
    pub fn zeros_like(other: &Mesh) -> Self {
        Self {
            values: vec![0.0; other.values.len()],
            width: other.width,
            height: other.height,
        }
    }

    /// Number of nodes in a row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The node values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the node values.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Value at row `row` and column `col`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }

    /// Iterate over the rows of the mesh.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.width)
    }

    /// Reset every node to zero.
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Sum over all nodes.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Check that the mesh has the node layout of `grid`.
    pub fn check_layout(&self, grid: &GridConfig) -> Result<()> {
        if self.width != grid.width() || self.height != grid.height() {
            return Err(Error::MeshShape {
                expected: grid.node_count(),
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    fn check_same_layout(&self, other: &Mesh) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::MeshShape {
                expected: self.values.len(),
                actual: other.values.len(),
            });
        }
        Ok(())
    }

    /// Add `other` to this mesh node by node.
    pub fn add_assign(&mut self, other: &Mesh) -> Result<()> {
        self.check_same_layout(other)?;
        for (value, &other_value) in self.values.iter_mut().zip(&other.values) {
            *value += other_value;
        }
        Ok(())
    }

    /// Largest absolute node difference to `other`.
    pub fn max_abs_diff(&self, other: &Mesh) -> Result<f64> {
        self.check_same_layout(other)?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    /// Write the mesh as text, one row per line with space separated values.
    pub fn write_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        for row in self.rows() {
            writeln!(writer, "{}", row.iter().map(|v| format!("{v:.6}")).join(" "))?;
        }
        Ok(())
    }

    /// Write the mesh as text into the file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_text(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Mesh;
    use crate::{error::Error, geometry::GridConfig};

    #[test]
    fn test_write_text() {
        let grid = GridConfig::new(2, 1).unwrap();
        let mut mesh = Mesh::new(&grid);
        mesh.values_mut()[1] = 0.25;
        mesh.values_mut()[5] = 1.0 / 3.0;

        let mut out = Vec::<u8>::new();
        mesh.write_text(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0.000000 0.250000 0.000000\n0.000000 0.000000 0.333333\n"
        );
    }

    #[test]
    fn test_add_assign_and_total() {
        let grid = GridConfig::new(1, 1).unwrap();
        let mut first = Mesh::new(&grid);
        let mut second = Mesh::new(&grid);
        first.values_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        second.values_mut().copy_from_slice(&[0.5, 0.5, 0.5, 0.5]);

        first.add_assign(&second).unwrap();

        assert_eq!(first.values(), &[1.5, 2.5, 3.5, 4.5]);
        assert_eq!(first.total(), 12.0);
        assert_eq!(first.get(1, 0), 3.5);

        first.clear();
        assert_eq!(first.total(), 0.0);
    }

    #[test]
    fn test_meshes_of_different_grids_do_not_combine() {
        let mut small = Mesh::new(&GridConfig::new(2, 2).unwrap());
        let large = Mesh::new(&GridConfig::new(3, 3).unwrap());

        assert!(matches!(
            small.add_assign(&large),
            Err(Error::MeshShape {
                expected: 9,
                actual: 16
            })
        ));
        assert!(small.max_abs_diff(&large).is_err());
        assert_eq!(small.max_abs_diff(&small.clone()).unwrap(), 0.0);
    }

    #[test]
    fn test_check_layout() {
        let mesh = Mesh::new(&GridConfig::new(2, 2).unwrap());

        assert!(mesh.check_layout(&GridConfig::new(2, 2).unwrap()).is_ok());
        assert!(mesh.check_layout(&GridConfig::new(3, 1).unwrap()).is_err());
    }
}
