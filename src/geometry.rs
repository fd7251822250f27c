//! Geometry information

use mpi::traits::Equivalence;

use crate::error::{Error, Result};

/// A particle in the unit square.
///
/// The weight scales every area deposited by the particle. Particles read from
/// input carry unit weight.
#[derive(Copy, Clone, Debug, Default, PartialEq, Equivalence)]
pub struct Point {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
    /// Deposited mass.
    pub weight: f64,
}

impl Point {
    /// Create a new point with unit weight.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, weight: 1.0 }
    }

    /// Create a new point with a given weight.
    pub fn with_weight(x: f64, y: f64, weight: f64) -> Self {
        Self { x, y, weight }
    }

    /// True if both coordinates and the weight are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.weight.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(x: {}, y: {}, weight: {})", self.x, self.y, self.weight)
    }
}

/// A uniform grid over the unit square.
///
/// The grid has `num_x * num_y` cells and `(num_x + 1) * (num_y + 1)` nodes.
/// Nodes are numbered row by row, so the node in row `r` and column `c` has
/// index `r * width + c`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridConfig {
    num_x: usize,
    num_y: usize,
    step_x: f64,
    step_y: f64,
}

impl GridConfig {
    /// Create a grid with `num_x` cells along x and `num_y` cells along y.
    pub fn new(num_x: usize, num_y: usize) -> Result<Self> {
        if num_x == 0 || num_y == 0 {
            return Err(Error::InvalidGrid {
                num_x: num_x as i64,
                num_y: num_y as i64,
            });
        }

        Ok(Self {
            num_x,
            num_y,
            step_x: 1.0 / num_x as f64,
            step_y: 1.0 / num_y as f64,
        })
    }

    /// Number of cells along x.
    pub fn num_x(&self) -> usize {
        self.num_x
    }

    /// Number of cells along y.
    pub fn num_y(&self) -> usize {
        self.num_y
    }

    /// Cell width.
    pub fn step_x(&self) -> f64 {
        self.step_x
    }

    /// Cell height.
    pub fn step_y(&self) -> f64 {
        self.step_y
    }

    /// Number of nodes in a row.
    pub fn width(&self) -> usize {
        self.num_x + 1
    }

    /// Number of node rows.
    pub fn height(&self) -> usize {
        self.num_y + 1
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Area of a single cell. This is the mass a unit weight particle deposits.
    pub fn cell_area(&self) -> f64 {
        self.step_x * self.step_y
    }

    /// Row-major index of the node in row `row` and column `col`.
    pub fn node_index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height() && col < self.width());
        row * self.width() + col
    }

    /// Extent of the grid along x and y.
    pub fn extent(&self) -> [f64; 2] {
        [
            self.num_x as f64 * self.step_x,
            self.num_y as f64 * self.step_y,
        ]
    }

    /// Check whether a point lies in the half-open interior `[0, extent)`.
    ///
    /// Only such points can be deposited without touching nodes outside the mesh.
    pub fn contains(&self, point: &Point) -> bool {
        let [xmax, ymax] = self.extent();
        (0.0..xmax).contains(&point.x) && (0.0..ymax).contains(&point.y)
    }

    /// Clamp the coordinates of a point into the closed extent of the grid.
    pub fn clamp(&self, point: &Point) -> Point {
        let [xmax, ymax] = self.extent();
        Point::with_weight(
            point.x.clamp(0.0, xmax),
            point.y.clamp(0.0, ymax),
            point.weight,
        )
    }
}

impl std::fmt::Display for GridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(cells: {} x {}, nodes: {} x {}, step: {} x {})",
            self.num_x,
            self.num_y,
            self.width(),
            self.height(),
            self.step_x,
            self.step_y
        )
    }
}

#[cfg(test)]
mod test {
    use super::{GridConfig, Point};
    use crate::error::Error;

    #[test]
    fn test_grid_layout() {
        let grid = GridConfig::new(4, 2).unwrap();

        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.node_count(), 15);
        assert_eq!(grid.node_index(2, 4), 14);
        assert_eq!(grid.step_x(), 0.25);
        assert_eq!(grid.step_y(), 0.5);
        assert_eq!(grid.cell_area(), 0.125);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        assert!(matches!(
            GridConfig::new(0, 3),
            Err(Error::InvalidGrid { num_x: 0, num_y: 3 })
        ));
    }

    #[test]
    fn test_contains_is_half_open() {
        let grid = GridConfig::new(3, 3).unwrap();

        assert!(grid.contains(&Point::new(0.0, 0.0)));
        assert!(grid.contains(&Point::new(0.999, 0.5)));
        assert!(!grid.contains(&Point::new(1.0, 0.5)));
        assert!(!grid.contains(&Point::new(0.5, -1e-12)));
        assert!(!grid.contains(&Point::new(f64::NAN, 0.5)));
    }

    #[test]
    fn test_clamp_keeps_weight() {
        let grid = GridConfig::new(2, 2).unwrap();
        let clamped = grid.clamp(&Point::with_weight(1.5, -0.5, 3.0));

        assert_eq!(clamped, Point::with_weight(1.0, 0.0, 3.0));
    }
}
