use crate::core::error::{LayoutError, Result};

/// Rectangular window of the grid, bounds inclusive. Bounds are never
/// inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RectangularRegion {
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
}

impl RectangularRegion {
    /// Create a region from inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedRegionShape` if a first bound is past its last
    /// bound.
    pub fn new(first_row: usize, last_row: usize, first_col: usize, last_col: usize) -> Result<Self> {
        if first_row > last_row || first_col > last_col {
            return Err(LayoutError::UnsupportedRegionShape);
        }
        Ok(Self {
            first_row,
            last_row,
            first_col,
            last_col,
        })
    }

    /// Region covering a whole `rows` x `cols` grid
    #[must_use]
    pub fn whole(rows: usize, cols: usize) -> Self {
        Self {
            first_row: 0,
            last_row: rows.saturating_sub(1),
            first_col: 0,
            last_col: cols.saturating_sub(1),
        }
    }

    #[must_use]
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    #[must_use]
    pub fn last_row(&self) -> usize {
        self.last_row
    }

    #[must_use]
    pub fn first_col(&self) -> usize {
        self.first_col
    }

    #[must_use]
    pub fn last_col(&self) -> usize {
        self.last_col
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.last_col - self.first_col + 1
    }

    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Check that the region lies inside a `rows` x `cols` grid.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` naming the first bound past the grid.
    pub fn check_fits(&self, rows: usize, cols: usize) -> Result<()> {
        if self.last_row >= rows {
            return Err(LayoutError::out_of_range(self.last_row, rows));
        }
        if self.last_col >= cols {
            return Err(LayoutError::out_of_range(self.last_col, cols));
        }
        Ok(())
    }
}

impl std::fmt::Display for RectangularRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}..={}, {}..={}]",
            self.first_row, self.last_row, self.first_col, self.last_col
        )
    }
}

/// A set of spots handed to a placement routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Rectangular(RectangularRegion),
    /// Arbitrary spots as (row, col)
    Spots(Vec<(usize, usize)>),
}

impl Region {
    /// The rectangle behind this region.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedRegionShape` for non-rectangular regions.
    pub fn as_rectangle(&self) -> Result<&RectangularRegion> {
        match self {
            Self::Rectangular(region) => Ok(region),
            Self::Spots(_) => Err(LayoutError::UnsupportedRegionShape),
        }
    }
}

impl From<RectangularRegion> for Region {
    fn from(region: RectangularRegion) -> Self {
        Self::Rectangular(region)
    }
}
