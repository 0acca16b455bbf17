//! Drop directions
//!
//! A direction is an integer offset on the grid. Positions and offsets use
//! screen convention: `x` is the column axis, `y` is the row axis growing
//! downward.

use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Offset vector a drop travels along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RowCol", into = "RowCol")]
pub struct Direction(IVec2);

/// Serialized form: `{ "row": -1, "col": 0 }`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RowCol {
    row: i32,
    col: i32,
}

impl From<RowCol> for Direction {
    fn from(rc: RowCol) -> Self {
        Self::new(rc.row, rc.col)
    }
}

impl From<Direction> for RowCol {
    fn from(dir: Direction) -> Self {
        Self {
            row: dir.d_row(),
            col: dir.d_col(),
        }
    }
}

impl Direction {
    pub const LEFT: Self = Self(IVec2::new(-1, 0));
    pub const TOP: Self = Self(IVec2::new(0, -1));
    pub const RIGHT: Self = Self(IVec2::new(1, 0));
    pub const BOTTOM: Self = Self(IVec2::new(0, 1));
    pub const TOP_LEFT: Self = Self(IVec2::new(-1, -1));
    pub const TOP_RIGHT: Self = Self(IVec2::new(1, -1));
    pub const BOTTOM_LEFT: Self = Self(IVec2::new(-1, 1));
    pub const BOTTOM_RIGHT: Self = Self(IVec2::new(1, 1));

    /// The default drop set, in the order drops are spawned
    pub const CARDINAL: [Self; 4] = [Self::LEFT, Self::TOP, Self::RIGHT, Self::BOTTOM];

    /// Diagonals are defined but not part of the default set
    pub const DIAGONAL: [Self; 4] = [
        Self::TOP_LEFT,
        Self::TOP_RIGHT,
        Self::BOTTOM_LEFT,
        Self::BOTTOM_RIGHT,
    ];

    /// Build from a `(Δrow, Δcol)` pair
    pub const fn new(d_row: i32, d_col: i32) -> Self {
        Self(IVec2::new(d_col, d_row))
    }

    #[inline]
    pub fn d_row(self) -> i32 {
        self.0.y
    }

    #[inline]
    pub fn d_col(self) -> i32 {
        self.0.x
    }

    /// Offset in grid space (x = column, y = row)
    #[inline]
    pub fn offset(self) -> IVec2 {
        self.0
    }

    /// A zero offset would probe its own cell forever
    pub fn is_zero(self) -> bool {
        self.0 == IVec2::ZERO
    }

    /// Every component in {-1, 0, 1}. Stride growth only stays in step with
    /// the heading for unit offsets.
    pub fn is_unit(self) -> bool {
        self.0.abs().max_element() <= 1
    }

    /// Name used by renderers for the drop-trail animation
    pub fn label(self) -> Option<&'static str> {
        match (self.d_row(), self.d_col()) {
            (0, -1) => Some("left"),
            (-1, 0) => Some("top"),
            (0, 1) => Some("right"),
            (1, 0) => Some("bottom"),
            (-1, -1) => Some("topLeft"),
            (-1, 1) => Some("topRight"),
            (1, -1) => Some("bottomLeft"),
            (1, 1) => Some("bottomRight"),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "({}, {})", self.d_row(), self.d_col()),
        }
    }
}

/// Grow every non-zero axis one unit further from zero. Zero axes stay zero.
#[inline]
pub fn enlarge(step: IVec2) -> IVec2 {
    step + step.signum()
}
