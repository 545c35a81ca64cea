//! Grid Primitives
//!
//! Integer tile coordinates and the four movement directions.
//! Coordinates are unsigned so a position can never go negative;
//! stepping off the top/left edge yields `None` instead of wrapping.

use serde::{Serialize, Deserialize};

/// A tile coordinate on the board.
///
/// Ordered by `(y, x)` so BTreeMap/BTreeSet iteration walks the board
/// row by row, the same way the ASCII layouts are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl GridPos {
    /// Create a new position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Position one tile over in `dir`, or `None` if that would underflow.
    ///
    /// Upper bounds are the board's business, see `Board::in_bounds`.
    pub fn step(self, dir: Direction) -> Option<GridPos> {
        let (dx, dy) = dir.delta();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(GridPos { x, y })
    }
}

impl PartialOrd for GridPos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridPos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Towards row 0
    Up = 1,
    /// Away from row 0
    Down = 2,
    /// Towards column 0
    Left = 3,
    /// Away from column 0
    Right = 4,
}

impl Direction {
    /// All directions, in blast-propagation order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Signed tile delta for this direction.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Decode from the packed input code (0 = none).
    pub fn from_code(code: u8) -> Option<Direction> {
        match code {
            1 => Some(Direction::Up),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            4 => Some(Direction::Right),
            _ => None,
        }
    }
}
