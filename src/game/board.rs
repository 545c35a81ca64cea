//! Board
//!
//! Tile layout plus the collection of floor items (power-ups and flags).
//! Items are keyed by a monotonic `ItemId` so handles stay valid when
//! other items are swept away.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::GridPos;
use crate::game::entity::{Entity, EntityKind, RenderView, UpdateContext};
use crate::game::flag::Flag;
use crate::game::powerup::PowerUp;

/// Handle to an item on the board.
pub type ItemId = u32;

/// Largest board accepted, in tiles (4096 x 4096).
pub const MAX_TILES: u64 = 1 << 24;

/// Static tile type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    /// Walkable, lets blasts through
    #[default]
    Floor = 0,
    /// Blocks movement and blasts
    Wall = 1,
}

/// Board construction / placement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Width or height is zero.
    #[error("board must be at least 1x1")]
    ZeroSize,

    /// More tiles than `MAX_TILES`.
    #[error("board of {width}x{height} tiles is too large")]
    TooLarge {
        /// Requested width
        width: u64,
        /// Requested height
        height: u64,
    },

    /// Layout rows have different lengths.
    #[error("layout row {row} has {found} tiles, expected {expected}")]
    RaggedLayout {
        /// Offending row
        row: usize,
        /// Width of row 0
        expected: usize,
        /// Width of this row
        found: usize,
    },

    /// Unknown layout character.
    #[error("unknown tile '{ch}' at ({x}, {y})")]
    UnknownTile {
        /// The character
        ch: char,
        /// Column
        x: usize,
        /// Row
        y: usize,
    },

    /// Position is outside the board.
    #[error("position {pos} is out of bounds")]
    OutOfBounds {
        /// Requested tile
        pos: GridPos,
    },

    /// Position is not walkable.
    #[error("position {pos} is blocked")]
    Blocked {
        /// Requested tile
        pos: GridPos,
    },
}

/// Something lying on the floor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Item {
    /// Collectible upgrade
    PowerUp(PowerUp),
    /// Team flag
    Flag(Flag),
}

impl Item {
    /// Borrow as a flag.
    pub fn as_flag(&self) -> Option<&Flag> {
        match self {
            Item::Flag(flag) => Some(flag),
            Item::PowerUp(_) => None,
        }
    }

    /// Borrow mutably as a flag.
    pub fn as_flag_mut(&mut self) -> Option<&mut Flag> {
        match self {
            Item::Flag(flag) => Some(flag),
            Item::PowerUp(_) => None,
        }
    }

    /// Borrow mutably as a power-up.
    pub fn as_power_up_mut(&mut self) -> Option<&mut PowerUp> {
        match self {
            Item::PowerUp(power_up) => Some(power_up),
            Item::Flag(_) => None,
        }
    }
}

impl Entity for Item {
    fn kind(&self) -> EntityKind {
        match self {
            Item::PowerUp(p) => p.kind(),
            Item::Flag(f) => f.kind(),
        }
    }

    fn position(&self) -> GridPos {
        match self {
            Item::PowerUp(p) => p.position(),
            Item::Flag(f) => f.position(),
        }
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) {
        match self {
            Item::PowerUp(p) => p.update(ctx),
            Item::Flag(f) => f.update(ctx),
        }
    }

    fn render(&self) -> Option<RenderView> {
        match self {
            Item::PowerUp(p) => p.render(),
            Item::Flag(f) => f.render(),
        }
    }

    fn should_remove(&self) -> bool {
        match self {
            Item::PowerUp(p) => p.should_remove(),
            Item::Flag(f) => f.should_remove(),
        }
    }
}

/// The arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    width: u32,
    height: u32,
    /// Row-major tiles
    tiles: Vec<Tile>,
    items: BTreeMap<ItemId, Item>,
    next_item_id: ItemId,
}

impl Board {
    /// Create an all-floor board.
    pub fn new(width: u32, height: u32) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::ZeroSize);
        }
        let area = u64::from(width) * u64::from(height);
        let len = Some(area)
            .filter(|n| *n <= MAX_TILES)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(BoardError::TooLarge { width: width.into(), height: height.into() })?;

        Ok(Self {
            width,
            height,
            tiles: vec![Tile::Floor; len],
            items: BTreeMap::new(),
            next_item_id: 0,
        })
    }

    /// Parse an ASCII layout: `#` wall, `.` or space floor.
    pub fn from_rows(rows: &[&str]) -> Result<Self, BoardError> {
        let expected = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let too_large = || BoardError::TooLarge {
            width: expected as u64,
            height: rows.len() as u64,
        };
        let width = u32::try_from(expected).map_err(|_| too_large())?;
        let height = u32::try_from(rows.len()).map_err(|_| too_large())?;
        let mut board = Self::new(width, height)?;

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(BoardError::RaggedLayout { row: y, expected, found });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' | ' ' => Tile::Floor,
                    _ => return Err(BoardError::UnknownTile { ch, x, y }),
                };
                // Both fit in u32: the board was sized from them
                let pos = GridPos::new(x as u32, y as u32);
                board.set_tile(pos, tile)?;
            }
        }

        Ok(board)
    }

    /// Board width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Board height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Is `pos` on the board?
    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Tile at `pos`, `None` off the board.
    pub fn tile(&self, pos: GridPos) -> Option<Tile> {
        self.index(pos).and_then(|i| self.tiles.get(i).copied())
    }

    /// Overwrite a tile.
    pub fn set_tile(&mut self, pos: GridPos, tile: Tile) -> Result<(), BoardError> {
        let slot = self
            .index(pos)
            .and_then(|i| self.tiles.get_mut(i))
            .ok_or(BoardError::OutOfBounds { pos })?;
        *slot = tile;
        Ok(())
    }

    /// On the board and not a wall.
    #[inline]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.tile(pos) == Some(Tile::Floor)
    }

    /// Put an item on a walkable tile.
    pub fn insert_item(&mut self, item: Item) -> Result<ItemId, BoardError> {
        let pos = item.position();
        if !self.in_bounds(pos) {
            return Err(BoardError::OutOfBounds { pos });
        }
        if !self.is_walkable(pos) {
            return Err(BoardError::Blocked { pos });
        }

        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.insert(id, item);
        Ok(id)
    }

    /// All items (sorted by ID).
    pub fn items(&self) -> &BTreeMap<ItemId, Item> {
        &self.items
    }

    /// Get an item by ID.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Get an item mutably by ID.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Get a flag by item ID.
    pub fn flag(&self, id: ItemId) -> Option<&Flag> {
        self.items.get(&id).and_then(Item::as_flag)
    }

    /// Get a flag mutably by item ID.
    pub fn flag_mut(&mut self, id: ItemId) -> Option<&mut Flag> {
        self.items.get_mut(&id).and_then(Item::as_flag_mut)
    }

    /// IDs of items lying on `pos`.
    pub fn items_at(&self, pos: GridPos) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|(_, item)| item.position() == pos)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Run every item's per-tick update.
    pub fn update_items(&mut self, ctx: &UpdateContext<'_>) {
        for item in self.items.values_mut() {
            item.update(ctx);
        }
    }

    /// Drop items that asked to be removed. Returns how many went.
    pub fn sweep_removed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| !item.should_remove());
        before - self.items.len()
    }
}
