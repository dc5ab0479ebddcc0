//! Static tile layout plus the mutable door state that rides on it.
//!
//! Cells are stored row-major (`y * size + x`).  Everything except door
//! openness and push-wall materialisation is fixed once [`GridBuilder`]
//! hands the grid out.
//!
//! [`GridBuilder`]: crate::world::GridBuilder

use glam::{IVec2, Vec2};
use smallvec::SmallVec;

use crate::{
    engine::{
        lighting::BakedLightField,
        ray::{Tile, TileMap},
    },
    world::{
        light::{Light, LightId},
        texture::{NO_TEXTURE, TextureId},
    },
};

/// Closed set of cell kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    /// Leaf runs along X (on the cell's horizontal mid-line).
    DoorAlongX,
    /// Leaf runs along Y (on the cell's vertical mid-line).
    DoorAlongY,
    PushableWall,
}

impl CellKind {
    #[inline]
    pub fn is_door(self) -> bool {
        matches!(self, CellKind::DoorAlongX | CellKind::DoorAlongY)
    }

    /// Terminates rays and blocks movement/flood fill regardless of state.
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, CellKind::Wall | CellKind::PushableWall)
    }
}

/// Per-cell light list; most cells see a handful of shadowed lights at most.
pub type LightList = SmallVec<[LightId; 4]>;

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub wall_tex: TextureId,
    /// Face shown inside a door's frame once the ray has passed the leaf.
    pub inner_wall_tex: TextureId,
    pub floor_tex: TextureId,
    /// Door only: 0 closed, 1 fully open.
    pub openness: f32,
    /// Shadow-casting lights that can reach this cell, in discovery order.
    pub lights: LightList,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            kind: CellKind::Empty,
            wall_tex: NO_TEXTURE,
            inner_wall_tex: NO_TEXTURE,
            floor_tex: NO_TEXTURE,
            openness: 0.0,
            lights: SmallVec::new(),
        }
    }
}

impl Cell {
    pub fn new(kind: CellKind, wall_tex: TextureId, floor_tex: TextureId) -> Self {
        Self {
            kind,
            wall_tex,
            inner_wall_tex: wall_tex,
            floor_tex,
            ..Default::default()
        }
    }

    /// Blocks movement at the given passability threshold.
    #[inline]
    pub fn blocks_movement(&self, threshold: f32) -> bool {
        self.kind.is_solid() || (self.kind.is_door() && self.openness < threshold)
    }
}

/// Timer state for one door; the openness itself lives on the cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Door {
    pub cell: IVec2,
    pub time_opened_ms: f32,
    pub is_opening: bool,
}

impl Door {
    pub fn new(cell: IVec2) -> Self {
        Self {
            cell,
            time_opened_ms: 0.0,
            is_opening: false,
        }
    }
}

/// A by-value replacement for one cell, shipped to the frame worker.
#[derive(Clone, Debug, PartialEq)]
pub struct CellDelta {
    pub coord: IVec2,
    pub cell: Cell,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GridError {
    #[error("grid size must be in 1..={max}, got {0}", max = crate::config::MAX_GRID_SIZE)]
    BadSize(i32),

    #[error("cell {0} lies outside the {1}×{1} grid")]
    OutOfBounds(IVec2, i32),

    #[error("light #{id} at {pos} lies outside the grid")]
    LightOutside { id: usize, pos: Vec2 },

    #[error("too many lights ({0}), ids are 16-bit")]
    TooManyLights(usize),
}

#[derive(Clone, Debug)]
pub struct Grid {
    pub(crate) size: i32,
    pub(crate) cells: Vec<Cell>,
    pub(crate) doors: Vec<Door>,
    pub(crate) lights: Vec<Light>,
    pub(crate) baked: BakedLightField,
}

impl Grid {
    /// Cells per side.
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn contains(&self, at: IVec2) -> bool {
        at.x >= 0 && at.y >= 0 && at.x < self.size && at.y < self.size
    }

    #[inline]
    fn index(&self, at: IVec2) -> Option<usize> {
        self.contains(at)
            .then(|| (at.y * self.size + at.x) as usize)
    }

    #[inline]
    pub fn cell(&self, at: IVec2) -> Option<&Cell> {
        self.index(at).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, at: IVec2) -> Option<&mut Cell> {
        self.index(at).map(|i| &mut self.cells[i])
    }

    /// Cell containing a continuous world position.
    #[inline]
    pub fn cell_at(&self, p: Vec2) -> Option<&Cell> {
        self.cell(p.floor().as_ivec2())
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub(crate) fn doors_mut(&mut self) -> &mut [Door] {
        &mut self.doors
    }

    pub fn door_index(&self, at: IVec2) -> Option<usize> {
        self.doors.iter().position(|d| d.cell == at)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id as usize)
    }

    pub fn baked(&self) -> &BakedLightField {
        &self.baked
    }

    /// Set a door's openness, clamped to `[0, 1]`.  Returns `false` for
    /// non-door or off-grid cells.
    pub fn set_openness(&mut self, at: IVec2, openness: f32) -> bool {
        match self.cell_mut(at) {
            Some(c) if c.kind.is_door() => {
                c.openness = openness.clamp(0.0, 1.0);
                true
            }
            _ => false,
        }
    }

    /// Change a cell's kind in place (push-wall pickup and landing).
    pub(crate) fn set_kind(&mut self, at: IVec2, kind: CellKind) -> bool {
        match self.cell_mut(at) {
            Some(c) => {
                c.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Off-grid counts as blocked.
    #[inline]
    pub fn blocks_movement(&self, at: IVec2, threshold: f32) -> bool {
        self.cell(at).is_none_or(|c| c.blocks_movement(threshold))
    }

    /// Snapshot of one cell for the frame worker.
    pub fn delta(&self, at: IVec2) -> Option<CellDelta> {
        self.cell(at).map(|cell| CellDelta {
            coord: at,
            cell: cell.clone(),
        })
    }

    /// Overwrite one cell from a delta.  Deltas never create or remove
    /// doors; off-grid deltas are ignored.
    pub fn apply(&mut self, delta: &CellDelta) -> bool {
        match self.cell_mut(delta.coord) {
            Some(c) => {
                *c = delta.cell.clone();
                c.openness = c.openness.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }
}

impl TileMap for Grid {
    #[inline]
    fn dims(&self) -> IVec2 {
        IVec2::splat(self.size)
    }

    #[inline]
    fn tile(&self, at: IVec2) -> Tile {
        match self.cell(at) {
            Some(c) => Tile {
                kind: c.kind,
                openness: c.openness,
            },
            None => Tile::WALL,
        }
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
