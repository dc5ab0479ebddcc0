//! Push-walls: a `PushableWall` cell that, once used, slides one cell away
//! from the player and lands as an ordinary wall.

use glam::{IVec2, Vec2};
use tracing::debug;

use crate::{
    config::EngineConfig,
    world::{CellKind, Grid, PushBlock},
};

/// Unit grid step along the dominant axis of `facing`.
pub fn dominant_step(facing: Vec2) -> IVec2 {
    if facing.x.abs() >= facing.y.abs() {
        IVec2::new(facing.x.signum() as i32, 0)
    } else {
        IVec2::new(0, facing.y.signum() as i32)
    }
}

/// Lift the push-wall at `at` off the grid if the cell behind it is free.
///
/// On success the source cell becomes `Empty`; the caller owns the block
/// until it lands.
pub fn try_push(grid: &mut Grid, at: IVec2, facing: Vec2) -> Option<PushBlock> {
    let cell = grid.cell(at)?;
    if cell.kind != CellKind::PushableWall {
        return None;
    }
    let texture = cell.wall_tex;
    let to = at + dominant_step(facing);
    if grid.cell(to)?.kind != CellKind::Empty {
        return None;
    }
    grid.set_kind(at, CellKind::Empty);
    debug!(%at, %to, "push-wall moving");
    Some(PushBlock::new(at, to, texture))
}

/// Slide the block on; when it arrives its destination becomes a `Wall`
/// wearing the block's texture.  Returns `true` on landing.
pub fn advance(block: &mut PushBlock, grid: &mut Grid, dt_ms: f32, cfg: &EngineConfig) -> bool {
    block.progress = (block.progress + cfg.push_speed_per_ms * dt_ms.max(0.0)).min(1.0);
    if !block.arrived() {
        return false;
    }
    if let Some(c) = grid.cell_mut(block.to) {
        c.kind = CellKind::Wall;
        c.wall_tex = block.texture;
        c.inner_wall_tex = block.texture;
    }
    true
}
