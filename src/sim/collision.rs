//! Cast-then-slide movement against a supersampled neighbourhood.
//!
//! ✔ 3×3 parent cells around the agent, `scale` sub-cells per cell per axis
//! ✔ one movement ray, then one slide ray along the struck face
//! ✔ no general physics: the agent is a point kept `padding` sub-cells off walls

use glam::{IVec2, Vec2};

use crate::{
    config::EngineConfig,
    engine::ray::{Surface, Tile, TileMap, back_off, cap_ray, cast, slide_ray},
    world::{Grid, PushBlock},
};

/// Parent cells covered on each axis (centred on the agent's cell).
const SPAN: i32 = 3;

/// Occupancy of the 3×3 parent cells around one agent cell.
pub struct LocalGrid {
    /// Grid cell mapped to local sub-cell `(0, 0)`.
    origin: IVec2,
    scale: i32,
    side: i32,
    solid: Vec<bool>,
}

impl LocalGrid {
    pub fn around(
        grid: &Grid,
        agent_cell: IVec2,
        push: Option<&PushBlock>,
        cfg: &EngineConfig,
    ) -> Self {
        let scale = cfg.collision_scale.max(1);
        let pad = cfg.collision_padding.max(0);
        let side = SPAN * scale;
        let origin = agent_cell - IVec2::ONE;
        let mut local = Self {
            origin,
            scale,
            side,
            solid: vec![false; (side * side) as usize],
        };

        for py in 0..SPAN {
            for px in 0..SPAN {
                let parent = origin + IVec2::new(px, py);
                if grid.blocks_movement(parent, cfg.passability_threshold) {
                    let lo = IVec2::new(px, py) * scale;
                    local.fill(lo - pad, lo + scale + pad);
                }
            }
        }

        if let Some(block) = push {
            let lo = ((block.corner() - origin.as_vec2()) * scale as f32).floor().as_ivec2();
            local.fill(lo - pad, lo + scale + pad);
        }
        local
    }

    /// Mark `[lo, hi)` solid, clipped to the local grid.
    fn fill(&mut self, lo: IVec2, hi: IVec2) {
        let lo = lo.max(IVec2::ZERO);
        let hi = hi.min(IVec2::splat(self.side));
        for y in lo.y..hi.y {
            for x in lo.x..hi.x {
                self.solid[(y * self.side + x) as usize] = true;
            }
        }
    }

    /// Local coordinates of a world position inside the agent's cell.
    pub fn to_local(&self, world: Vec2) -> Vec2 {
        (world - self.origin.as_vec2()) * self.scale as f32
    }

    /// Local sub-cell containing `p` is solid or off the local grid.
    pub fn blocks(&self, p: Vec2) -> bool {
        let at = p.floor().as_ivec2();
        !self.in_bounds(at) || self.solid[(at.y * self.side + at.x) as usize]
    }

    #[cfg(test)]
    fn is_solid(&self, at: IVec2) -> bool {
        self.solid[(at.y * self.side + at.x) as usize]
    }
}

impl TileMap for LocalGrid {
    #[inline]
    fn dims(&self) -> IVec2 {
        IVec2::splat(self.side)
    }

    #[inline]
    fn tile(&self, at: IVec2) -> Tile {
        if self.solid[(at.y * self.side + at.x) as usize] {
            Tile::WALL
        } else {
            Tile::EMPTY
        }
    }
}

/// Largest safe part of `delta` for an agent at `pos`.
///
/// Both the blocked movement ray and the slide ray stop `slide_backoff`
/// sub-cells short of what they hit, so the agent never ends up on a solid
/// face.  An agent already inside a solid sub-cell may only step straight
/// out into a free one.
pub fn resolve_movement(
    grid: &Grid,
    pos: Vec2,
    delta: Vec2,
    push: Option<&PushBlock>,
    cfg: &EngineConfig,
) -> Vec2 {
    if delta == Vec2::ZERO || !delta.is_finite() {
        return Vec2::ZERO;
    }
    let local = LocalGrid::around(grid, pos.floor().as_ivec2(), push, cfg);
    let scale = local.scale as f32;
    let start = local.to_local(pos);
    let dir = delta * scale;

    if local.blocks(start) {
        return if local.blocks(start + dir) { Vec2::ZERO } else { delta };
    }

    let first = cast(&local, start, dir, Some(1.0));
    if first.distance >= 1.0 {
        return delta;
    }
    let slide = slide_ray(&local, &first, cfg.slide_backoff);
    let resume = slide.origin;
    let end = if slide.distance < 1.0 && slide.surface != Surface::Open {
        back_off(&slide, cfg.slide_backoff)
    } else {
        cap_ray(slide).hit
    };
    // a grazing hit can round back onto the struck face
    let end = [end, resume]
        .into_iter()
        .find(|&p| !local.blocks(p))
        .unwrap_or(start);
    (end - start) / scale
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CellKind, GridBuilder};

    fn open_room() -> Grid {
        let mut b = GridBuilder::new(10).unwrap();
        b.border(CellKind::Wall, 0, 0);
        b.set_kind(IVec2::new(6, 5), CellKind::Wall).unwrap();
        b.door(IVec2::new(3, 3), CellKind::DoorAlongY, 0, 0).unwrap();
        b.build(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn local_grid_marks_walls_and_padding() {
        let g = open_room();
        let cfg = EngineConfig::default();
        let local = LocalGrid::around(&g, IVec2::new(5, 5), None, &cfg);
        // (6,5) is parent (2,1) → sub-cells x 8..12, y 4..8; padding grows to 7..
        assert!(local.is_solid(IVec2::new(9, 5)));
        assert!(local.is_solid(IVec2::new(7, 5)));
        assert!(!local.is_solid(IVec2::new(6, 5)));
        assert_eq!(local.to_local(Vec2::new(5.5, 5.25)), Vec2::new(6.0, 5.0));
    }

    #[test]
    fn free_movement_is_unchanged() {
        let g = open_room();
        let d = resolve_movement(&g, Vec2::new(4.5, 6.5), Vec2::new(0.1, 0.05), None, &EngineConfig::default());
        assert!((d - Vec2::new(0.1, 0.05)).length() < 1e-5);
    }

    #[test]
    fn head_on_wall_stops_perpendicular_motion() {
        let g = open_room();
        let cfg = EngineConfig::default();
        let mut pos = Vec2::new(5.5, 5.5);
        let push = Vec2::new(0.3, 0.0);

        let first = resolve_movement(&g, pos, push, None, &cfg);
        pos += first;
        assert!(pos.x < 6.0 - 0.2, "stops at the padding, got {pos}");

        let second = resolve_movement(&g, pos, push, None, &cfg);
        assert!(second.x.abs() < 1e-4, "no penetration, got {second}");
        assert_eq!(second.y, 0.0);
    }

    #[test]
    fn diagonal_into_wall_slides_along_it() {
        let g = open_room();
        let cfg = EngineConfig::default();
        // hugging the wall at (6,5), moving right and down
        let pos = Vec2::new(5.74, 5.2);
        let d = resolve_movement(&g, pos, Vec2::new(0.2, 0.2), None, &cfg);
        assert!(pos.x + d.x < 6.0);
        assert!(d.y > 0.15, "slide keeps the parallel part, got {d}");
    }

    #[test]
    fn corner_slide_stops_short_of_padding() {
        let g = open_room();
        let cfg = EngineConfig::default();
        // border walls at x = 9 and y = 9, padding starts at 8.75
        let pos = Vec2::new(8.6, 8.6);
        let d = resolve_movement(&g, pos, Vec2::new(0.3, 0.3), None, &cfg);
        let end = pos + d;
        assert!(end.x < 8.75 && end.y < 8.75, "ended on the padding at {end}");
        assert!(d.x > 0.0 && d.y > 0.0);
    }

    #[test]
    fn agent_in_padding_can_only_step_out() {
        let g = open_room();
        let cfg = EngineConfig::default();
        // within the padding of the wall at (6,5)
        let pos = Vec2::new(5.8, 5.5);
        assert_eq!(resolve_movement(&g, pos, Vec2::new(0.1, 0.0), None, &cfg), Vec2::ZERO);
        assert_eq!(resolve_movement(&g, pos, Vec2::new(0.0, 0.1), None, &cfg), Vec2::ZERO);
        let out = Vec2::new(-0.1, 0.0);
        assert_eq!(resolve_movement(&g, pos, out, None, &cfg), out);
    }

    #[test]
    fn random_walks_never_enter_solid_cells() {
        let cfg = EngineConfig::default();
        for seed in 0..24 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut b = GridBuilder::new(16).unwrap();
            b.border(CellKind::Wall, 0, 0);
            for _ in 0..40 {
                let at = IVec2::new(rng.i32(1..15), rng.i32(1..15));
                b.set_kind(at, CellKind::Wall).unwrap();
            }
            let door = IVec2::new(rng.i32(1..15), rng.i32(1..15));
            b.door(door, CellKind::DoorAlongX, 0, 0).unwrap();
            let g = b.build(&cfg).unwrap();

            let blocked = |p: Vec2| g.blocks_movement(p.floor().as_ivec2(), cfg.passability_threshold);
            let mut pos = loop {
                let p = Vec2::new(rng.i32(1..15) as f32 + 0.5, rng.i32(1..15) as f32 + 0.5);
                if !blocked(p) {
                    break p;
                }
            };

            let mut heading = 0.0;
            for step in 0..2000 {
                // hold a heading for a while so the walk grinds along walls
                if step % 16 == 0 {
                    heading = rng.f32() * std::f32::consts::TAU;
                }
                let angle = heading + (rng.f32() - 0.5) * 0.6;
                let delta = Vec2::from_angle(angle) * rng.f32() * 0.3;
                let applied = resolve_movement(&g, pos, delta, None, &cfg);
                assert!(applied.is_finite());
                assert!(applied.length() <= delta.length() + 1e-4, "seed {seed} step {step}");
                pos += applied;
                assert!(!blocked(pos), "seed {seed} step {step}: inside a wall at {pos}");
            }
        }
    }

    #[test]
    fn closed_door_blocks_open_door_passes() {
        let mut g = open_room();
        let cfg = EngineConfig::default();
        let pos = Vec2::new(2.5, 3.5);
        let step = Vec2::new(0.5, 0.0);
        let blocked = resolve_movement(&g, pos, step, None, &cfg);
        assert!(pos.x + blocked.x < 3.0);

        g.set_openness(IVec2::new(3, 3), 0.6);
        let open = resolve_movement(&g, pos, step, None, &cfg);
        assert!((open.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn push_block_footprint_is_solid() {
        let g = open_room();
        let cfg = EngineConfig::default();
        let block = PushBlock::new(IVec2::new(5, 7), IVec2::new(5, 8), 0);
        let pos = Vec2::new(5.5, 6.5);
        let d = resolve_movement(&g, pos, Vec2::new(0.0, 0.6), Some(&block), &cfg);
        assert!(pos.y + d.y < 7.0);
    }
}
