//! Two-tier lighting.
//!
//! * **Baked**: every non-shadowed light flood-fills the grid once; grid
//!   vertices store the summed falloff and surfaces sample it bilinearly.
//! * **Shadowed**: a one-off pass links each shadow-casting light to every cell
//!   it can reach; per surface only those lights are tested, each with one
//!   shadow ray unless trivially adjacent.

use std::collections::VecDeque;
use std::f32::consts::SQRT_2;

use glam::{IVec2, Vec2, Vec3};
use tracing::debug;

use crate::{
    config::{EngineConfig, SHADOW_REACH},
    engine::ray::{CastOptions, TileMap, cast, cast_with},
    world::{Grid, Light, LightId},
};

/*──────────────────────── baked ambient field ─────────────────────────*/

/// Per-vertex RGB accumulator, one larger than the grid on each axis.
#[derive(Clone, Debug, PartialEq)]
pub struct BakedLightField {
    /// Vertices per axis (`grid + 1`).
    dims: IVec2,
    rgb: Vec<Vec3>,
}

const NEIGHBOURS: [(IVec2, f32); 8] = [
    (IVec2::new(1, 0), 1.0),
    (IVec2::new(-1, 0), 1.0),
    (IVec2::new(0, 1), 1.0),
    (IVec2::new(0, -1), 1.0),
    (IVec2::new(1, 1), SQRT_2),
    (IVec2::new(-1, 1), SQRT_2),
    (IVec2::new(1, -1), SQRT_2),
    (IVec2::new(-1, -1), SQRT_2),
];

/// Step distance from `start` to every cell; unreachable cells stay infinite.
///
/// Orthogonal steps cost 1 and diagonal steps √2.  Solid cells are never
/// entered and a diagonal step is refused when either orthogonal neighbour
/// is solid.  Doors never block.  A cell is re-queued only when its distance
/// strictly improves.
pub fn flood_fill(map: &impl TileMap, start: IVec2) -> Vec<f32> {
    let d = map.dims();
    let idx = |c: IVec2| (c.y * d.x + c.x) as usize;
    let mut dist = vec![f32::INFINITY; (d.x * d.y).max(0) as usize];
    if !map.in_bounds(start) {
        return dist;
    }
    let blocked = |c: IVec2| !map.in_bounds(c) || map.tile(c).kind.is_solid();

    dist[idx(start)] = 0.0;
    let mut queue = VecDeque::from([start]);
    while let Some(c) = queue.pop_front() {
        let here = dist[idx(c)];
        for (off, cost) in NEIGHBOURS {
            let n = c + off;
            if blocked(n) {
                continue;
            }
            if off.x != 0
                && off.y != 0
                && (blocked(IVec2::new(n.x, c.y)) || blocked(IVec2::new(c.x, n.y)))
            {
                continue;
            }
            let nd = here + cost;
            let slot = &mut dist[idx(n)];
            if nd < *slot {
                *slot = nd;
                queue.push_back(n);
            }
        }
    }
    dist
}

impl BakedLightField {
    /// All-dark field for a `size × size` grid.
    pub fn empty(size: i32) -> Self {
        let dims = IVec2::splat(size.max(0) + 1);
        Self {
            dims,
            rgb: vec![Vec3::ZERO; (dims.x * dims.y) as usize],
        }
    }

    /// Flood-fill every non-shadowed light and accumulate it at the vertices.
    pub fn bake(map: &impl TileMap, lights: &[Light]) -> Self {
        let cells = map.dims();
        let dims = cells + IVec2::ONE;
        let mut field = Self {
            dims,
            rgb: vec![Vec3::ZERO; (dims.x * dims.y) as usize],
        };

        for light in lights.iter().filter(|l| !l.casts_shadows && l.radius > 0.0) {
            let dist = flood_fill(map, light.cell());
            for vy in 0..dims.y {
                for vx in 0..dims.x {
                    let mut sum = 0.0;
                    let mut n = 0;
                    for c in [
                        IVec2::new(vx - 1, vy - 1),
                        IVec2::new(vx, vy - 1),
                        IVec2::new(vx - 1, vy),
                        IVec2::new(vx, vy),
                    ] {
                        if !map.in_bounds(c) {
                            continue;
                        }
                        let d = dist[(c.y * cells.x + c.x) as usize];
                        if d.is_finite() {
                            sum += d;
                            n += 1;
                        }
                    }
                    if n == 0 {
                        continue;
                    }
                    let falloff = light.falloff(sum / n as f32);
                    if falloff > 0.0 {
                        field.rgb[(vy * dims.x + vx) as usize] += light.rgb * falloff;
                    }
                }
            }
        }
        field
    }

    /// Vertices per axis.
    pub fn dims(&self) -> IVec2 {
        self.dims
    }

    /// Vertex value, clamped to the field.
    #[inline]
    pub fn vertex(&self, at: IVec2) -> Vec3 {
        if self.rgb.is_empty() {
            return Vec3::ZERO;
        }
        let at = at.clamp(IVec2::ZERO, self.dims - IVec2::ONE);
        self.rgb[(at.y * self.dims.x + at.x) as usize]
    }

    /// Bilinear lookup at a world position.
    #[inline]
    pub fn sample(&self, p: Vec2) -> Vec3 {
        if self.rgb.is_empty() || !p.is_finite() {
            return Vec3::ZERO;
        }
        let max = (self.dims - IVec2::ONE).as_vec2();
        let p = p.clamp(Vec2::ZERO, max);
        let base = p.floor();
        let f = p - base;
        let i = base.as_ivec2();

        let top = self
            .vertex(i)
            .lerp(self.vertex(i + IVec2::new(1, 0)), f.x);
        let bottom = self
            .vertex(i + IVec2::new(0, 1))
            .lerp(self.vertex(i + IVec2::ONE), f.x);
        top.lerp(bottom, f.y)
    }
}

/*──────────────────────── dynamic shadow pass ─────────────────────────*/

/// Link every shadow-casting light to the cells it can reach.
///
/// Rays go from the light to each grid vertex within reach, plus two
/// companions rotated by `±companion_angle`, ignoring doors.  Every
/// non-solid cell they traverse gets the light appended (once) to its list.
/// Returns the number of links created.
pub fn trace_visibility(grid: &mut Grid, companion_angle: f32) -> usize {
    let opts = CastOptions {
        max_distance: Some(1.0),
        walls_only: true,
        push_block: None,
    };
    let plus = Vec2::from_angle(companion_angle);
    let minus = Vec2::from_angle(-companion_angle);
    let n = grid.size();

    let mut links: Vec<(IVec2, LightId)> = Vec::new();
    for (id, light) in grid.lights().iter().enumerate() {
        if !light.casts_shadows {
            continue;
        }
        let id = id as LightId;
        links.push((light.cell(), id));

        let reach = light.radius + SQRT_2;
        for vy in 0..=n {
            for vx in 0..=n {
                let to = IVec2::new(vx, vy).as_vec2() - light.pos;
                if to.length_squared() > reach * reach {
                    continue;
                }
                for dir in [to, plus.rotate(to), minus.rotate(to)] {
                    let r = cast_with(&*grid, light.pos, dir, &opts);
                    links.extend(
                        r.cells
                            .iter()
                            .filter(|&&c| !grid.tile(c).kind.is_solid())
                            .map(|&c| (c, id)),
                    );
                }
            }
        }
    }

    let mut added = 0;
    for (at, id) in links {
        if let Some(cell) = grid.cell_mut(at) {
            if !cell.lights.contains(&id) {
                cell.lights.push(id);
                added += 1;
            }
        }
    }
    added
}

/*──────────────────────── per-surface lookup ──────────────────────────*/

/// Combined lighting multiplier for a surface point.
///
/// `surface` is the open cell the point is lit from, `view_distance` the
/// camera distance used for the ambient term.  Every shadow ray cast bumps
/// `rays`.
pub fn light_at(
    grid: &Grid,
    surface: IVec2,
    point: Vec2,
    view_distance: f32,
    ambient: Vec3,
    rays: &mut u32,
) -> Vec3 {
    let mut rgb = ambient / (view_distance.max(0.0) + 1.0) + grid.baked().sample(point);
    let Some(cell) = grid.cell(surface) else {
        return rgb;
    };

    for &id in &cell.lights {
        let Some(light) = grid.light(id) else {
            continue;
        };
        let to = point - light.pos;
        let d2 = to.length_squared();
        if d2 >= light.radius * light.radius {
            continue;
        }
        let adjacent = (light.cell() - surface).length_squared() <= 1 && !cell.kind.is_door();
        let lit = adjacent || {
            *rays += 1;
            cast(grid, light.pos, to, None).distance >= SHADOW_REACH
        };
        if lit {
            rgb += light.contribution(d2.sqrt());
        }
    }
    rgb
}

/*──────────────────────── adaptive row sampling ───────────────────────*/

/// Floor-row lighting stride, driven by last frame's ray count.
///
/// Above the upper threshold the stride grows by one, below the lower one it
/// shrinks by one; in between it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveSampler {
    row_step: u32,
    low_water: u32,
    high_water: u32,
    max_step: u32,
}

impl AdaptiveSampler {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            row_step: 1,
            low_water: cfg.rays_low_water,
            high_water: cfg.rays_high_water.max(cfg.rays_low_water),
            max_step: cfg.max_row_step.max(1),
        }
    }

    #[inline]
    pub fn row_step(&self) -> u32 {
        self.row_step
    }

    /// Feed one frame's ray count; returns the stride for the next frame.
    pub fn observe(&mut self, rays_cast: u32) -> u32 {
        let before = self.row_step;
        if rays_cast > self.high_water {
            self.row_step = (self.row_step + 1).min(self.max_step);
        } else if rays_cast < self.low_water {
            self.row_step = self.row_step.saturating_sub(1).max(1);
        }
        if self.row_step != before {
            debug!(rays_cast, from = before, to = self.row_step, "row step changed");
        }
        self.row_step
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CellKind, GridBuilder};

    fn room(n: i32) -> GridBuilder {
        let mut b = GridBuilder::new(n).unwrap();
        b.border(CellKind::Wall, 0, 0);
        b
    }

    #[test]
    fn flood_fill_steps_orthogonal_and_diagonal() {
        let g = room(7).build(&EngineConfig::default()).unwrap();
        let d = flood_fill(&g, IVec2::new(3, 3));
        let at = |x: i32, y: i32| d[(y * 7 + x) as usize];
        assert_eq!(at(3, 3), 0.0);
        assert_eq!(at(4, 3), 1.0);
        assert!((at(4, 4) - SQRT_2).abs() < 1e-6);
        assert!((at(5, 3) - 2.0).abs() < 1e-6);
        assert!(at(0, 0).is_infinite());
    }

    #[test]
    fn flood_fill_does_not_cut_corners() {
        // walls at (2,1) and (1,2) seal (1,1) in; the diagonal may not squeeze between them
        let mut b = room(6);
        b.set_kind(IVec2::new(2, 1), CellKind::Wall).unwrap();
        b.set_kind(IVec2::new(1, 2), CellKind::Wall).unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        let d = flood_fill(&g, IVec2::new(1, 1));
        assert!(d[(2 * 6 + 2) as usize].is_infinite());
    }

    #[test]
    fn flood_fill_passes_doors() {
        let mut b = room(7);
        for y in 1..6 {
            b.set_kind(IVec2::new(3, y), CellKind::Wall).unwrap();
        }
        b.door(IVec2::new(3, 3), CellKind::DoorAlongY, 0, 0).unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        let d = flood_fill(&g, IVec2::new(1, 3));
        assert_eq!(d[(3 * 7 + 5) as usize], 4.0);
    }

    #[test]
    fn baked_field_peaks_near_light_and_interpolates() {
        let mut b = room(9);
        b.light(Light::new(Vec2::new(4.5, 4.5), Vec3::new(1.0, 0.5, 0.0), 4.0, false))
            .unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        let f = g.baked();
        assert_eq!(f.dims(), IVec2::splat(10));

        let near = f.sample(Vec2::new(4.5, 4.5));
        let far = f.sample(Vec2::new(1.2, 1.2));
        assert!(near.x > far.x);
        assert_eq!(near.z, 0.0);

        // halfway between two vertices is their mean
        let a = f.vertex(IVec2::new(4, 4));
        let c = f.vertex(IVec2::new(5, 4));
        let mid = f.sample(Vec2::new(4.5, 4.0));
        assert!((mid - (a + c) * 0.5).length() < 1e-5);
    }

    #[test]
    fn shadowed_lights_are_not_baked() {
        let mut b = room(8);
        b.light(Light::new(Vec2::new(3.5, 3.5), Vec3::ONE, 4.0, true))
            .unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        assert_eq!(g.baked().sample(Vec2::new(3.5, 3.5)), Vec3::ZERO);
    }

    #[test]
    fn walls_hide_cells_from_shadow_lights() {
        // solid wall across the middle, light on the left side
        let mut b = room(9);
        for y in 1..8 {
            b.set_kind(IVec2::new(4, y), CellKind::Wall).unwrap();
        }
        let id = b
            .light(Light::new(Vec2::new(2.5, 4.5), Vec3::ONE, 6.0, true))
            .unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        assert!(g.cell(IVec2::new(3, 4)).unwrap().lights.contains(&id));
        assert!(!g.cell(IVec2::new(6, 4)).unwrap().lights.contains(&id));
    }

    #[test]
    fn shadow_ray_blocked_by_wall() {
        let mut b = room(10);
        b.set_kind(IVec2::new(4, 4), CellKind::Wall).unwrap();
        b.light(Light::new(Vec2::new(2.5, 4.5), Vec3::ONE, 8.0, true))
            .unwrap();
        let mut g = b.build(&EngineConfig::default()).unwrap();
        // force the link so only the per-pixel ray decides
        let lights = &mut g.cell_mut(IVec2::new(6, 4)).unwrap().lights;
        if !lights.contains(&0) {
            lights.push(0);
        }

        let mut rays = 0;
        let behind = light_at(&g, IVec2::new(6, 4), Vec2::new(6.5, 4.5), 0.0, Vec3::ZERO, &mut rays);
        assert_eq!(behind, Vec3::ZERO);
        assert_eq!(rays, 1);

        let open = light_at(&g, IVec2::new(2, 6), Vec2::new(2.5, 6.5), 0.0, Vec3::ZERO, &mut rays);
        assert!(open.x > 0.0);
    }

    #[test]
    fn adjacent_cells_skip_the_shadow_ray() {
        let mut b = room(8);
        b.light(Light::new(Vec2::new(3.5, 3.5), Vec3::ONE, 4.0, true))
            .unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        let mut rays = 0;
        let rgb = light_at(&g, IVec2::new(4, 3), Vec2::new(4.5, 3.5), 0.0, Vec3::ZERO, &mut rays);
        assert_eq!(rays, 0);
        assert!((rgb - Vec3::splat(0.75)).length() < 1e-5);
    }

    #[test]
    fn out_of_radius_rejected_before_casting() {
        let mut b = room(12);
        b.light(Light::new(Vec2::new(2.5, 2.5), Vec3::ONE, 2.0, true))
            .unwrap();
        let mut g = b.build(&EngineConfig::default()).unwrap();
        g.cell_mut(IVec2::new(8, 8)).unwrap().lights.push(0);
        let mut rays = 0;
        let rgb = light_at(&g, IVec2::new(8, 8), Vec2::new(8.5, 8.5), 0.0, Vec3::ZERO, &mut rays);
        assert_eq!(rgb, Vec3::ZERO);
        assert_eq!(rays, 0);
    }

    #[test]
    fn ambient_falls_off_with_view_distance() {
        let g = room(6).build(&EngineConfig::default()).unwrap();
        let mut rays = 0;
        let near = light_at(&g, IVec2::new(2, 2), Vec2::new(2.5, 2.5), 0.0, Vec3::ONE, &mut rays);
        let far = light_at(&g, IVec2::new(2, 2), Vec2::new(2.5, 2.5), 3.0, Vec3::ONE, &mut rays);
        assert_eq!(near, Vec3::ONE);
        assert_eq!(far, Vec3::splat(0.25));
    }

    #[test]
    fn sampler_has_hysteresis() {
        let cfg = EngineConfig {
            rays_low_water: 100,
            rays_high_water: 200,
            max_row_step: 3,
            ..Default::default()
        };
        let mut s = AdaptiveSampler::new(&cfg);
        assert_eq!(s.row_step(), 1);
        assert_eq!(s.observe(50), 1);
        assert_eq!(s.observe(500), 2);
        assert_eq!(s.observe(150), 2);
        assert_eq!(s.observe(500), 3);
        assert_eq!(s.observe(500), 3);
        assert_eq!(s.observe(99), 2);
        assert_eq!(s.observe(99), 1);
        assert_eq!(s.observe(0), 1);
    }
}
