//! Per-column pass: sky above the wall slab, textured wall, reprojected floor.

use glam::{IVec2, Vec2};

use super::{Software, WallSlab, shade};
use crate::{
    engine::{
        lighting::light_at,
        ray::{CastOptions, RayResult, Surface, cast_with},
        types::Screen,
    },
    renderer::{Rgba, Scene},
    world::{Grid, NO_TEXTURE, TextureId},
};

impl Software {
    pub(super) fn draw_columns(&mut self, scene: &Scene<'_>) {
        let Some(screen) = self.screen else { return };
        let cam = scene.camera;
        let vs = screen.half_h * cam.look();
        let opts = CastOptions {
            push_block: scene.push_block.map(|b| b.corner()),
            ..CastOptions::default()
        };

        let mut rays = std::mem::take(&mut self.rays);
        scene.projection.screen_rays(&screen, cam.yaw(), &mut rays);

        for (x, &dir) in rays.iter().enumerate() {
            let ray = cast_with(scene.grid, cam.pos(), dir, &opts);
            self.rays_cast += 1;
            self.depth[x] = ray.distance;

            let mut slab = WallSlab::project(ray.distance, cam.height(), vs, &screen);
            if ray.hit_map_edge {
                slab.collapse();
            }

            self.draw_sky(scene, &screen, x, vs, 0..slab.draw_start);
            if slab.draw_start < slab.draw_end {
                self.draw_wall(scene, &ray, x, &slab);
            }
            self.draw_floor(scene, &screen, x, dir, vs, slab.draw_end);
        }
        self.rays = rays;
    }

    /*──────────────────────────── sky ───────────────────────────────*/
    fn draw_sky(
        &mut self,
        scene: &Scene<'_>,
        screen: &Screen,
        x: usize,
        vs: f32,
        rows: std::ops::Range<usize>,
    ) {
        for y in rows {
            self.put(x, y, sky_color(scene.sky_rgb, y, vs, screen));
        }
    }

    /*──────────────────────────── wall ──────────────────────────────*/
    fn draw_wall(&mut self, scene: &Scene<'_>, ray: &RayResult, x: usize, slab: &WallSlab) {
        let tex = wall_texture(scene, ray);
        let lit = ray.lit_cell().unwrap_or_else(|| scene.camera.pos().floor().as_ivec2());
        let light = light_at(
            scene.grid,
            lit,
            ray.hit,
            ray.distance,
            scene.ambient,
            &mut self.rays_cast,
        );
        for y in slab.draw_start..slab.draw_end {
            let texel = scene.bank.sample(tex, ray.tex_u, slab.v_at(y));
            self.put(x, y, shade(texel, light));
        }
    }

    /*──────────────────────────── floor ─────────────────────────────*/
    /// Every row below the wall is reprojected onto the floor plane.  The
    /// lighting lookup only runs every `row_step` rows and is reused between.
    fn draw_floor(
        &mut self,
        scene: &Scene<'_>,
        screen: &Screen,
        x: usize,
        dir: Vec2,
        vs: f32,
        from: usize,
    ) {
        let cam = scene.camera;
        let h = screen.h as f32;
        let step = scene.row_step.max(1) as usize;
        let mut light = scene.ambient;

        for (i, y) in (from..screen.h).enumerate() {
            let below = y as f32 + 0.5 - vs - screen.half_h;
            if below <= 0.0 {
                self.put(x, y, sky_color(scene.sky_rgb, y, vs, screen));
                continue;
            }
            let floor_distance = h * cam.height() / below;
            let p = cam.pos() + dir * floor_distance;
            let at = clamp_cell(scene.grid, p);
            let floor_tex = scene.grid.cell(at).map_or(NO_TEXTURE, |c| c.floor_tex);

            if i % step == 0 {
                light = light_at(
                    scene.grid,
                    at,
                    p,
                    floor_distance,
                    scene.ambient,
                    &mut self.rays_cast,
                );
            }
            let texel = scene.bank.sample(floor_tex, p.x, p.y);
            self.put(x, y, shade(texel, light));
        }
    }
}

/// Texture of the struck face.  Walls seen through a door cell show the
/// door's inner (frame) texture instead of their own.
fn wall_texture(scene: &Scene<'_>, ray: &RayResult) -> TextureId {
    let grid = scene.grid;
    let tex_of = |at: Option<IVec2>| grid.cell(at?).map(|c| c.wall_tex);
    match ray.surface {
        Surface::PushBlock => scene.push_block.map_or(NO_TEXTURE, |b| b.texture),
        Surface::Door | Surface::Edge | Surface::Open => {
            tex_of(ray.last_cell()).unwrap_or(NO_TEXTURE)
        }
        Surface::Wall => {
            let framed = ray
                .second_last_cell()
                .and_then(|at| grid.cell(at))
                .filter(|c| c.kind.is_door())
                .map(|c| c.inner_wall_tex);
            framed
                .or_else(|| tex_of(ray.last_cell()))
                .unwrap_or(NO_TEXTURE)
        }
    }
}

fn clamp_cell(grid: &Grid, p: Vec2) -> IVec2 {
    let max = grid.size() - 1;
    p.floor().as_ivec2().clamp(IVec2::ZERO, IVec2::splat(max.max(0)))
}

/// Vertical sky gradient: base colour scaled by the row's distance below the
/// (look-shifted) top of the screen.
#[inline]
pub(crate) fn sky_color(base: [u8; 3], y: usize, vs: f32, screen: &Screen) -> Rgba {
    let k = ((y as f32 - vs) / screen.h.max(1) as f32).clamp(0.0, 1.0);
    let c = |v: u8| (v as f32 * k) as u8;
    [c(base[0]), c(base[1]), c(base[2]), 255]
}

/*──────────────────────────────── Tests ───────────────────────────────*/
