//! ---------------------------------------------------------------------------
//! Software (CPU) column renderer
//!
//! * Fills an RGBA byte frame-buffer, one screen column per primary ray.
//! * Keeps a per-column depth buffer so billboards drawn afterwards are
//!   clipped against nearer walls.
//! * All per-frame state (scratch, depth, ray count) lives on [`Software`];
//!   nothing is global, so a worker can own one and reuse it every frame.
//! ---------------------------------------------------------------------------

mod columns;
mod minimap;
mod projection;
mod sprites;

pub use minimap::{MinimapStyle, draw_minimap};
pub use projection::WallSlab;

use glam::Vec2;

use crate::{
    engine::types::Screen,
    renderer::{Renderer, Rgba, Scene},
};

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

/// Column renderer plus its reusable per-frame scratch.
#[derive(Default)]
pub struct Software {
    pub(crate) scratch: Vec<u8>,
    /// Ray distance per column; `INFINITY` where nothing was cast.
    pub(crate) depth: Vec<f32>,
    pub(crate) rays: Vec<Vec2>,
    /// (squared distance, sprite index), reused for sorting.
    pub(crate) order: Vec<(f32, usize)>,
    pub(crate) screen: Option<Screen>,
    pub(crate) rays_cast: u32,
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if self.screen.is_none_or(|s| s.w != w || s.h != h) {
            self.screen = Some(Screen::new(w, h));
            self.scratch.resize(w * h * 4, 0);
            self.depth.resize(w, f32::INFINITY);
        }
        /* black, opaque clear */
        for px in self.scratch.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
        self.depth.fill(f32::INFINITY);
        self.rays_cast = 0;
    }

    fn draw_scene(&mut self, scene: &Scene<'_>) {
        if self.screen.is_none_or(|s| s.w == 0 || s.h == 0) {
            return;
        }
        self.draw_columns(scene);
        self.draw_sprites(scene);
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        let (w, h) = self.screen.map_or((0, 0), |s| (s.w, s.h));
        submit(&self.scratch, w, h);
    }
}

impl Software {
    /// Rays cast during the last frame (primary, shadow and lighting rays).
    pub fn rays_cast(&self) -> u32 {
        self.rays_cast
    }

    /// Per-column depth of the last frame.
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    #[inline]
    pub(crate) fn put(&mut self, x: usize, y: usize, px: Rgba) {
        if let Some(s) = self.screen {
            let i = (y * s.w + x) * 4;
            if let Some(dst) = self.scratch.get_mut(i..i + 4) {
                dst.copy_from_slice(&px);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> Rgba {
        let w = self.screen.map_or(0, |s| s.w);
        let i = (y * w + x) * 4;
        [
            self.scratch[i],
            self.scratch[i + 1],
            self.scratch[i + 2],
            self.scratch[i + 3],
        ]
    }
}

/// Modulate a texel by a light multiplier, saturating at 255.
#[inline]
pub(crate) fn shade(texel: Rgba, light: glam::Vec3) -> Rgba {
    let c = |v: u8, l: f32| (v as f32 * l).round().clamp(0.0, 255.0) as u8;
    [
        c(texel[0], light.x),
        c(texel[1], light.y),
        c(texel[2], light.z),
        255,
    ]
}

/*──────────────────────────────── Tests ───────────────────────────────*/
